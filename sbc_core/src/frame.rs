//! Length-prefix framing for the SBC container.
//!
//! The container is a bare sequence of frames:
//!
//! ```text
//! [LEN 0: u32 BE] [PAYLOAD 0: LEN 0 bytes] [LEN 1: u32 BE] [PAYLOAD 1] ...
//! ```
//!
//! There is no magic number, version field, or checksum. The length-field
//! width and the block codec are the protocol agreement between writer and
//! reader; neither is negotiated in-band.

use std::io::{Read, Write};

use crate::error::{FramingError, Result};

/// Width of the frame length field in bytes.
///
/// This is also the fixed-size chunk the decompress path reads first for
/// each frame, before it knows anything else about the frame.
pub const LEN_FIELD_WIDTH: usize = 4;

/// Upper bound accepted for a single frame payload (1 GiB).
///
/// A frame holds one encoded block, and blocks are far smaller than this
/// even after worst-case codec expansion, so any larger decoded length is
/// treated as corruption rather than data.
pub const MAX_FRAME_LEN: u32 = 1 << 30;

/// Default raw bytes per block on the compress path.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Serialize a payload length into the fixed-width big-endian field.
pub fn encode_len(n: usize) -> std::result::Result<[u8; LEN_FIELD_WIDTH], FramingError> {
    if n > MAX_FRAME_LEN as usize {
        return Err(FramingError::Oversize(n));
    }
    Ok((n as u32).to_be_bytes())
}

/// Decode a length field.
///
/// Zero is rejected alongside oversized values: the writer never emits an
/// empty frame (empty input produces zero frames, and no codec encodes a
/// non-empty block to nothing), so a zero field can only mean corruption.
pub fn decode_len(buf: &[u8; LEN_FIELD_WIDTH]) -> std::result::Result<u32, FramingError> {
    let n = u32::from_be_bytes(*buf);
    if n == 0 || n > MAX_FRAME_LEN {
        return Err(FramingError::ImplausibleLength(n as u64));
    }
    Ok(n)
}

/// Write one frame: length field, then exactly that many payload bytes.
pub fn write_frame<W: Write>(w: &mut W, payload: &[u8]) -> Result<()> {
    let len = encode_len(payload.len())?;
    w.write_all(&len)?;
    w.write_all(payload)?;
    Ok(())
}

/// Read one frame payload.
///
/// Returns `None` on a clean end of stream (EOF before the first length
/// byte). EOF anywhere else is a `FramingError`: inside the length field it
/// is `TruncatedLength`, inside the payload `TruncatedPayload`.
pub fn read_frame<R: Read>(r: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; LEN_FIELD_WIDTH];
    let got = read_full(r, &mut len_buf)?;
    if got == 0 {
        return Ok(None);
    }
    if got < LEN_FIELD_WIDTH {
        return Err(FramingError::TruncatedLength(got).into());
    }

    let declared = decode_len(&len_buf)? as usize;
    let mut payload = vec![0u8; declared];
    let got = read_full(r, &mut payload)?;
    if got < declared {
        return Err(FramingError::TruncatedPayload { declared, got }.into());
    }
    Ok(Some(payload))
}

/// Fill `buf` as far as the stream allows, retrying short reads.
///
/// Returns the number of bytes read; less than `buf.len()` only at EOF.
pub(crate) fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut off = 0;
    while off < buf.len() {
        let n = r.read(&mut buf[off..])?;
        if n == 0 {
            break;
        }
        off += n;
    }
    Ok(off)
}
