use sbc_core::{BlockCodec, CodecError};

/// No-op codec: stores blocks verbatim.
///
/// Useful for verifying the container round-trip independently of any
/// codec, and for data that is already compressed (JPEG, MP4) where a real
/// codec would only expand it.
pub struct StoreCodec;

impl BlockCodec for StoreCodec {
    fn name(&self) -> &'static str {
        "store"
    }

    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(raw.to_vec())
    }

    fn decompress_block(&self, encoded: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(encoded.to_vec())
    }
}
