//! Block enumeration for both pipeline directions.
//!
//! A single sequential reader assigns each block a dense, monotonically
//! increasing index. The index is the sole ordering key downstream; it is
//! never reused or mutated after assignment.

use std::io::Read;

use crate::error::Result;
use crate::frame;

/// One unit of work before codec application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    pub data: Vec<u8>,
}

/// Result of applying the block codec to a [`Block`].
///
/// Owned exclusively by the worker that produced it until handed to the
/// assembler.
#[derive(Debug)]
pub struct EncodedBlock {
    pub index: u64,
    pub payload: Vec<u8>,
}

/// Splits a raw stream into fixed-size blocks on the compress path.
///
/// Every block holds exactly `block_size` bytes except possibly the last.
/// Short `read()` returns are retried until the block is full or the stream
/// ends, so block boundaries depend only on `block_size`, never on how the
/// source fragments its reads. An input whose size is an exact multiple of
/// `block_size` ends cleanly without a trailing empty block.
pub struct RawBlocks<R> {
    src: R,
    block_size: usize,
    next_index: u64,
}

impl<R: Read> RawBlocks<R> {
    pub fn new(src: R, block_size: usize) -> Self {
        debug_assert!(block_size > 0);
        Self {
            src,
            block_size,
            next_index: 0,
        }
    }
}

impl<R: Read> Iterator for RawBlocks<R> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = vec![0u8; self.block_size];
        let got = match frame::read_full(&mut self.src, &mut buf) {
            Ok(n) => n,
            Err(e) => return Some(Err(e.into())),
        };
        if got == 0 {
            return None;
        }
        buf.truncate(got);

        let index = self.next_index;
        self.next_index += 1;
        Some(Ok(Block { index, data: buf }))
    }
}

/// Parses framed container input into payload blocks on the decompress path.
///
/// Each "chunk" here is one frame: the fixed-width length field, then
/// exactly that many payload bytes. A stream ending inside a frame is a
/// fatal framing error, not an EOF.
pub struct FrameBlocks<R> {
    src: R,
    next_index: u64,
}

impl<R: Read> FrameBlocks<R> {
    pub fn new(src: R) -> Self {
        Self { src, next_index: 0 }
    }
}

impl<R: Read> Iterator for FrameBlocks<R> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        match frame::read_frame(&mut self.src) {
            Ok(Some(payload)) => {
                let index = self.next_index;
                self.next_index += 1;
                Some(Ok(Block {
                    index,
                    data: payload,
                }))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
