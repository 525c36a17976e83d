//! Index-ordered reassembly of worker results.

use std::collections::BTreeMap;
use std::io::Write;

use tracing::trace;

use crate::chunk::EncodedBlock;
use crate::error::{Error, Result};
use crate::frame::{self, LEN_FIELD_WIDTH};

/// How the sink emits each payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Compress path: length field, then payload.
    LengthPrefixed,
    /// Decompress path: raw payload bytes only.
    Raw,
}

/// Writes encoded blocks to the target in strictly increasing index order.
///
/// Workers complete in any order. An arrival matching the `next` cursor is
/// written immediately and the cursor advances; anything ahead of the cursor
/// is parked in a map keyed by index and drained as soon as the gap closes.
///
/// The map holds only blocks whose predecessors are still in flight, so its
/// size is bounded by the pipeline's in-flight count (channel capacities
/// plus the worker pool) — memory stays proportional to the concurrency
/// bound, not the input.
pub struct OrderedSink<W> {
    out: W,
    framing: Framing,
    next: u64,
    pending: BTreeMap<u64, EncodedBlock>,
    written: u64,
    bytes_out: u64,
}

impl<W: Write> OrderedSink<W> {
    pub fn new(out: W, framing: Framing) -> Self {
        Self {
            out,
            framing,
            next: 0,
            pending: BTreeMap::new(),
            written: 0,
            bytes_out: 0,
        }
    }

    /// Accept one block, in or out of order.
    pub fn push(&mut self, block: EncodedBlock) -> Result<()> {
        trace!(index = block.index, next = self.next, "assembler received block");
        let index = block.index;
        if index < self.next || self.pending.insert(index, block).is_some() {
            return Err(Error::Pipeline(format!("duplicate block index {index}")));
        }
        self.flush_ready()
    }

    fn flush_ready(&mut self) -> Result<()> {
        while let Some(block) = self.pending.remove(&self.next) {
            self.write_payload(&block.payload)?;
            self.next += 1;
            self.written += 1;
        }
        Ok(())
    }

    fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        match self.framing {
            Framing::LengthPrefixed => {
                frame::write_frame(&mut self.out, payload)?;
                self.bytes_out += (LEN_FIELD_WIDTH + payload.len()) as u64;
            }
            Framing::Raw => {
                self.out.write_all(payload)?;
                self.bytes_out += payload.len() as u64;
            }
        }
        Ok(())
    }

    /// Verify every dispatched block was written, then flush the target.
    ///
    /// Returns the number of bytes written. A parked block or a count
    /// mismatch means an index gap somewhere upstream; the target contents
    /// are not trustworthy in that case.
    pub fn finish(mut self, dispatched: u64) -> Result<u64> {
        if !self.pending.is_empty() || self.written != dispatched {
            return Err(Error::Pipeline(format!(
                "{dispatched} blocks dispatched but {} written ({} still parked)",
                self.written,
                self.pending.len()
            )));
        }
        self.out.flush()?;
        Ok(self.bytes_out)
    }
}
