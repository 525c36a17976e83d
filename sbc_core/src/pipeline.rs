//! Parallel block pipeline: one reader, a bounded worker pool, one ordered
//! writer.
//!
//! Topology for both directions:
//!
//! ```text
//! reader thread ──bounded(jobs)──▶ worker 0..N ──bounded(results)──▶ drain
//!  (chunk.rs)                       (codec)                     (OrderedSink)
//! ```
//!
//! The job channel's capacity is the dispatch gate: when `workers` blocks
//! are queued the reader's `send` suspends until a worker frees a slot.
//! Together with the result channel bound this caps in-flight memory at
//! O(workers × block size) no matter how large the input is.
//!
//! Cancellation is channel teardown. The drain loop stops at the first
//! error and drops its receiver; workers' sends then fail and they exit,
//! which closes the job channel under the reader. Nothing is retried and
//! the first failure observed is the one returned.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::thread;

use crossbeam::channel::bounded;
use tracing::debug;

use crate::chunk::{Block, EncodedBlock, FrameBlocks, RawBlocks};
use crate::codec::BlockCodec;
use crate::error::{CodecError, Error, Result};
use crate::frame::DEFAULT_BLOCK_SIZE;
use crate::order::{Framing, OrderedSink};

/// Tuning knobs for one run.
///
/// The bounds live here rather than in process-wide state: two pipelines in
/// the same process never share a gate.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Raw bytes per block on the compress path. Ignored on decompress,
    /// where block boundaries come from the container frames.
    pub block_size: usize,
    /// Maximum simultaneously running codec invocations.
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            workers: default_workers(),
        }
    }
}

/// Worker count used when the caller does not choose one.
pub fn default_workers() -> usize {
    num_cpus::get().max(1)
}

/// Counters reported after a successful run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineSummary {
    pub blocks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Which codec operation the workers apply.
#[derive(Clone, Copy)]
enum Direction {
    Encode,
    Decode,
}

impl Direction {
    fn apply(
        self,
        codec: &dyn BlockCodec,
        data: &[u8],
    ) -> std::result::Result<Vec<u8>, CodecError> {
        match self {
            Direction::Encode => codec.compress_block(data),
            Direction::Decode => codec.decompress_block(data),
        }
    }
}

/// Compress `source` into a framed container written to `target`.
pub fn compress<R, W>(
    source: R,
    target: W,
    codec: &dyn BlockCodec,
    config: &PipelineConfig,
) -> Result<PipelineSummary>
where
    R: Read + Send,
    W: Write,
{
    let blocks = RawBlocks::new(source, config.block_size.max(1));
    run(
        blocks,
        target,
        codec,
        config.workers.max(1),
        Framing::LengthPrefixed,
        Direction::Encode,
    )
}

/// Decompress a framed container from `source` into raw bytes at `target`.
pub fn decompress<R, W>(
    source: R,
    target: W,
    codec: &dyn BlockCodec,
    config: &PipelineConfig,
) -> Result<PipelineSummary>
where
    R: Read + Send,
    W: Write,
{
    let blocks = FrameBlocks::new(source);
    run(
        blocks,
        target,
        codec,
        config.workers.max(1),
        Framing::Raw,
        Direction::Decode,
    )
}

fn run<I, W>(
    blocks: I,
    target: W,
    codec: &dyn BlockCodec,
    workers: usize,
    framing: Framing,
    direction: Direction,
) -> Result<PipelineSummary>
where
    I: Iterator<Item = Result<Block>> + Send,
    W: Write,
{
    let (job_tx, job_rx) = bounded::<Block>(workers);
    let (done_tx, done_rx) = bounded::<Result<EncodedBlock>>(workers);

    thread::scope(|scope| {
        // Single reader keeps source access sequential and indices dense.
        let reader = scope.spawn(move || -> Result<(u64, u64)> {
            let mut dispatched = 0u64;
            let mut bytes_in = 0u64;
            for block in blocks {
                let block = block?;
                let len = block.data.len() as u64;
                debug!(index = block.index, len, "dispatching block");
                if job_tx.send(block).is_err() {
                    // The run is being torn down after a failure; stop
                    // dispatching new work.
                    break;
                }
                dispatched += 1;
                bytes_in += len;
            }
            Ok((dispatched, bytes_in))
        });

        for worker_id in 0..workers {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            scope.spawn(move || {
                for block in job_rx.iter() {
                    let index = block.index;
                    let result = direction
                        .apply(codec, &block.data)
                        .map(|payload| EncodedBlock { index, payload })
                        .map_err(Error::from);
                    debug!(worker_id, index, ok = result.is_ok(), "block finished");
                    if done_tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(done_tx);

        let mut sink = OrderedSink::new(target, framing);
        let mut failure: Option<Error> = None;
        for result in done_rx.iter() {
            if let Err(err) = result.and_then(|block| sink.push(block)) {
                failure = Some(err);
                break;
            }
        }
        // Dropping the receiver unblocks any worker mid-send; the workers
        // then exit, which in turn closes the job channel under the reader.
        drop(done_rx);

        let (dispatched, bytes_in) = match reader.join() {
            Ok(Ok(counts)) => counts,
            Ok(Err(reader_err)) => return Err(failure.unwrap_or(reader_err)),
            Err(panic) => std::panic::resume_unwind(panic),
        };

        if let Some(err) = failure {
            return Err(err);
        }

        let bytes_out = sink.finish(dispatched)?;
        debug!(blocks = dispatched, bytes_in, bytes_out, "pipeline finished");
        Ok(PipelineSummary {
            blocks: dispatched,
            bytes_in,
            bytes_out,
        })
    })
}

/// Compress the file at `source` into a container at `target`.
///
/// A failed run deletes the partially written target before returning, so
/// no invalid container is left behind. A source-open failure is terminal:
/// nothing is created.
pub fn compress_file(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
    codec: &dyn BlockCodec,
    config: &PipelineConfig,
) -> Result<PipelineSummary> {
    let src = File::open(source)?;
    let dst = File::create(&target)?;
    let result = compress(BufReader::new(src), BufWriter::new(dst), codec, config);
    if result.is_err() {
        let _ = fs::remove_file(&target);
    }
    result
}

/// Decompress the container at `source` into the file at `target`.
///
/// Same failure contract as [`compress_file`]: the target is removed on any
/// error.
pub fn decompress_file(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
    codec: &dyn BlockCodec,
    config: &PipelineConfig,
) -> Result<PipelineSummary> {
    let src = File::open(source)?;
    let dst = File::create(&target)?;
    let result = decompress(BufReader::new(src), BufWriter::new(dst), codec, config);
    if result.is_err() {
        let _ = fs::remove_file(&target);
    }
    result
}
