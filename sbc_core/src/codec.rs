use crate::error::CodecError;

/// Core per-block compression abstraction.
///
/// Each `BlockCodec` implementation:
/// - Must encode/decode individual blocks independently — no cross-block
///   state is permitted. This is the invariant that lets the pipeline run
///   blocks concurrently and the container store each one as a standalone
///   frame.
/// - Is stateless per call and safe to share across worker threads.
///
/// The container does not record which codec produced it; compress and
/// decompress must be invoked with the same codec out of band.
pub trait BlockCodec: Send + Sync {
    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    /// Compress a single independent block.
    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decompress a single independent block.
    fn decompress_block(&self, encoded: &[u8]) -> Result<Vec<u8>, CodecError>;
}
