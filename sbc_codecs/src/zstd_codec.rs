use sbc_core::{BlockCodec, CodecError};

/// Zstandard block codec.
///
/// Each block is compressed independently at the configured level
/// (default: 3). Usually the best ratio of the bundled codecs on general
/// text, JSON, and logs.
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl BlockCodec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::bulk::compress(raw, self.level).map_err(|e| CodecError::Compress(e.to_string()))
    }

    fn decompress_block(&self, encoded: &[u8]) -> Result<Vec<u8>, CodecError> {
        // The zstd frame carries its own content size; no pre-sizing needed.
        zstd::decode_all(encoded).map_err(|e| CodecError::Decompress(e.to_string()))
    }
}
