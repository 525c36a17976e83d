use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use sbc_core::{BlockCodec, CodecError};

/// Gzip block codec (the default).
///
/// Each block becomes a complete, self-contained gzip member, so any frame
/// can be decoded without its neighbors. Level range is 0–9; 6 is the
/// usual speed/size balance.
pub struct GzipCodec {
    pub level: u32,
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl GzipCodec {
    pub fn new(level: u32) -> Self {
        Self { level }
    }
}

impl BlockCodec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::new(self.level));
        encoder
            .write_all(raw)
            .map_err(|e| CodecError::Compress(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| CodecError::Compress(e.to_string()))
    }

    fn decompress_block(&self, encoded: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut raw = Vec::new();
        GzDecoder::new(encoded)
            .read_to_end(&mut raw)
            .map_err(|e| CodecError::Decompress(e.to_string()))?;
        Ok(raw)
    }
}
