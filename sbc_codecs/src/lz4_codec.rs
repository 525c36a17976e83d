use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use sbc_core::{BlockCodec, CodecError};

/// LZ4 block codec.
///
/// Fastest of the bundled codecs by a wide margin; best when throughput
/// matters more than size reduction.
pub struct Lz4Codec;

impl BlockCodec for Lz4Codec {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(compress_prepend_size(raw))
    }

    fn decompress_block(&self, encoded: &[u8]) -> Result<Vec<u8>, CodecError> {
        decompress_size_prepended(encoded).map_err(|e| CodecError::Decompress(e.to_string()))
    }
}
