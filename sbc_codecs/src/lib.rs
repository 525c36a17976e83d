mod gzip_codec;
mod lz4_codec;
mod store;
mod zstd_codec;

pub use gzip_codec::GzipCodec;
pub use lz4_codec::Lz4Codec;
pub use store::StoreCodec;
pub use zstd_codec::ZstdCodec;

use sbc_core::BlockCodec;

/// Resolve a codec from its CLI name.
///
/// The container does not record the codec, so compress and decompress must
/// be invoked with the same name. `level` applies to gzip (0–9) and zstd
/// (1–22); the other codecs reject it.
pub fn codec_by_name(name: &str, level: Option<i32>) -> anyhow::Result<Box<dyn BlockCodec>> {
    match name {
        "gzip" | "gz" => {
            let codec = match level {
                Some(l @ 0..=9) => GzipCodec::new(l as u32),
                Some(l) => anyhow::bail!("gzip level {} out of range (0-9)", l),
                None => GzipCodec::default(),
            };
            Ok(Box::new(codec))
        }
        "zstd" | "z" => {
            let codec = match level {
                Some(l @ 1..=22) => ZstdCodec::new(l),
                Some(l) => anyhow::bail!("zstd level {} out of range (1-22)", l),
                None => ZstdCodec::default(),
            };
            Ok(Box::new(codec))
        }
        "lz4" | "l" => {
            if level.is_some() {
                anyhow::bail!("lz4 does not take a compression level");
            }
            Ok(Box::new(Lz4Codec))
        }
        "store" | "none" => {
            if level.is_some() {
                anyhow::bail!("store does not take a compression level");
            }
            Ok(Box::new(StoreCodec))
        }
        other => anyhow::bail!(
            "unknown codec '{}'. Valid options: gzip, zstd, lz4, store",
            other
        ),
    }
}
