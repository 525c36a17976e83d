pub mod chunk;
pub mod codec;
pub mod error;
pub mod frame;
pub mod order;
pub mod pipeline;

pub use chunk::{Block, EncodedBlock};
pub use codec::BlockCodec;
pub use error::{CodecError, Error, FramingError, Result};
pub use pipeline::{
    compress, compress_file, decompress, decompress_file, default_workers, PipelineConfig,
    PipelineSummary,
};
