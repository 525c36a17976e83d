use std::io;

use thiserror::Error;

/// Top-level error for a compress or decompress run.
///
/// The first error observed anywhere in the pipeline aborts the run and is
/// surfaced to the caller; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Source/target open, read, or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed or truncated container framing.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// The block codec rejected its input.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Internal invariant violation (index gap, duplicate block). Not
    /// expected in correct operation.
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

/// Errors from the length-prefix framing layer.
///
/// The container has no resynchronization mechanism: once the framing is
/// wrong the rest of the stream is unrecoverable, so every variant here is
/// fatal to the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Stream ended inside a length field.
    #[error("truncated frame length field ({0} of 4 bytes present)")]
    TruncatedLength(usize),

    /// Stream ended before the declared payload was complete.
    #[error("truncated frame payload: length field declares {declared} bytes, stream ended after {got}")]
    TruncatedPayload { declared: usize, got: usize },

    /// The length field decoded to a value no well-formed container can
    /// contain (zero, or beyond the frame size cap).
    #[error("implausible frame length {0}")]
    ImplausibleLength(u64),

    /// An encoded block too large to describe in the length field.
    #[error("block payload of {0} bytes does not fit a frame")]
    Oversize(usize),
}

/// The underlying compress/decompress primitive failed.
///
/// Carries the library's message as text; the codec crates translate their
/// native error types into this at the trait boundary.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("compress failed: {0}")]
    Compress(String),

    #[error("decompress failed: {0}")]
    Decompress(String),
}

pub type Result<T> = std::result::Result<T, Error>;
