//! Error types for the seekable stream core.

use std::sync::Arc;

use thiserror::Error;

/// Every failure the writer, reader and layout codecs can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Skippable-frame tags are 4 bits wide.
    #[error("requested tag ({0}) > 0xf")]
    InvalidTag(u8),

    /// A skippable frame has the wrong magic base or is shorter than it declares.
    #[error("malformed skippable frame: {0}")]
    MalformedFrame(String),

    /// An input chunk or its compressed form does not fit a 32-bit size field.
    #[error("chunk size too big for seekable format: {size} > {}", u32::MAX)]
    ChunkTooLarge { size: u64 },

    /// The seek table cannot describe more than `u32::MAX` frames.
    #[error("number of frames too big for seekable format: {0} > {}", u32::MAX)]
    TooManyFrames(usize),

    /// The writer or reader has already been closed.
    #[error("stream is closed")]
    StreamClosed,

    /// The stream does not end with a seek table.
    #[error("seek table footer not found: {0}")]
    FooterNotFound(String),

    /// The seek table is present but structurally invalid.
    #[error("malformed seek table: {0}")]
    MalformedFooter(String),

    /// A decompressed frame disagrees with the checksum stored in the seek table.
    #[error("frame {frame} checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { frame: i64, expected: u32, actual: u32 },

    /// A frame's bytes disagree with the size recorded in its descriptor.
    #[error("frame {frame} {what} size mismatch: expected {expected} bytes, got {actual}")]
    FrameSizeMismatch {
        frame: i64,
        what: &'static str,
        expected: u64,
        actual: u64,
    },

    /// A seek resolved to a negative position.
    #[error("invalid offset: {0}")]
    InvalidOffset(i128),

    /// Range reads need the compressed stream, which a footer-only decoder lacks.
    #[error("no data source: decoder was built from a seek table alone")]
    NoDataSource,

    /// The sink accepted fewer bytes than it was given.
    #[error("partial write: {written} out of {expected}")]
    PartialWrite { written: usize, expected: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failures raised by the injected codec, passed through untouched.
    #[error(transparent)]
    Codec(#[from] anyhow::Error),

    /// All failures collected while finalizing a writer.
    #[error("close failed: {}", join_errors(.0))]
    Close(Arc<[Error]>),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(inner) => inner,
            Error::InvalidOffset(_) => std::io::Error::new(ErrorKind::InvalidInput, err),
            Error::StreamClosed | Error::NoDataSource => std::io::Error::new(ErrorKind::Other, err),
            Error::PartialWrite { .. } => std::io::Error::new(ErrorKind::WriteZero, err),
            other => std::io::Error::new(ErrorKind::InvalidData, other),
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
