//! Error types for the entry codec

use thiserror::Error;

/// Errors that can occur while encoding or decoding a cache entry
#[derive(Error, Debug)]
pub enum CodecError {
    /// Malformed, truncated or corrupted input
    #[error("Decode error: {0}")]
    Decode(String),

    /// Well-formed payload whose shape does not match the requested type
    #[error("Type mismatch decoding {expected}: {message}")]
    TypeMismatch {
        expected: &'static str,
        message: String,
    },

    /// Frame written by an unknown format version
    #[error("Unsupported entry format version: {0}")]
    UnsupportedVersion(u8),

    /// Value could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// IO error while compressing or writing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Whether the error means the stored bytes cannot be used.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::TypeMismatch { .. } | Self::UnsupportedVersion(_)
        )
    }
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;
