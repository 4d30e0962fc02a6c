//! Caching client error types.

use shiny_codec::CodecError;
use std::time::Duration;
use thiserror::Error;

/// Result type for caching client operations.
pub type Result<T> = std::result::Result<T, CachingClientError>;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Cache store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Stored entry could not be encoded or decoded.
    #[error("Store codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying HTTP client error.
    #[cfg(feature = "reqwest")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be sent as given.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request was cancelled while in flight.
    #[error("Request cancelled")]
    Cancelled,
}

impl TransportError {
    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            #[cfg(feature = "reqwest")]
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            #[cfg(feature = "reqwest")]
            Self::Http(e) => e.is_connect(),
            _ => false,
        }
    }
}

/// Caching client errors.
#[derive(Debug, Error)]
pub enum CachingClientError {
    /// Transport failure, propagated as-is.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request was cancelled; no store writes were made.
    #[error("Request cancelled")]
    Cancelled,

    /// The request could not be handled.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CachingClientError {
    /// Map a transport error, folding cancellation into [`Self::Cancelled`].
    pub(crate) fn from_transport(error: TransportError) -> Self {
        match error {
            TransportError::Cancelled => Self::Cancelled,
            other => Self::Transport(other),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
