//! Result of handling one request.

use bytes::Bytes;
use http::Response;

use crate::error::StoreError;

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the cache without contacting the origin.
    Fresh,
    /// No usable entry; fetched from the origin.
    Miss,
    /// Stale entry confirmed by a 304 and served from the cache.
    Revalidated,
    /// Stale entry replaced by a full response from the origin.
    Refetched,
    /// The cache was not consulted.
    Bypass,
}

impl CacheStatus {
    /// Whether the body came from the cache.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Fresh | Self::Revalidated)
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fresh => write!(f, "FRESH"),
            Self::Miss => write!(f, "MISS"),
            Self::Revalidated => write!(f, "REVALIDATED"),
            Self::Refetched => write!(f, "REFETCHED"),
            Self::Bypass => write!(f, "BYPASS"),
        }
    }
}

/// A handled request.
#[derive(Debug)]
pub struct Handled {
    pub response: Response<Bytes>,
    pub status: CacheStatus,
    /// Set when writing the cache failed. The response is still valid.
    pub persist_error: Option<StoreError>,
}

impl Handled {
    pub(crate) fn new(response: Response<Bytes>, status: CacheStatus) -> Self {
        Self {
            response,
            status,
            persist_error: None,
        }
    }

    pub fn into_response(self) -> Response<Bytes> {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_status_display() {
        assert_eq!(CacheStatus::Fresh.to_string(), "FRESH");
        assert_eq!(CacheStatus::Revalidated.to_string(), "REVALIDATED");
        assert_eq!(CacheStatus::Bypass.to_string(), "BYPASS");
    }

    #[test]
    fn test_is_hit() {
        assert!(CacheStatus::Fresh.is_hit());
        assert!(CacheStatus::Revalidated.is_hit());
        assert!(!CacheStatus::Refetched.is_hit());
        assert!(!CacheStatus::Miss.is_hit());
    }
}
