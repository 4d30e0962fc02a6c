//! Cache store ports.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderName, Request};
use shiny_cache::{CacheKey, CachedValues};
use std::sync::Arc;

use crate::error::StoreResult;

/// Store for cached entries.
///
/// Implementations handle their own concurrency. A `get` racing a `put` or
/// `delete` on the same key must observe either the old or the new value.
#[async_trait]
pub trait HttpCacheStore: Send + Sync {
    /// Get an entry.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(values))` if the key exists, `Ok(None)` if not found,
    /// or an error if the backend fails.
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CachedValues>>;

    /// Store an entry, replacing any previous one.
    async fn put(&self, key: &CacheKey, values: CachedValues) -> StoreResult<()>;

    /// Delete an entry. Deleting a missing key is not an error.
    async fn delete(&self, key: &CacheKey) -> StoreResult<()>;

    /// Derive the per-user identity of a request.
    ///
    /// `None` means the request cannot be scoped to a user.
    fn build_user_key(&self, _request: &Request<Bytes>) -> Option<String> {
        None
    }
}

#[async_trait]
impl<S: HttpCacheStore + ?Sized> HttpCacheStore for Arc<S> {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CachedValues>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &CacheKey, values: CachedValues) -> StoreResult<()> {
        (**self).put(key, values).await
    }

    async fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        (**self).delete(key).await
    }

    fn build_user_key(&self, request: &Request<Bytes>) -> Option<String> {
        (**self).build_user_key(request)
    }
}

/// Byte-oriented key/value backend.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get_bytes(&self, key: &str) -> StoreResult<Option<Bytes>>;

    async fn set_bytes(&self, key: &str, value: Bytes) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<()>;
}

#[async_trait]
impl<B: BlobStore + ?Sized> BlobStore for Arc<B> {
    async fn get_bytes(&self, key: &str) -> StoreResult<Option<Bytes>> {
        (**self).get_bytes(key).await
    }

    async fn set_bytes(&self, key: &str, value: Bytes) -> StoreResult<()> {
        (**self).set_bytes(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key).await
    }
}

/// Read a user identity from a request header. Empty or non-text values
/// yield `None`.
pub fn user_from_header(request: &Request<Bytes>, header: &HeaderName) -> Option<String> {
    request
        .headers()
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_header() {
        let header = HeaderName::from_static("x-user");

        let request = Request::builder()
            .header("x-user", " alice ")
            .body(Bytes::new())
            .unwrap();
        assert_eq!(user_from_header(&request, &header).as_deref(), Some("alice"));

        let request = Request::builder()
            .header("x-user", "")
            .body(Bytes::new())
            .unwrap();
        assert_eq!(user_from_header(&request, &header), None);

        let request = Request::new(Bytes::new());
        assert_eq!(user_from_header(&request, &header), None);
    }
}
