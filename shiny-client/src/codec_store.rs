//! Entry store backed by a byte-oriented key/value backend.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderName, Request};
use shiny_cache::{CacheKey, CachedValues};
use shiny_codec::EntryCodec;
use tracing::{trace, warn};

use crate::config::CachingClientConfig;
use crate::error::StoreResult;
use crate::store::{BlobStore, HttpCacheStore, user_from_header};

/// Persists entries through the entry codec into a [`BlobStore`].
///
/// An entry that fails to decode is treated as a miss and removed from the
/// backend.
#[derive(Debug, Clone)]
pub struct CodecStore<B> {
    backend: B,
    codec: EntryCodec,
    user_header: Option<HeaderName>,
}

impl<B: BlobStore> CodecStore<B> {
    /// Create a store writing compressed entries.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            codec: EntryCodec::default(),
            user_header: None,
        }
    }

    pub fn from_config(backend: B, config: &CachingClientConfig) -> Self {
        Self {
            backend,
            codec: EntryCodec::new(config.compress_entries),
            user_header: config.user_header.clone(),
        }
    }

    pub fn with_codec(mut self, codec: EntryCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_user_header(mut self, header: HeaderName) -> Self {
        self.user_header = Some(header);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: BlobStore> HttpCacheStore for CodecStore<B> {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CachedValues>> {
        let Some(bytes) = self.backend.get_bytes(key.as_str()).await? else {
            return Ok(None);
        };

        match self.codec.decode(&bytes) {
            Ok(values) => Ok(Some(values)),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding undecodable cache entry");
                if let Err(e) = self.backend.delete(key.as_str()).await {
                    warn!(key = %key, error = %e, "failed to delete undecodable cache entry");
                }
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &CacheKey, values: CachedValues) -> StoreResult<()> {
        let bytes = self.codec.encode(&values)?;
        trace!(key = %key, len = bytes.len(), "writing cache entry");
        self.backend.set_bytes(key.as_str(), bytes).await
    }

    async fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        self.backend.delete(key.as_str()).await
    }

    fn build_user_key(&self, request: &Request<Bytes>) -> Option<String> {
        self.user_header
            .as_ref()
            .and_then(|header| user_from_header(request, header))
    }
}
