//! In-memory stores.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderName, Request};
use shiny_cache::{CacheKey, CachedValues};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::CachingClientConfig;
use crate::error::StoreResult;
use crate::store::{BlobStore, HttpCacheStore, user_from_header};

/// In-memory entry store.
///
/// Entries never expire on their own; freshness is decided by the client.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<HashMap<CacheKey, CachedValues>>>,
    user_header: Option<HeaderName>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope private entries by the value of `header`.
    pub fn with_user_header(mut self, header: HeaderName) -> Self {
        self.user_header = Some(header);
        self
    }

    pub fn from_config(config: &CachingClientConfig) -> Self {
        Self {
            user_header: config.user_header.clone(),
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<_> = self.data.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn clear(&self) {
        self.data.write().await.clear();
    }
}

#[async_trait]
impl HttpCacheStore for InMemoryStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CachedValues>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, values: CachedValues) -> StoreResult<()> {
        self.data.write().await.insert(key.clone(), values);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    fn build_user_key(&self, request: &Request<Bytes>) -> Option<String> {
        self.user_header
            .as_ref()
            .and_then(|header| user_from_header(request, header))
    }
}

/// In-memory byte store, a backend for [`CodecStore`](crate::CodecStore).
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    data: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get_bytes(&self, key: &str) -> StoreResult<Option<Bytes>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set_bytes(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }
}
