//! Caching client implementation.

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use shiny_cache::{
    CacheKey, CacheKeys, CacheSettingsBuilder, CachedResponse, CachedValues, Freshness,
    HttpServerCacheHeaders, Validator,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::conditional::{MergePolicy, build_conditional_request, merge_not_modified};
use crate::config::CachingClientConfig;
use crate::error::{CachingClientError, Result, StoreError};
use crate::outcome::{CacheStatus, Handled};
use crate::store::HttpCacheStore;
use crate::transport::HttpTransport;

/// HTTP client that serves and maintains responses in a cache store.
///
/// Each request is looked up under its user-scoped key (when the store can
/// resolve a user) and its shared key. A fresh entry is returned without
/// contacting the origin, a stale one is revalidated or refetched, and a
/// miss is fetched and stored according to the response's caching headers.
///
/// Concurrent requests for the same URL are not coordinated; the last write
/// wins.
#[derive(Clone)]
pub struct CachingClient<S, T, C = SystemClock> {
    store: S,
    transport: T,
    clock: C,
    config: Arc<CachingClientConfig>,
    settings: CacheSettingsBuilder,
}

impl<S, T> CachingClient<S, T, SystemClock>
where
    S: HttpCacheStore,
    T: HttpTransport,
{
    /// Create a client with the default configuration and the system clock.
    pub fn new(store: S, transport: T) -> Self {
        Self::with_config(store, transport, SystemClock, CachingClientConfig::default())
    }
}

impl<S, T, C> CachingClient<S, T, C>
where
    S: HttpCacheStore,
    T: HttpTransport,
    C: Clock,
{
    /// Create a client with the default configuration and a custom clock.
    pub fn with_clock(store: S, transport: T, clock: C) -> Self {
        Self::with_config(store, transport, clock, CachingClientConfig::default())
    }

    /// Create a client with the given configuration.
    pub fn with_config(store: S, transport: T, clock: C, config: CachingClientConfig) -> Self {
        let settings = CacheSettingsBuilder::new().missing_freshness(config.missing_freshness);
        Self {
            store,
            transport,
            clock,
            config: Arc::new(config),
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the client configuration.
    pub fn config(&self) -> &CachingClientConfig {
        &self.config
    }

    /// Send a request through the cache.
    pub async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.handle(request, CancellationToken::new())
            .await
            .map(Handled::into_response)
    }

    /// Send a request through the cache, reporting how it was served.
    ///
    /// Once `cancel` fires the in-flight transport call is abandoned and no
    /// store write is made. Store write failures do not fail the request;
    /// they are returned in [`Handled::persist_error`].
    pub async fn handle(
        &self,
        request: Request<Bytes>,
        cancel: CancellationToken,
    ) -> Result<Handled> {
        if cancel.is_cancelled() {
            return Err(CachingClientError::Cancelled);
        }

        let method = request.method().clone();
        if !self.config.is_cacheable_method(&method) {
            debug!(method = %method, uri = %request.uri(), "cache bypass: method");
            return self.bypass(request, &cancel).await;
        }

        let user = self.store.build_user_key(&request);
        let Some(keys) = CacheKeys::for_uri(&method, request.uri(), user.as_deref()) else {
            debug!(uri = %request.uri(), "cache bypass: uri is not absolute");
            return self.bypass(request, &cancel).await;
        };

        let Some((found, stored)) = self.lookup(&keys).await else {
            debug!(key = %keys.shared, "cache miss");
            let response = self.dispatch(request, &cancel).await?;
            return self
                .store_response(response, &keys, None, CacheStatus::Miss, &cancel)
                .await;
        };

        let now = self.clock.now_utc();
        match stored.settings.expiry_settings.freshness(now) {
            Freshness::Fresh => {
                debug!(key = %found, "cache fresh");
                Ok(Handled::new(stored.response.to_response(), CacheStatus::Fresh))
            }
            Freshness::Expired => {
                debug!(key = %found, "cache stale: hard expiry passed");
                let response = self.dispatch(request, &cancel).await?;
                self.store_response(response, &keys, Some(found), CacheStatus::Refetched, &cancel)
                    .await
            }
            Freshness::MustRevalidate => {
                debug!(key = %found, "cache stale: revalidating");
                self.revalidate(request, &keys, found, stored, &cancel).await
            }
        }
    }

    async fn bypass(&self, request: Request<Bytes>, cancel: &CancellationToken) -> Result<Handled> {
        let response = self.dispatch(request, cancel).await?;
        Ok(Handled::new(response, CacheStatus::Bypass))
    }

    /// Look up the user entry, then the shared one. The user entry wins.
    async fn lookup(&self, keys: &CacheKeys) -> Option<(CacheKey, CachedValues)> {
        let user = match &keys.user {
            Some(key) => self.get(key).await.map(|values| (key.clone(), values)),
            None => None,
        };
        let shared = self
            .get(&keys.shared)
            .await
            .map(|values| (keys.shared.clone(), values));

        user.or(shared)
    }

    async fn get(&self, key: &CacheKey) -> Option<CachedValues> {
        match self.store.get(key).await {
            Ok(values) => values,
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn dispatch(
        &self,
        request: Request<Bytes>,
        cancel: &CancellationToken,
    ) -> Result<Response<Bytes>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CachingClientError::Cancelled),
            result = self.transport.send(request, cancel.clone()) => {
                result.map_err(CachingClientError::from_transport)
            }
        }
    }

    async fn revalidate(
        &self,
        request: Request<Bytes>,
        keys: &CacheKeys,
        found: CacheKey,
        stored: CachedValues,
        cancel: &CancellationToken,
    ) -> Result<Handled> {
        let validator = stored
            .settings
            .expiry_settings
            .validator()
            .cloned()
            .unwrap_or(Validator::None);

        let conditional = build_conditional_request(&request, &stored.response, &validator);

        let response = self.dispatch(conditional, cancel).await?;

        if response.status() != StatusCode::NOT_MODIFIED {
            debug!(key = %found, status = %response.status(), "entry changed at origin");
            return self
                .store_response(response, keys, Some(found), CacheStatus::Refetched, cancel)
                .await;
        }

        let policy = MergePolicy::for_validator(&validator);
        debug!(key = %found, ?policy, "merging 304 into stored response");
        let merged = merge_not_modified(&stored.response, response.headers(), policy);

        let mut handled = Handled::new(merged.to_response(), CacheStatus::Revalidated);

        let refreshed = HttpServerCacheHeaders::from_headers(response.headers());
        if let Some(etag) = refreshed.etag
            && validator.entity_tag() != Some(&etag)
        {
            let mut record = HttpServerCacheHeaders::from_header_list(&merged.headers);
            record.etag = Some(etag);
            let values = self
                .settings
                .build(&record, self.clock.now_utc())
                .map(|settings| CachedValues::new(merged, settings));
            handled.persist_error = self.persist(keys, Some(&found), values, cancel).await?;
        }

        Ok(handled)
    }

    /// Capture an origin response and write it to the cache.
    async fn store_response(
        &self,
        response: Response<Bytes>,
        keys: &CacheKeys,
        previous: Option<CacheKey>,
        status: CacheStatus,
        cancel: &CancellationToken,
    ) -> Result<Handled> {
        // An answer to the caller's own conditional request has no representation to keep.
        if response.status() == StatusCode::NOT_MODIFIED {
            debug!(key = %keys.shared, "origin answered 304, leaving cache as is");
            return Ok(Handled::new(response, status));
        }

        let record = HttpServerCacheHeaders::from_headers(response.headers());
        let values = self
            .settings
            .build(&record, self.clock.now_utc())
            .map(|settings| CachedValues::new(CachedResponse::from_response(&response), settings));

        let persist_error = self.persist(keys, previous.as_ref(), values, cancel).await?;

        Ok(Handled {
            response,
            status,
            persist_error,
        })
    }

    /// Write `values` under their target key, or drop the previous entry
    /// when the response is not cacheable. An entry that moved scope is
    /// removed from its old key.
    async fn persist(
        &self,
        keys: &CacheKeys,
        previous: Option<&CacheKey>,
        values: Option<CachedValues>,
        cancel: &CancellationToken,
    ) -> Result<Option<StoreError>> {
        if cancel.is_cancelled() {
            debug!(key = %keys.shared, "cancelled before cache write");
            return Err(CachingClientError::Cancelled);
        }

        let mut error = None;

        let Some(values) = values else {
            if let Some(previous) = previous {
                debug!(key = %previous, "response not cacheable, removing entry");
                if let Err(e) = self.store.delete(previous).await {
                    warn!(key = %previous, error = %e, "cache delete failed");
                    error = Some(e);
                }
            }
            return Ok(error);
        };

        let target = keys.target(values.settings.shared_cache);
        debug!(key = %target, shared = values.settings.shared_cache, "storing response");

        if let Err(e) = self.store.put(target, values).await {
            warn!(key = %target, error = %e, "cache write failed");
            error = Some(e);
        }

        if let Some(previous) = previous
            && previous != target
        {
            debug!(key = %previous, "entry moved scope, removing old key");
            if let Err(e) = self.store.delete(previous).await {
                warn!(key = %previous, error = %e, "cache delete failed");
                error.get_or_insert(e);
            }
        }

        Ok(error)
    }
}
