//! Recording fakes shared by the end-to-end tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use http::{HeaderName, Request, Response};
use parking_lot::Mutex;
use shiny::{
    CacheKey, CachedValues, HttpCacheStore, HttpTransport, InMemoryStore, StoreError,
    StoreResult, TransportError, TransportResult,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const USER_HEADER: &str = "x-user";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
}

pub fn get(uri: &str) -> Request<Bytes> {
    Request::get(uri).body(Bytes::new()).unwrap()
}

pub fn get_as(uri: &str, user: &str) -> Request<Bytes> {
    Request::get(uri)
        .header(USER_HEADER, user)
        .body(Bytes::new())
        .unwrap()
}

/// Store call log.
#[derive(Debug, Default)]
pub struct StoreCalls {
    pub gets: Vec<CacheKey>,
    pub puts: Vec<(CacheKey, CachedValues)>,
    pub deletes: Vec<CacheKey>,
}

/// In-memory store that records every call.
#[derive(Clone)]
pub struct RecordingStore {
    inner: InMemoryStore,
    calls: Arc<Mutex<StoreCalls>>,
    fail_gets: bool,
    fail_puts: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new().with_user_header(HeaderName::from_static(USER_HEADER)),
            calls: Arc::new(Mutex::new(StoreCalls::default())),
            fail_gets: false,
            fail_puts: false,
        }
    }

    pub fn failing_gets(mut self) -> Self {
        self.fail_gets = true;
        self
    }

    pub fn failing_puts(mut self) -> Self {
        self.fail_puts = true;
        self
    }

    /// Seed an entry without recording the call.
    pub async fn seed(&self, key: &CacheKey, values: CachedValues) {
        self.inner.put(key, values).await.unwrap();
    }

    pub async fn entry(&self, key: &CacheKey) -> Option<CachedValues> {
        self.inner.get(key).await.unwrap()
    }

    pub fn calls(&self) -> parking_lot::MutexGuard<'_, StoreCalls> {
        self.calls.lock()
    }
}

#[async_trait]
impl HttpCacheStore for RecordingStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CachedValues>> {
        self.calls.lock().gets.push(key.clone());
        if self.fail_gets {
            return Err(StoreError::Backend("read failed".into()));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &CacheKey, values: CachedValues) -> StoreResult<()> {
        self.calls.lock().puts.push((key.clone(), values.clone()));
        if self.fail_puts {
            return Err(StoreError::Backend("write failed".into()));
        }
        self.inner.put(key, values).await
    }

    async fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        self.calls.lock().deletes.push(key.clone());
        self.inner.delete(key).await
    }

    fn build_user_key(&self, request: &Request<Bytes>) -> Option<String> {
        self.inner.build_user_key(request)
    }
}

/// Transport replaying queued responses and recording requests.
///
/// With no queued response the call waits until cancelled.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<Vec<Response<Bytes>>>>,
    requests: Arc<Mutex<Vec<Request<Bytes>>>>,
    cancel_on_reply: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: Response<Bytes>) -> Self {
        self.responses.lock().push(response);
        self
    }

    /// Fire the caller's token just as each response is handed back.
    pub fn cancelling_on_reply(mut self) -> Self {
        self.cancel_on_reply = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> parking_lot::MutexGuard<'_, Vec<Request<Bytes>>> {
        self.requests.lock()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(
        &self,
        request: Request<Bytes>,
        cancel: CancellationToken,
    ) -> TransportResult<Response<Bytes>> {
        self.requests.lock().push(request);

        let next = {
            let mut responses = self.responses.lock();
            (!responses.is_empty()).then(|| responses.remove(0))
        };

        match next {
            Some(response) => {
                if self.cancel_on_reply {
                    cancel.cancel();
                }
                Ok(response)
            }
            None => {
                cancel.cancelled().await;
                Err(TransportError::Cancelled)
            }
        }
    }
}
