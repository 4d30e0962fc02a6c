//! Caching HTTP client for Shiny.
//!
//! [`CachingClient`] sits between the caller and an [`HttpTransport`],
//! serving responses from an [`HttpCacheStore`] while they are fresh and
//! revalidating them with conditional requests once they go stale.
//!
//! # Features
//!
//! - **Shared and private scopes** - per-user keys for `private` responses
//! - **Revalidation** - `If-None-Match` / `If-Modified-Since` with 304 merging
//! - **Pluggable ports** - store, transport and clock are traits
//! - **Stores** - [`InMemoryStore`] and the codec-backed [`CodecStore`]
//! - **Cancellation** - via [`tokio_util::sync::CancellationToken`]
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::Request;
//! use shiny_client::{CachingClient, InMemoryStore, ReqwestTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CachingClient::new(InMemoryStore::new(), ReqwestTransport::new()?);
//!
//! let request = Request::get("https://api.example.com/users").body(Bytes::new())?;
//! let response = client.send(request).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod client;
mod clock;
mod codec_store;
pub mod conditional;
mod config;
mod error;
mod memory;
mod outcome;
#[cfg(feature = "reqwest")]
mod reqwest_transport;
mod store;
mod transport;

pub use client::CachingClient;
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec_store::CodecStore;
pub use conditional::MergePolicy;
pub use config::{CachingClientConfig, CachingClientConfigBuilder};
pub use error::{
    CachingClientError, Result, StoreError, StoreResult, TransportError, TransportResult,
};
pub use memory::{InMemoryBlobStore, InMemoryStore};
pub use outcome::{CacheStatus, Handled};
#[cfg(feature = "reqwest")]
pub use reqwest_transport::ReqwestTransport;
pub use store::{BlobStore, HttpCacheStore, user_from_header};
pub use transport::HttpTransport;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::config::CachingClientConfig;
    pub use crate::error::{CachingClientError, StoreError, TransportError};
    pub use crate::outcome::{CacheStatus, Handled};
    pub use crate::store::HttpCacheStore;
    pub use crate::transport::HttpTransport;
    pub use crate::{CachingClient, CodecStore, InMemoryStore};
}
