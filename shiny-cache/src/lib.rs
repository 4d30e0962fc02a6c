//! HTTP cache semantics for the Shiny caching layer.
//!
//! This crate holds the pure, transport-independent parts of the cache:
//!
//! - **Header record** - [`HttpServerCacheHeaders`], a neutral snapshot of the
//!   caching-relevant response headers
//! - **Cache settings** - [`CacheSettingsBuilder`] turns a header record into a
//!   freshness window plus a revalidation [`Validator`]
//! - **Cache keys** - [`CacheKey`] / [`CacheKeys`] for shared and per-user scopes
//! - **Entries** - [`CachedResponse`] and [`CachedValues`], the unit persisted
//!   to a cache store
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use http::HeaderMap;
//! use shiny_cache::{CacheSettingsBuilder, ExpirySettings, HttpServerCacheHeaders};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("cache-control", "public, max-age=60".parse().unwrap());
//!
//! let record = HttpServerCacheHeaders::from_headers(&headers);
//! let settings = CacheSettingsBuilder::new()
//!     .build(&record, Utc::now())
//!     .expect("cacheable");
//!
//! assert!(settings.shared_cache);
//! assert!(matches!(settings.expiry_settings, ExpirySettings::HardUtc(_)));
//! ```

pub mod entry;
pub mod headers;
pub mod key;
pub mod settings;

pub use entry::{CachedResponse, CachedValues, HeaderEntry, HeaderList, HttpVersion};
pub use headers::{CacheControlDirectives, HttpServerCacheHeaders};
pub use key::{CacheKey, CacheKeys, KEY_DELIMITER, escape_user};
pub use settings::{
    CacheSettings, CacheSettingsBuilder, EntityTag, ExpirySettings, Freshness,
    MissingFreshnessPolicy, RevalidationSettings, Validator, build,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::entry::{CachedResponse, CachedValues, HeaderList, HttpVersion};
    pub use crate::headers::{CacheControlDirectives, HttpServerCacheHeaders};
    pub use crate::key::{CacheKey, CacheKeys};
    pub use crate::settings::{
        CacheSettings, CacheSettingsBuilder, EntityTag, ExpirySettings, Freshness,
        MissingFreshnessPolicy, RevalidationSettings, Validator,
    };
}
