// Shiny - a transport- and storage-agnostic HTTP caching layer
//
// This library derives cache settings from response headers, scopes entries
// to shared or per-user keys, and revalidates stale entries with conditional
// requests.

// Re-export cache semantics
pub use shiny_cache::*;

// Re-export the caching client
pub use shiny_client::*;

// Re-export the entry codec
pub use shiny_codec as codec;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        CacheKey,
        CacheKeys,
        CacheSettings,
        CacheSettingsBuilder,
        CacheStatus,
        CachedResponse,
        CachedValues,
        CachingClient,
        CachingClientConfig,
        CachingClientError,
        Clock,
        CodecStore,
        EntityTag,
        ExpirySettings,
        Handled,
        HttpCacheStore,
        HttpServerCacheHeaders,
        HttpTransport,
        InMemoryStore,
        SystemClock,
        Validator,
    };

    #[cfg(feature = "reqwest")]
    pub use crate::ReqwestTransport;
}
