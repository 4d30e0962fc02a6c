//! Caching client configuration.

use http::{HeaderName, Method};
use shiny_cache::MissingFreshnessPolicy;
use std::env;

/// Caching client configuration.
#[derive(Debug, Clone)]
pub struct CachingClientConfig {
    /// Methods whose responses may be served from and written to the cache.
    pub cacheable_methods: Vec<Method>,
    /// Policy for responses without any freshness information.
    pub missing_freshness: MissingFreshnessPolicy,
    /// Gzip entries written by the codec-backed store.
    pub compress_entries: bool,
    /// Request header carrying the user identity for private entries.
    pub user_header: Option<HeaderName>,
}

impl Default for CachingClientConfig {
    fn default() -> Self {
        Self {
            cacheable_methods: vec![Method::GET, Method::HEAD],
            missing_freshness: MissingFreshnessPolicy::default(),
            compress_entries: true,
            user_header: None,
        }
    }
}

impl CachingClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CachingClientConfigBuilder {
        CachingClientConfigBuilder::default()
    }

    /// Create config from environment variables.
    ///
    /// - `SHINY_CACHE_COMPRESS` - `1`/`true` or `0`/`false`
    /// - `SHINY_CACHE_USER_HEADER` - header name
    /// - `SHINY_CACHE_METHODS` - comma-separated methods, e.g. `GET,HEAD`
    /// - `SHINY_CACHE_MISSING_FRESHNESS` - `forever` or `skip`
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let compress_entries = lookup("SHINY_CACHE_COMPRESS")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.compress_entries);

        let user_header = lookup("SHINY_CACHE_USER_HEADER")
            .and_then(|v| HeaderName::from_bytes(v.trim().as_bytes()).ok())
            .or(defaults.user_header);

        let cacheable_methods = lookup("SHINY_CACHE_METHODS")
            .and_then(|v| parse_methods(&v))
            .unwrap_or(defaults.cacheable_methods);

        let missing_freshness = lookup("SHINY_CACHE_MISSING_FRESHNESS")
            .and_then(|v| match v.trim().to_lowercase().as_str() {
                "forever" => Some(MissingFreshnessPolicy::CacheIndefinitely),
                "skip" => Some(MissingFreshnessPolicy::DoNotCache),
                _ => None,
            })
            .unwrap_or(defaults.missing_freshness);

        Self {
            cacheable_methods,
            missing_freshness,
            compress_entries,
            user_header,
        }
    }

    /// Check whether a method uses the cache.
    pub fn is_cacheable_method(&self, method: &Method) -> bool {
        self.cacheable_methods.contains(method)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_methods(value: &str) -> Option<Vec<Method>> {
    let methods = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Method::from_bytes(s.to_uppercase().as_bytes()).ok())
        .collect::<Option<Vec<_>>>()?;

    (!methods.is_empty()).then_some(methods)
}

/// Builder for caching client configuration.
#[derive(Debug, Default)]
pub struct CachingClientConfigBuilder {
    config: CachingClientConfig,
}

impl CachingClientConfigBuilder {
    /// Replace the set of cacheable methods.
    pub fn cacheable_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.config.cacheable_methods = methods.into_iter().collect();
        self
    }

    /// Add a cacheable method.
    pub fn cacheable_method(mut self, method: Method) -> Self {
        if !self.config.cacheable_methods.contains(&method) {
            self.config.cacheable_methods.push(method);
        }
        self
    }

    /// Set the missing-freshness policy.
    pub fn missing_freshness(mut self, policy: MissingFreshnessPolicy) -> Self {
        self.config.missing_freshness = policy;
        self
    }

    /// Enable or disable entry compression.
    pub fn compress_entries(mut self, enable: bool) -> Self {
        self.config.compress_entries = enable;
        self
    }

    /// Set the header that identifies the user.
    pub fn user_header(mut self, name: HeaderName) -> Self {
        self.config.user_header = Some(name);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CachingClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CachingClientConfig::default();

        assert_eq!(config.cacheable_methods, vec![Method::GET, Method::HEAD]);
        assert_eq!(config.missing_freshness, MissingFreshnessPolicy::CacheIndefinitely);
        assert!(config.compress_entries);
        assert!(config.user_header.is_none());
        assert!(!config.is_cacheable_method(&Method::POST));
    }

    #[test]
    fn test_builder() {
        let config = CachingClientConfig::builder()
            .cacheable_methods([Method::GET])
            .cacheable_method(Method::OPTIONS)
            .cacheable_method(Method::GET)
            .missing_freshness(MissingFreshnessPolicy::DoNotCache)
            .compress_entries(false)
            .user_header(HeaderName::from_static("x-user"))
            .build();

        assert_eq!(config.cacheable_methods, vec![Method::GET, Method::OPTIONS]);
        assert_eq!(config.missing_freshness, MissingFreshnessPolicy::DoNotCache);
        assert!(!config.compress_entries);
        assert_eq!(config.user_header.unwrap(), "x-user");
    }

    #[test]
    fn test_from_lookup() {
        let config = CachingClientConfig::from_lookup(lookup(&[
            ("SHINY_CACHE_COMPRESS", "false"),
            ("SHINY_CACHE_USER_HEADER", "X-User-Id"),
            ("SHINY_CACHE_METHODS", "get, head ,post"),
            ("SHINY_CACHE_MISSING_FRESHNESS", "SKIP"),
        ]));

        assert!(!config.compress_entries);
        assert_eq!(config.user_header.unwrap(), "x-user-id");
        assert_eq!(
            config.cacheable_methods,
            vec![Method::GET, Method::HEAD, Method::POST]
        );
        assert_eq!(config.missing_freshness, MissingFreshnessPolicy::DoNotCache);
    }

    #[test]
    fn test_from_lookup_invalid_values_use_defaults() {
        let config = CachingClientConfig::from_lookup(lookup(&[
            ("SHINY_CACHE_COMPRESS", "maybe"),
            ("SHINY_CACHE_USER_HEADER", "bad header"),
            ("SHINY_CACHE_METHODS", " , "),
            ("SHINY_CACHE_MISSING_FRESHNESS", "sometimes"),
        ]));

        let defaults = CachingClientConfig::default();
        assert_eq!(config.compress_entries, defaults.compress_entries);
        assert!(config.user_header.is_none());
        assert_eq!(config.cacheable_methods, defaults.cacheable_methods);
        assert_eq!(config.missing_freshness, defaults.missing_freshness);
    }
}
