//! Caching-relevant response headers.
//!
//! [`HttpServerCacheHeaders`] is a neutral snapshot of the headers the
//! settings builder cares about. It can be filled in by hand or extracted
//! from an [`http::HeaderMap`] / [`HeaderList`].

use chrono::{DateTime, Utc};
use http::HeaderMap;
use std::time::Duration;

use crate::entry::HeaderList;
use crate::settings::EntityTag;

/// Parsed `Cache-Control` directives.
///
/// Only the directives that influence caching decisions are kept; unknown
/// extensions are dropped during parsing.
///
/// # Examples
///
/// ```
/// use shiny_cache::CacheControlDirectives;
/// use std::time::Duration;
///
/// let cc = CacheControlDirectives::parse("private, max-age=3600");
/// assert!(cc.is_private);
/// assert_eq!(cc.max_age, Some(Duration::from_secs(3600)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControlDirectives {
    /// `no-store`: the response must not be stored by any cache.
    pub no_store: bool,
    /// `no-cache`: the response may be stored but must be validated before use.
    pub no_cache: bool,
    /// `private`: the response is intended for a single user.
    pub is_private: bool,
    /// `public`: the response may be stored by shared caches.
    pub is_public: bool,
    /// `must-revalidate`
    pub must_revalidate: bool,
    /// `immutable`
    pub immutable: bool,
    /// `max-age`
    pub max_age: Option<Duration>,
    /// `s-maxage`, only honoured by shared caches.
    pub shared_max_age: Option<Duration>,
}

impl CacheControlDirectives {
    /// Create an empty directive set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cache-Control` header value.
    ///
    /// Directive names are case-insensitive. Delta-seconds values that fail
    /// to parse are ignored; when a directive repeats, the shortest age wins.
    pub fn parse(header: &str) -> Self {
        let mut directives = Self::default();

        for raw in header.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let (name, value) = match raw.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
                None => (raw, None),
            };

            match name.to_ascii_lowercase().as_str() {
                "no-store" => directives.no_store = true,
                "no-cache" => directives.no_cache = true,
                "private" => directives.is_private = true,
                "public" => directives.is_public = true,
                "must-revalidate" => directives.must_revalidate = true,
                "immutable" => directives.immutable = true,
                "max-age" => {
                    directives.max_age = shortest(directives.max_age, value.and_then(parse_seconds));
                }
                "s-maxage" => {
                    directives.shared_max_age =
                        shortest(directives.shared_max_age, value.and_then(parse_seconds));
                }
                _ => {}
            }
        }

        directives
    }

    // ==================== Builder Methods ====================

    /// Set the `no-store` directive.
    pub fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }

    /// Set the `private` directive.
    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }

    /// Set the `public` directive.
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    /// Set the `immutable` directive.
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Set the `max-age` directive.
    pub fn max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    /// Set the `s-maxage` directive.
    pub fn s_maxage(mut self, age: Duration) -> Self {
        self.shared_max_age = Some(age);
        self
    }
}

/// Delta-seconds above 2^31 are treated as 2^31 (RFC 9111, section 1.2.2).
const MAX_DELTA_SECONDS: u64 = 1 << 31;

fn parse_seconds(value: &str) -> Option<Duration> {
    value
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(MAX_DELTA_SECONDS)))
}

fn shortest(current: Option<Duration>, parsed: Option<Duration>) -> Option<Duration> {
    match (current, parsed) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Snapshot of the caching-relevant headers of one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpServerCacheHeaders {
    /// `Cache-Control`, absent when the response carried none.
    pub cache_control: Option<CacheControlDirectives>,
    /// Raw `Pragma` value.
    pub pragma: Option<String>,
    /// `ETag`, with its weakness taken from the `W/` prefix.
    pub etag: Option<EntityTag>,
    /// `Expires`
    pub expires_utc: Option<DateTime<Utc>>,
    /// `Last-Modified`
    pub last_modified_utc: Option<DateTime<Utc>>,
    /// Raw `Vary` value.
    pub vary: Option<String>,
}

impl HttpServerCacheHeaders {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the record from an [`http::HeaderMap`].
    ///
    /// Values that are not valid visible ASCII are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_pairs(
            headers
                .iter()
                .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value))),
        )
    }

    /// Extract the record from a stored [`HeaderList`].
    pub fn from_header_list(headers: &HeaderList) -> Self {
        Self::from_pairs(
            headers
                .iter()
                .flat_map(|(name, values)| values.iter().map(move |value| (name, value.as_str()))),
        )
    }

    /// Extract the record from `(name, value)` pairs. Names are matched
    /// case-insensitively; repeated `Cache-Control` lines are combined.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut record = Self::default();
        let mut cache_control: Vec<&str> = Vec::new();

        for (name, value) in pairs {
            let name = name.trim();
            if name.eq_ignore_ascii_case("cache-control") {
                cache_control.push(value);
            } else if name.eq_ignore_ascii_case("etag") {
                if record.etag.is_none() {
                    record.etag = EntityTag::parse(value);
                }
            } else if name.eq_ignore_ascii_case("expires") {
                if record.expires_utc.is_none() {
                    record.expires_utc = parse_http_date(value);
                }
            } else if name.eq_ignore_ascii_case("last-modified") {
                if record.last_modified_utc.is_none() {
                    record.last_modified_utc = parse_http_date(value);
                }
            } else if name.eq_ignore_ascii_case("pragma") {
                record.pragma.get_or_insert_with(|| value.trim().to_string());
            } else if name.eq_ignore_ascii_case("vary") {
                record.vary.get_or_insert_with(|| value.trim().to_string());
            }
        }

        if !cache_control.is_empty() {
            record.cache_control = Some(CacheControlDirectives::parse(&cache_control.join(",")));
        }

        record
    }

    // ==================== Builder Methods ====================

    /// Set the `Cache-Control` directives.
    pub fn with_cache_control(mut self, cache_control: CacheControlDirectives) -> Self {
        self.cache_control = Some(cache_control);
        self
    }

    /// Set the entity tag.
    pub fn with_etag(mut self, etag: EntityTag) -> Self {
        self.etag = Some(etag);
        self
    }

    /// Set the `Expires` instant.
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires_utc = Some(expires);
        self
    }

    /// Set the `Last-Modified` instant.
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified_utc = Some(last_modified);
        self
    }

    /// Set the raw `Pragma` value.
    pub fn with_pragma(mut self, pragma: impl Into<String>) -> Self {
        self.pragma = Some(pragma.into());
        self
    }

    /// Set the raw `Vary` value.
    pub fn with_vary(mut self, vary: impl Into<String>) -> Self {
        self.vary = Some(vary.into());
        self
    }
}

/// Parse an HTTP-date (`Expires`, `Last-Modified`). Invalid dates yield `None`.
pub(crate) fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    httpdate::parse_http_date(value.trim())
        .ok()
        .map(DateTime::<Utc>::from)
}
