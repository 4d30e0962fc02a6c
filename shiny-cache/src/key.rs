//! Cache key construction.
//!
//! Keys have the shape `<METHOD>$:<user>$:<absolute-url>`. The user segment
//! is empty for the shared scope; a `$` inside a user id is doubled so the
//! `$:` delimiter stays unambiguous.

use http::{Method, Uri};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Separator between key segments.
pub const KEY_DELIMITER: &str = "$:";

/// Escape a user id for use as a key segment.
///
/// ```
/// assert_eq!(shiny_cache::escape_user("a$b"), "a$$b");
/// ```
pub fn escape_user(user: &str) -> String {
    user.replace('$', "$$")
}

/// An opaque cache-store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key. An absent or empty user denotes the shared scope.
    pub fn new(method: &Method, url: &Url, user: Option<&str>) -> Self {
        let user = user.map(escape_user).unwrap_or_default();
        Self(format!(
            "{}{}{}{}{}",
            method.as_str(),
            KEY_DELIMITER,
            user,
            KEY_DELIMITER,
            url.as_str()
        ))
    }

    /// Build the shared-scope key.
    pub fn shared(method: &Method, url: &Url) -> Self {
        Self::new(method, url, None)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The keys a single request can be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    pub shared: CacheKey,
    /// Present when a user identity could be resolved for the request.
    pub user: Option<CacheKey>,
}

impl CacheKeys {
    /// Derive keys from a method, URL and optional user id.
    pub fn new(method: &Method, url: &Url, user: Option<&str>) -> Self {
        let user = user.filter(|user| !user.is_empty());
        Self {
            shared: CacheKey::shared(method, url),
            user: user.map(|user| CacheKey::new(method, url, Some(user))),
        }
    }

    /// Derive keys for a request URI. Returns `None` when the URI is not
    /// absolute.
    pub fn for_uri(method: &Method, uri: &Uri, user: Option<&str>) -> Option<Self> {
        uri.scheme()?;
        uri.authority()?;
        let url = Url::parse(&uri.to_string()).ok()?;
        Some(Self::new(method, &url, user))
    }

    /// The key an entry with the given scope is stored under.
    pub fn target(&self, shared_cache: bool) -> &CacheKey {
        match (&self.user, shared_cache) {
            (Some(user), false) => user,
            _ => &self.shared,
        }
    }
}
