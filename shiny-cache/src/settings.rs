//! Cache settings derived from response headers.
//!
//! A response is turned into [`CacheSettings`] exactly once; a later 304
//! revalidation may produce new settings that replace the stored ones, but
//! existing settings are never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::trace;

use crate::headers::HttpServerCacheHeaders;

// ============================================================================
// EntityTag
// ============================================================================

/// An HTTP entity tag.
///
/// The value is kept verbatim, quotes included, so that it can be echoed in
/// `If-None-Match` exactly as the origin sent it.
///
/// # Examples
///
/// ```
/// use shiny_cache::EntityTag;
///
/// let weak = EntityTag::parse("W/\"v1\"").unwrap();
/// assert!(weak.is_weak());
/// assert_eq!(weak.value(), "\"v1\"");
/// assert_eq!(weak.to_header_value(), "W/\"v1\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Byte-for-byte identity.
    Strong(String),
    /// Semantic equivalence.
    Weak(String),
}

impl EntityTag {
    /// Create a strong tag from a quoted value.
    pub fn strong(value: impl Into<String>) -> Self {
        Self::Strong(value.into())
    }

    /// Create a weak tag from a quoted value.
    pub fn weak(value: impl Into<String>) -> Self {
        Self::Weak(value.into())
    }

    /// Parse an `ETag` header value. Unquoted tags are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        let (weak, value) = match s.strip_prefix("W/").or_else(|| s.strip_prefix("w/")) {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        if value.len() < 2 || !value.starts_with('"') || !value.ends_with('"') {
            return None;
        }

        let value = value.to_string();
        Some(if weak { Self::Weak(value) } else { Self::Strong(value) })
    }

    /// The quoted opaque tag.
    pub fn value(&self) -> &str {
        match self {
            Self::Strong(value) | Self::Weak(value) => value,
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, Self::Weak(_))
    }

    /// Header representation, with the `W/` prefix for weak tags.
    pub fn to_header_value(&self) -> String {
        match self {
            Self::Strong(value) => value.clone(),
            Self::Weak(value) => format!("W/{}", value),
        }
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

// ============================================================================
// Validator / Expiry
// ============================================================================

/// What a conditional request can assert about a stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validator {
    None,
    ETag(EntityTag),
    ExpirationDateUtc(DateTime<Utc>),
    Both(EntityTag, DateTime<Utc>),
}

impl Validator {
    /// The entity tag component, if any.
    pub fn entity_tag(&self) -> Option<&EntityTag> {
        match self {
            Self::ETag(tag) | Self::Both(tag, _) => Some(tag),
            Self::None | Self::ExpirationDateUtc(_) => None,
        }
    }

    /// The expiration component, if any.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::ExpirationDateUtc(at) | Self::Both(_, at) => Some(*at),
            Self::None | Self::ETag(_) => None,
        }
    }
}

/// Revalidation window of a soft-expiring entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidationSettings {
    pub must_revalidate_at_utc: DateTime<Utc>,
    pub validator: Validator,
}

/// How long a stored entry may be served without contacting the origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirySettings {
    /// Cache forever, never revalidate.
    NoExpiryDate,
    /// Usable until the instant, then refetched without a conditional request.
    HardUtc(DateTime<Utc>),
    /// Usable until `must_revalidate_at_utc`, then revalidated.
    Soft(RevalidationSettings),
}

/// Result of testing an entry against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Past a hard deadline; treat as a miss.
    Expired,
    /// Past the revalidation instant; send a conditional request.
    MustRevalidate,
}

impl ExpirySettings {
    /// Evaluate freshness at `now`.
    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        match self {
            Self::NoExpiryDate => Freshness::Fresh,
            Self::HardUtc(until) if now < *until => Freshness::Fresh,
            Self::HardUtc(_) => Freshness::Expired,
            Self::Soft(revalidation) if now < revalidation.must_revalidate_at_utc => {
                Freshness::Fresh
            }
            Self::Soft(_) => Freshness::MustRevalidate,
        }
    }

    /// The revalidation validator, for soft-expiring entries.
    pub fn validator(&self) -> Option<&Validator> {
        match self {
            Self::Soft(revalidation) => Some(&revalidation.validator),
            Self::NoExpiryDate | Self::HardUtc(_) => None,
        }
    }
}

/// Scope and expiry policy of a cacheable response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// `true` when the response may be reused across users.
    pub shared_cache: bool,
    pub expiry_settings: ExpirySettings,
}

impl CacheSettings {
    pub fn new(shared_cache: bool, expiry_settings: ExpirySettings) -> Self {
        Self {
            shared_cache,
            expiry_settings,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// What to do with a response that carries neither a validator nor any
/// freshness information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFreshnessPolicy {
    /// Store with [`ExpirySettings::NoExpiryDate`].
    #[default]
    CacheIndefinitely,
    /// Do not store the response.
    DoNotCache,
}

/// Derives [`CacheSettings`] from a [`HttpServerCacheHeaders`] record.
///
/// Building is total: malformed or contradictory input resolves to a
/// definite answer rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheSettingsBuilder {
    missing_freshness: MissingFreshnessPolicy,
}

impl CacheSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy applied when no freshness signal is present.
    pub fn missing_freshness(mut self, policy: MissingFreshnessPolicy) -> Self {
        self.missing_freshness = policy;
        self
    }

    /// Build settings for a response observed at `now`.
    ///
    /// Returns `None` when the response must not be cached.
    pub fn build(
        &self,
        headers: &HttpServerCacheHeaders,
        now: DateTime<Utc>,
    ) -> Option<CacheSettings> {
        let cache_control = headers.cache_control.as_ref();

        if cache_control.is_none() && headers.etag.is_none() && headers.expires_utc.is_none() {
            trace!("no caching headers, not cacheable");
            return None;
        }
        if cache_control.is_some_and(|cc| cc.no_store) {
            trace!("no-store, not cacheable");
            return None;
        }

        let shared_cache = !cache_control.is_some_and(|cc| cc.is_private);

        let age = cache_control.and_then(|cc| {
            if shared_cache {
                cc.shared_max_age.or(cc.max_age)
            } else {
                cc.max_age
            }
        });
        let fresh_until = age
            .map(|age| add_age(now, age))
            .or(headers.expires_utc);

        let validator = match (&headers.etag, headers.expires_utc) {
            (Some(tag), Some(expires)) => Validator::Both(tag.clone(), expires),
            (Some(tag), None) => Validator::ETag(tag.clone()),
            (None, Some(expires)) => Validator::ExpirationDateUtc(expires),
            (None, None) => Validator::None,
        };

        let expiry_settings = match (validator, fresh_until) {
            (Validator::None, Some(until)) => ExpirySettings::HardUtc(until),
            (Validator::None, None) => match self.missing_freshness {
                MissingFreshnessPolicy::CacheIndefinitely => ExpirySettings::NoExpiryDate,
                MissingFreshnessPolicy::DoNotCache => {
                    trace!("no freshness information, not cacheable");
                    return None;
                }
            },
            (validator, fresh_until) => {
                let must_revalidate_at_utc = if headers.etag.is_some() {
                    now
                } else {
                    fresh_until.unwrap_or(now)
                };
                ExpirySettings::Soft(RevalidationSettings {
                    must_revalidate_at_utc,
                    validator,
                })
            }
        };

        trace!(shared_cache, expiry = ?expiry_settings, "built cache settings");

        Some(CacheSettings {
            shared_cache,
            expiry_settings,
        })
    }
}

/// Build settings with the default policy.
pub fn build(headers: &HttpServerCacheHeaders, now: DateTime<Utc>) -> Option<CacheSettings> {
    CacheSettingsBuilder::new().build(headers, now)
}

// An unrepresentable instant is treated as already stale.
fn add_age(now: DateTime<Utc>, age: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(age)
        .ok()
        .and_then(|age| now.checked_add_signed(age))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::CacheControlDirectives;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn cc() -> CacheControlDirectives {
        CacheControlDirectives::new()
    }

    fn soft(settings: &CacheSettings) -> &RevalidationSettings {
        match &settings.expiry_settings {
            ExpirySettings::Soft(revalidation) => revalidation,
            other => panic!("expected soft expiry, got {:?}", other),
        }
    }

    #[test]
    fn test_no_headers_is_not_cacheable() {
        assert_eq!(build(&HttpServerCacheHeaders::new(), now()), None);
    }

    #[test]
    fn test_no_store_wins_over_everything() {
        let headers = HttpServerCacheHeaders::new()
            .with_cache_control(cc().no_store().public().max_age(Duration::from_secs(60)))
            .with_etag(EntityTag::strong("\"a\""))
            .with_expires(now() + chrono::Duration::days(1));

        assert_eq!(build(&headers, now()), None);
    }

    #[test]
    fn test_max_age_only_is_hard() {
        let headers = HttpServerCacheHeaders::new()
            .with_cache_control(cc().max_age(Duration::from_secs(86_400)));

        let settings = build(&headers, now()).unwrap();

        assert!(settings.shared_cache);
        assert_eq!(
            settings.expiry_settings,
            ExpirySettings::HardUtc(now() + chrono::Duration::days(1))
        );
    }

    #[test]
    fn test_shared_max_age_preferred_for_shared_cache() {
        let headers = HttpServerCacheHeaders::new().with_cache_control(
            cc().max_age(Duration::from_secs(100))
                .s_maxage(Duration::from_secs(10)),
        );

        let settings = build(&headers, now()).unwrap();
        assert_eq!(
            settings.expiry_settings,
            ExpirySettings::HardUtc(now() + chrono::Duration::seconds(10))
        );
    }

    #[test]
    fn test_shared_max_age_ignored_for_private() {
        let headers = HttpServerCacheHeaders::new().with_cache_control(
            cc().private()
                .max_age(Duration::from_secs(100))
                .s_maxage(Duration::from_secs(10)),
        );

        let settings = build(&headers, now()).unwrap();

        assert!(!settings.shared_cache);
        assert_eq!(
            settings.expiry_settings,
            ExpirySettings::HardUtc(now() + chrono::Duration::seconds(100))
        );
    }

    #[test]
    fn test_max_age_preferred_over_expires_for_instant() {
        let expires = now() + chrono::Duration::days(7);
        let headers = HttpServerCacheHeaders::new()
            .with_cache_control(cc().max_age(Duration::from_secs(60)))
            .with_expires(expires);

        let settings = build(&headers, now()).unwrap();
        let revalidation = soft(&settings);

        assert_eq!(
            revalidation.must_revalidate_at_utc,
            now() + chrono::Duration::seconds(60)
        );
        assert_eq!(revalidation.validator, Validator::ExpirationDateUtc(expires));
    }

    #[test]
    fn test_immutable_only_caches_indefinitely() {
        let headers = HttpServerCacheHeaders::new().with_cache_control(cc().immutable());

        let settings = build(&headers, now()).unwrap();

        assert!(settings.shared_cache);
        assert_eq!(settings.expiry_settings, ExpirySettings::NoExpiryDate);
    }

    #[test]
    fn test_missing_freshness_do_not_cache() {
        let headers = HttpServerCacheHeaders::new().with_cache_control(cc().public());

        let settings = CacheSettingsBuilder::new()
            .missing_freshness(MissingFreshnessPolicy::DoNotCache)
            .build(&headers, now());

        assert_eq!(settings, None);
    }

    #[test]
    fn test_missing_freshness_policy_not_applied_with_validator() {
        let headers = HttpServerCacheHeaders::new().with_etag(EntityTag::weak("\"w\""));

        let settings = CacheSettingsBuilder::new()
            .missing_freshness(MissingFreshnessPolicy::DoNotCache)
            .build(&headers, now());

        assert!(settings.is_some());
    }

    #[test]
    fn test_etag_only_revalidates_now() {
        for tag in [EntityTag::strong("\"etg\""), EntityTag::weak("\"etg\"")] {
            let headers = HttpServerCacheHeaders::new().with_etag(tag.clone());

            let settings = build(&headers, now()).unwrap();
            let revalidation = soft(&settings);

            assert!(settings.shared_cache);
            assert_eq!(revalidation.must_revalidate_at_utc, now());
            assert_eq!(revalidation.validator, Validator::ETag(tag));
        }
    }

    #[test]
    fn test_etag_revalidates_now_regardless_of_max_age() {
        let headers = HttpServerCacheHeaders::new()
            .with_cache_control(cc().private().max_age(Duration::from_secs(3600)))
            .with_etag(EntityTag::strong("\"etg\""));

        let settings = build(&headers, now()).unwrap();

        assert!(!settings.shared_cache);
        assert_eq!(soft(&settings).must_revalidate_at_utc, now());
    }

    #[test]
    fn test_expires_only_revalidates_at_expiry() {
        let expires = now() + chrono::Duration::hours(2);
        let headers = HttpServerCacheHeaders::new().with_expires(expires);

        let settings = build(&headers, now()).unwrap();
        let revalidation = soft(&settings);

        assert_eq!(revalidation.must_revalidate_at_utc, expires);
        assert_eq!(revalidation.validator, Validator::ExpirationDateUtc(expires));
    }

    #[test]
    fn test_etag_and_past_expires_is_both() {
        let expires = now() - chrono::Duration::days(1);
        let tag = EntityTag::strong("\"etg\"");
        let headers = HttpServerCacheHeaders::new()
            .with_etag(tag.clone())
            .with_expires(expires);

        let settings = build(&headers, now()).unwrap();
        let revalidation = soft(&settings);

        assert_eq!(revalidation.must_revalidate_at_utc, now());
        assert_eq!(revalidation.validator, Validator::Both(tag, expires));
    }

    #[test]
    fn test_shared_cache_reflects_private_only() {
        let cases = [
            (cc(), true),
            (cc().immutable(), true),
            (cc().max_age(Duration::from_secs(5)), true),
            (cc().private(), false),
            (cc().private().immutable(), false),
            (cc().private().max_age(Duration::from_secs(5)), false),
        ];

        for (directives, shared) in cases {
            let headers = HttpServerCacheHeaders::new().with_cache_control(directives);
            assert_eq!(build(&headers, now()).unwrap().shared_cache, shared);
        }
    }

    #[test]
    fn test_freshness() {
        let later = now() + chrono::Duration::seconds(1);

        assert_eq!(ExpirySettings::NoExpiryDate.freshness(now()), Freshness::Fresh);
        assert_eq!(ExpirySettings::HardUtc(later).freshness(now()), Freshness::Fresh);
        assert_eq!(ExpirySettings::HardUtc(now()).freshness(now()), Freshness::Expired);

        let soft = |at| {
            ExpirySettings::Soft(RevalidationSettings {
                must_revalidate_at_utc: at,
                validator: Validator::None,
            })
        };
        assert_eq!(soft(later).freshness(now()), Freshness::Fresh);
        assert_eq!(soft(now()).freshness(now()), Freshness::MustRevalidate);
    }

    #[test]
    fn test_entity_tag_parse() {
        assert_eq!(EntityTag::parse("\"abc\""), Some(EntityTag::strong("\"abc\"")));
        assert_eq!(EntityTag::parse(" w/\"abc\" "), Some(EntityTag::weak("\"abc\"")));
        assert_eq!(EntityTag::parse("\"\""), Some(EntityTag::strong("\"\"")));
        assert_eq!(EntityTag::parse("abc"), None);
        assert_eq!(EntityTag::parse("W/abc"), None);
        assert_eq!(EntityTag::parse("\""), None);
    }

    #[test]
    fn test_entity_tag_header_value() {
        assert_eq!(EntityTag::strong("\"x\"").to_header_value(), "\"x\"");
        assert_eq!(EntityTag::weak("\"x\"").to_string(), "W/\"x\"");
    }

    #[test]
    fn test_validator_components() {
        let tag = EntityTag::strong("\"t\"");

        assert_eq!(Validator::None.entity_tag(), None);
        assert_eq!(Validator::Both(tag.clone(), now()).entity_tag(), Some(&tag));
        assert_eq!(Validator::Both(tag.clone(), now()).expiration(), Some(now()));
        assert_eq!(Validator::ETag(tag).expiration(), None);
    }
}
