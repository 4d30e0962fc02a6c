//! Cached entries: the captured response plus its settings.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode, Version};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::settings::CacheSettings;

// ============================================================================
// HTTP Version
// ============================================================================

/// Protocol version of a captured response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HttpVersion {
    Http09,
    Http10,
    #[default]
    Http11,
    H2,
    H3,
}

impl From<Version> for HttpVersion {
    fn from(version: Version) -> Self {
        match version {
            Version::HTTP_09 => Self::Http09,
            Version::HTTP_10 => Self::Http10,
            Version::HTTP_2 => Self::H2,
            Version::HTTP_3 => Self::H3,
            _ => Self::Http11,
        }
    }
}

impl From<HttpVersion> for Version {
    fn from(version: HttpVersion) -> Self {
        match version {
            HttpVersion::Http09 => Version::HTTP_09,
            HttpVersion::Http10 => Version::HTTP_10,
            HttpVersion::Http11 => Version::HTTP_11,
            HttpVersion::H2 => Version::HTTP_2,
            HttpVersion::H3 => Version::HTTP_3,
        }
    }
}

// ============================================================================
// Header List
// ============================================================================

/// One header name with all of its values in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub values: Vec<String>,
}

/// Header multimap with case-insensitive names.
///
/// Names keep the spelling of their first occurrence and the order in which
/// they were first seen; values keep their order and multiplicity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderList {
    entries: Vec<HeaderEntry>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Append a value, keeping existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.entries[index].values.push(value.into()),
            None => self.entries.push(HeaderEntry {
                name,
                values: vec![value.into()],
            }),
        }
    }

    /// Replace all values of a header. The header keeps its position if it
    /// already exists.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.entries[index].values = values,
            None => self.entries.push(HeaderEntry { name, values }),
        }
    }

    /// Remove a header, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name)
            .map(|index| self.entries.remove(index).values)
    }

    /// First value of a header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a header.
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.position(name)
            .map(|index| self.entries[index].values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capture an [`http::HeaderMap`]. Non-UTF-8 values are converted lossily.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let mut list = Self::new();
        for (name, value) in headers {
            list.append(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        list
    }

    /// Rebuild an [`http::HeaderMap`]. Entries that are not valid header
    /// names or values are skipped.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, values) in self.iter() {
            let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
                warn!(header = %name, "skipping invalid cached header name");
                continue;
            };
            for value in values {
                match HeaderValue::from_str(value) {
                    Ok(value) => {
                        headers.append(header_name.clone(), value);
                    }
                    Err(_) => warn!(header = %name, "skipping invalid cached header value"),
                }
            }
        }
        headers
    }
}

// ============================================================================
// Cached Response
// ============================================================================

/// A captured response with its body materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    /// Canonical reason for `status`; `http::Response` does not carry the
    /// phrase the origin sent. `None` for unregistered codes.
    pub reason_phrase: Option<String>,
    pub version: HttpVersion,
    pub headers: HeaderList,
    #[serde(with = "body_base64")]
    pub body: Bytes,
}

impl CachedResponse {
    /// Create a response with the given status and no headers or body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            reason_phrase: status.canonical_reason().map(str::to_string),
            version: HttpVersion::default(),
            headers: HeaderList::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Capture a response whose body has already been read.
    pub fn from_response(response: &Response<Bytes>) -> Self {
        let status = response.status();
        Self {
            status: status.as_u16(),
            reason_phrase: status.canonical_reason().map(str::to_string),
            version: response.version().into(),
            headers: HeaderList::from_header_map(response.headers()),
            body: response.body().clone(),
        }
    }

    /// Rebuild an [`http::Response`].
    pub fn to_response(&self) -> Response<Bytes> {
        let status = StatusCode::from_u16(self.status).unwrap_or_else(|_| {
            warn!(status = self.status, "invalid cached status code");
            StatusCode::OK
        });

        let mut response = Response::new(self.body.clone());
        *response.status_mut() = status;
        *response.version_mut() = self.version.into();
        *response.headers_mut() = self.headers.to_header_map();
        response
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status).ok()
    }
}

/// The unit persisted to and restored from a cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedValues {
    pub response: CachedResponse,
    pub settings: CacheSettings,
}

impl CachedValues {
    pub fn new(response: CachedResponse, settings: CacheSettings) -> Self {
        Self { response, settings }
    }
}

mod body_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
