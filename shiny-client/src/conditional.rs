//! Conditional requests and 304 merging.

use bytes::Bytes;
use http::header::{
    CONTENT_LENGTH, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, TRANSFER_ENCODING,
};
use http::{HeaderMap, HeaderValue, Request};
use shiny_cache::{CachedResponse, EntityTag, HeaderList, Validator};
use tracing::warn;

/// How the headers of a 304 are folded into the stored response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the stored headers untouched.
    KeepStored,
    /// Headers present on the 304 replace stored ones of the same name.
    PreferServer,
}

impl MergePolicy {
    /// Pick the policy from the strength of the stored entity tag.
    pub fn for_validator(validator: &Validator) -> Self {
        match validator {
            Validator::ETag(tag) | Validator::Both(tag, _) => match tag {
                EntityTag::Strong(_) => Self::KeepStored,
                EntityTag::Weak(_) => Self::PreferServer,
            },
            Validator::ExpirationDateUtc(_) | Validator::None => Self::PreferServer,
        }
    }
}

/// Copy a request, including its body. Extensions are not carried over.
pub fn clone_request(request: &Request<Bytes>) -> Request<Bytes> {
    let mut clone = Request::new(request.body().clone());
    *clone.method_mut() = request.method().clone();
    *clone.uri_mut() = request.uri().clone();
    *clone.version_mut() = request.version();
    *clone.headers_mut() = request.headers().clone();
    clone
}

/// Build the revalidation request for a stored entry.
///
/// The entity tag of the validator is sent in `If-None-Match` with its
/// weakness preserved. Without a tag, the stored `Last-Modified` is sent as
/// `If-Modified-Since`.
pub fn build_conditional_request(
    request: &Request<Bytes>,
    stored: &CachedResponse,
    validator: &Validator,
) -> Request<Bytes> {
    let mut conditional = clone_request(request);

    match validator.entity_tag() {
        Some(tag) => match HeaderValue::from_str(&tag.to_header_value()) {
            Ok(value) => {
                conditional.headers_mut().append(IF_NONE_MATCH, value);
            }
            Err(_) => warn!(etag = %tag, "stored entity tag is not a valid header value"),
        },
        None => {
            let last_modified = stored
                .headers
                .get(LAST_MODIFIED.as_str())
                .and_then(|value| HeaderValue::from_str(value).ok());
            if let Some(value) = last_modified {
                conditional.headers_mut().insert(IF_MODIFIED_SINCE, value);
            }
        }
    }

    conditional
}

/// Merge a 304 response into the stored one. Status and body always come
/// from the stored response.
pub fn merge_not_modified(
    stored: &CachedResponse,
    not_modified: &HeaderMap,
    policy: MergePolicy,
) -> CachedResponse {
    let mut merged = stored.clone();

    match policy {
        MergePolicy::KeepStored => {}
        MergePolicy::PreferServer => {
            let server = HeaderList::from_header_map(not_modified);
            for (name, values) in server.iter() {
                if is_framing_header(name) {
                    continue;
                }
                merged.headers.insert(name, values.to_vec());
            }
        }
    }

    merged
}

// Describe the 304 message itself, not the stored body.
fn is_framing_header(name: &str) -> bool {
    name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str())
        || name.eq_ignore_ascii_case(TRANSFER_ENCODING.as_str())
}
