//! Entry codec for the Shiny HTTP cache.
//!
//! Cache entries are written as a small versioned frame followed by a JSON
//! payload, optionally gzip-compressed. The frame header records whether the
//! payload is compressed, so readers never need to be told.
//!
//! # Examples
//!
//! ```
//! use http::StatusCode;
//! use shiny_cache::{CacheSettings, CachedResponse, CachedValues, ExpirySettings};
//!
//! let values = CachedValues::new(
//!     CachedResponse::new(StatusCode::OK).with_body("hello"),
//!     CacheSettings::new(true, ExpirySettings::NoExpiryDate),
//! );
//!
//! let bytes = shiny_codec::serialize(&values, true).unwrap();
//! let decoded: CachedValues = shiny_codec::deserialize(&bytes).unwrap();
//! assert_eq!(decoded, values);
//! ```

pub mod codec;
pub mod error;
pub mod frame;

pub use codec::{EntryCodec, deserialize, deserialize_from, serialize, serialize_into};
pub use error::{CodecError, CodecResult};
pub use flate2::Compression;
pub use frame::{FORMAT_VERSION, FrameHeader, MAGIC, is_compressed};
