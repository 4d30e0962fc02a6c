//! Encoding and decoding of framed entries.

use bytes::Bytes;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shiny_cache::CachedValues;
use std::io::{Read, Write};
use tracing::trace;

use crate::error::{CodecError, CodecResult};
use crate::frame::FrameHeader;

/// Encode a value into a framed entry, gzip-compressing the payload when
/// `compressed` is set.
pub fn serialize<T: Serialize + ?Sized>(value: &T, compressed: bool) -> CodecResult<Bytes> {
    let mut out = Vec::new();
    serialize_into(&mut out, value, compressed, Compression::default())?;
    Ok(Bytes::from(out))
}

/// Decode a framed entry into `T`.
///
/// Fails with [`CodecError::Decode`] on malformed or truncated input and with
/// [`CodecError::TypeMismatch`] when the payload does not have `T`'s shape.
pub fn deserialize<T: DeserializeOwned>(input: &[u8]) -> CodecResult<T> {
    let (header, payload) = FrameHeader::split(input)?;

    let json = if header.compressed {
        let mut decoded = Vec::new();
        GzDecoder::new(payload)
            .read_to_end(&mut decoded)
            .map_err(|e| CodecError::Decode(format!("invalid gzip payload: {}", e)))?;
        decoded
    } else {
        payload.to_vec()
    };

    let value: serde_json::Value = serde_json::from_slice(&json)
        .map_err(|e| CodecError::Decode(format!("invalid payload: {}", e)))?;

    serde_json::from_value(value).map_err(|e| CodecError::TypeMismatch {
        expected: std::any::type_name::<T>(),
        message: e.to_string(),
    })
}

/// Encode a value into a writer.
pub fn serialize_into<W: Write, T: Serialize + ?Sized>(
    mut writer: W,
    value: &T,
    compressed: bool,
    level: Compression,
) -> CodecResult<()> {
    let json = serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))?;

    writer.write_all(&FrameHeader::new(compressed).to_bytes())?;

    if compressed {
        let mut encoder = GzEncoder::new(writer, level);
        encoder.write_all(&json)?;
        encoder.finish()?;
    } else {
        writer.write_all(&json)?;
    }

    trace!(compressed, payload_len = json.len(), "encoded entry");
    Ok(())
}

/// Decode a value from a reader holding a complete entry.
pub fn deserialize_from<R: Read, T: DeserializeOwned>(mut reader: R) -> CodecResult<T> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;
    deserialize(&input)
}

/// Codec for [`CachedValues`] with a fixed compression choice.
#[derive(Debug, Clone, Copy)]
pub struct EntryCodec {
    compressed: bool,
    level: Compression,
}

impl Default for EntryCodec {
    fn default() -> Self {
        Self {
            compressed: true,
            level: Compression::default(),
        }
    }
}

impl EntryCodec {
    pub fn new(compressed: bool) -> Self {
        Self {
            compressed,
            ..Self::default()
        }
    }

    /// Set the gzip level (0-9).
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Compression::new(level.min(9));
        self
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn encode(&self, values: &CachedValues) -> CodecResult<Bytes> {
        let mut out = Vec::new();
        serialize_into(&mut out, values, self.compressed, self.level)?;
        Ok(Bytes::from(out))
    }

    /// Decode an entry. Compressed and plain entries are both accepted.
    pub fn decode(&self, input: &[u8]) -> CodecResult<CachedValues> {
        deserialize(input)
    }
}
