//! Entry frame header.
//!
//! ```text
//! offset 0..4  magic  b"SHCE"
//! offset 4     format version
//! offset 5     flags (bit 0 = gzip payload)
//! offset 6..   payload
//! ```

use crate::error::{CodecError, CodecResult};

/// Leading bytes of every encoded entry.
pub const MAGIC: [u8; 4] = *b"SHCE";

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Payload is gzip-compressed.
pub const FLAG_GZIP: u8 = 0b0000_0001;

/// Length of the frame header in bytes.
pub const HEADER_LEN: usize = 6;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub compressed: bool,
}

impl FrameHeader {
    pub fn new(compressed: bool) -> Self {
        Self {
            version: FORMAT_VERSION,
            compressed,
        }
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let flags = if self.compressed { FLAG_GZIP } else { 0 };
        [
            MAGIC[0],
            MAGIC[1],
            MAGIC[2],
            MAGIC[3],
            self.version,
            flags,
        ]
    }

    /// Split `input` into its header and payload.
    pub fn split(input: &[u8]) -> CodecResult<(Self, &[u8])> {
        if input.len() < HEADER_LEN {
            return Err(CodecError::Decode(format!(
                "truncated frame: {} bytes, header needs {}",
                input.len(),
                HEADER_LEN
            )));
        }

        let (header, payload) = input.split_at(HEADER_LEN);

        if header[..4] != MAGIC {
            return Err(CodecError::Decode("bad magic".to_string()));
        }

        let version = header[4];
        if version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let flags = header[5];
        if flags & !FLAG_GZIP != 0 {
            return Err(CodecError::Decode(format!("unknown flags {:#04x}", flags)));
        }

        Ok((
            Self {
                version,
                compressed: flags & FLAG_GZIP != 0,
            },
            payload,
        ))
    }
}

/// Whether `input` holds a compressed entry, read from its frame header.
pub fn is_compressed(input: &[u8]) -> CodecResult<bool> {
    FrameHeader::split(input).map(|(header, _)| header.compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bytes() {
        assert_eq!(FrameHeader::new(true).to_bytes(), *b"SHCE\x01\x01");
        assert_eq!(FrameHeader::new(false).to_bytes(), *b"SHCE\x01\x00");
    }

    #[test]
    fn test_split() {
        let (header, payload) = FrameHeader::split(b"SHCE\x01\x01{}").unwrap();

        assert!(header.compressed);
        assert_eq!(payload, b"{}");
    }

    #[test]
    fn test_split_rejects_short_input() {
        assert!(matches!(
            FrameHeader::split(b"SHC"),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_split_rejects_bad_magic() {
        assert!(matches!(
            FrameHeader::split(b"NOPE\x01\x00{}"),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_split_rejects_unknown_version() {
        assert!(matches!(
            FrameHeader::split(b"SHCE\x07\x00{}"),
            Err(CodecError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_split_rejects_unknown_flags() {
        assert!(matches!(
            FrameHeader::split(b"SHCE\x01\x02{}"),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_is_compressed() {
        assert!(is_compressed(b"SHCE\x01\x01").unwrap());
        assert!(!is_compressed(b"SHCE\x01\x00").unwrap());
    }
}
