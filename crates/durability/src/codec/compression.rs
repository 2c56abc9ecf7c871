//! Compression codecs
//!
//! Every payload passes through a [`StorageCodec`] after encoding and before
//! decoding. The codec is picked from the storage format, so the rest of the
//! pipeline never branches on "compressed or not".

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::format::StorageFormat;

/// Byte-level transform applied to encoded payloads
///
/// Codecs must be `Send + Sync` so one instance can serve concurrent
/// callers.
pub trait StorageCodec: Send + Sync {
    /// Transform encoded bytes into on-disk bytes
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Reverse [`StorageCodec::encode`]
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Short codec name used in diagnostics
    fn codec_id(&self) -> &str;
}

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Compressing failed
    #[error("Encode error (codec={codec_id}, data_len={data_len}): {detail}")]
    EncodeError {
        /// Human-readable error description
        detail: String,
        /// Codec that attempted the encode
        codec_id: String,
        /// Length of the input
        data_len: usize,
    },

    /// Decompressing failed (truncated or not compressed by this codec)
    #[error("Decode error (codec={codec_id}, data_len={data_len}): {detail}")]
    DecodeError {
        /// Human-readable error description
        detail: String,
        /// Codec that attempted the decode
        codec_id: String,
        /// Length of the input
        data_len: usize,
    },
}

impl CodecError {
    /// Create an encode error
    pub fn encode(detail: impl Into<String>, codec_id: impl Into<String>, data_len: usize) -> Self {
        CodecError::EncodeError {
            detail: detail.into(),
            codec_id: codec_id.into(),
            data_len,
        }
    }

    /// Create a decode error
    pub fn decode(detail: impl Into<String>, codec_id: impl Into<String>, data_len: usize) -> Self {
        CodecError::DecodeError {
            detail: detail.into(),
            codec_id: codec_id.into(),
            data_len,
        }
    }
}

/// Pass-through codec for uncompressed formats
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl StorageCodec for IdentityCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn codec_id(&self) -> &str {
        "identity"
    }
}

/// Gzip codec for the `.gz` formats
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: Compression,
}

impl GzipCodec {
    /// Gzip at the given level (0-9)
    pub fn with_level(level: u32) -> Self {
        GzipCodec {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for GzipCodec {
    fn default() -> Self {
        GzipCodec {
            level: Compression::default(),
        }
    }
}

impl StorageCodec for GzipCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), self.level);
        encoder
            .write_all(data)
            .and_then(|_| encoder.finish())
            .map_err(|e| CodecError::encode(e.to_string(), self.codec_id(), data.len()))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(data.len().saturating_mul(4));
        GzDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| CodecError::decode(e.to_string(), self.codec_id(), data.len()))?;
        Ok(out)
    }

    fn codec_id(&self) -> &str {
        "gzip"
    }
}

/// Codec matching the compression of `format`
pub fn codec_for(format: StorageFormat) -> Box<dyn StorageCodec> {
    if format.is_compressed() {
        Box::new(GzipCodec::default())
    } else {
        Box::new(IdentityCodec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _accepts_box_dyn_codec(_codec: Box<dyn StorageCodec>) {}

    #[test]
    fn test_identity_is_passthrough() {
        let codec = IdentityCodec;
        let data = b"graph bytes";
        assert_eq!(codec.encode(data).unwrap(), data);
        assert_eq!(codec.decode(data).unwrap(), data);
        assert_eq!(codec.codec_id(), "identity");
    }

    #[test]
    fn test_gzip_roundtrip() {
        let codec = GzipCodec::default();
        let data = "abc".repeat(1000).into_bytes();
        let compressed = codec.encode(&data).unwrap();

        assert!(compressed.len() < data.len());
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
        assert_eq!(codec.decode(&compressed).unwrap(), data);
    }

    #[test]
    fn test_gzip_rejects_plain_bytes() {
        let err = GzipCodec::default().decode(b"{\"not\": \"gzip\"}").unwrap_err();
        match err {
            CodecError::DecodeError {
                codec_id, data_len, ..
            } => {
                assert_eq!(codec_id, "gzip");
                assert_eq!(data_len, 15);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_codec_for_format() {
        assert_eq!(codec_for(StorageFormat::Json).codec_id(), "identity");
        assert_eq!(codec_for(StorageFormat::MsgPack).codec_id(), "identity");
        assert_eq!(codec_for(StorageFormat::JsonGz).codec_id(), "gzip");
        assert_eq!(codec_for(StorageFormat::MsgPackGz).codec_id(), "gzip");
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::decode("corrupt deflate stream", "gzip", 42);
        let msg = err.to_string();
        assert!(msg.contains("corrupt deflate stream"));
        assert!(msg.contains("gzip"));
        assert!(msg.contains("42"));
    }
}
