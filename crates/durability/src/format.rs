//! Payload storage formats
//!
//! | Format      | Tag          | Extension     | Encoding        | Compression |
//! |-------------|--------------|---------------|-----------------|-------------|
//! | `Json`      | `json`       | `.json`       | structured text | none        |
//! | `JsonGz`    | `json.gz`    | `.json.gz`    | structured text | gzip        |
//! | `MsgPack`   | `msgpack`    | `.msgpack`    | opaque binary   | none        |
//! | `MsgPackGz` | `msgpack.gz` | `.msgpack.gz` | opaque binary   | gzip        |
//!
//! The tag is what metadata sidecars and config files store.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::SerializationError;

/// How the graph is turned into bytes before compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Self-describing JSON document (human readable, portable)
    StructuredText,
    /// MessagePack of the in-memory model (compact, crate-specific)
    OpaqueBinary,
}

/// Payload storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageFormat {
    /// Plain JSON
    #[default]
    Json,
    /// Gzip-compressed JSON
    JsonGz,
    /// MessagePack
    MsgPack,
    /// Gzip-compressed MessagePack
    MsgPackGz,
}

impl StorageFormat {
    /// Every format
    pub const ALL: [StorageFormat; 4] = [
        StorageFormat::Json,
        StorageFormat::JsonGz,
        StorageFormat::MsgPack,
        StorageFormat::MsgPackGz,
    ];

    /// Tag written to metadata and config
    pub fn tag(&self) -> &'static str {
        match self {
            StorageFormat::Json => "json",
            StorageFormat::JsonGz => "json.gz",
            StorageFormat::MsgPack => "msgpack",
            StorageFormat::MsgPackGz => "msgpack.gz",
        }
    }

    /// File extension including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            StorageFormat::Json => ".json",
            StorageFormat::JsonGz => ".json.gz",
            StorageFormat::MsgPack => ".msgpack",
            StorageFormat::MsgPackGz => ".msgpack.gz",
        }
    }

    /// Encoding used before compression
    pub fn encoding(&self) -> Encoding {
        match self {
            StorageFormat::Json | StorageFormat::JsonGz => Encoding::StructuredText,
            StorageFormat::MsgPack | StorageFormat::MsgPackGz => Encoding::OpaqueBinary,
        }
    }

    /// True if the payload is gzip-compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, StorageFormat::JsonGz | StorageFormat::MsgPackGz)
    }

    /// Compressed variant with the same encoding
    pub fn compressed(self) -> Self {
        match self {
            StorageFormat::Json | StorageFormat::JsonGz => StorageFormat::JsonGz,
            StorageFormat::MsgPack | StorageFormat::MsgPackGz => StorageFormat::MsgPackGz,
        }
    }

    /// Uncompressed variant with the same encoding
    pub fn uncompressed(self) -> Self {
        match self {
            StorageFormat::Json | StorageFormat::JsonGz => StorageFormat::Json,
            StorageFormat::MsgPack | StorageFormat::MsgPackGz => StorageFormat::MsgPack,
        }
    }

    /// Resolve a tag (ASCII case-insensitive)
    pub fn from_tag(tag: &str) -> Result<Self, SerializationError> {
        let wanted = tag.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SerializationError::UnknownFormat(tag.to_string()))
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for StorageFormat {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}

impl Serialize for StorageFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for StorageFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::from_tag(&tag).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_resolve_back() {
        for format in StorageFormat::ALL {
            assert_eq!(StorageFormat::from_tag(format.tag()).unwrap(), format);
        }
        assert_eq!(StorageFormat::from_tag("JSON.GZ").unwrap(), StorageFormat::JsonGz);
    }

    #[test]
    fn test_unknown_tag() {
        let err = StorageFormat::from_tag("pickle").unwrap_err();
        assert!(matches!(err, SerializationError::UnknownFormat(ref t) if t == "pickle"));
    }

    #[test]
    fn test_extensions_end_with_tag() {
        for format in StorageFormat::ALL {
            assert!(format.extension().starts_with('.'));
            assert_eq!(&format.extension()[1..], format.tag());
        }
    }

    #[test]
    fn test_compression_variants() {
        assert_eq!(StorageFormat::Json.compressed(), StorageFormat::JsonGz);
        assert_eq!(StorageFormat::MsgPackGz.uncompressed(), StorageFormat::MsgPack);
        assert!(StorageFormat::JsonGz.is_compressed());
        assert!(!StorageFormat::MsgPack.is_compressed());
        assert_eq!(StorageFormat::JsonGz.encoding(), Encoding::StructuredText);
        assert_eq!(StorageFormat::MsgPack.encoding(), Encoding::OpaqueBinary);
    }

    #[test]
    fn test_serde_uses_tag() {
        let json = serde_json::to_string(&StorageFormat::MsgPackGz).unwrap();
        assert_eq!(json, "\"msgpack.gz\"");
        let back: StorageFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(back, StorageFormat::Json);
    }
}
