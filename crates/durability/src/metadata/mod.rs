//! Graph metadata sidecars
//!
//! Every stored version of a graph has a pretty-printed JSON sidecar next
//! to its payload describing it: version, timestamps, counts, size, format
//! and the SHA-256 checksum of the payload bytes.
//!
//! Sidecars are shape-checked before they are trusted (see
//! [`parse_metadata`]); a sidecar that fails the check is treated as absent.

mod store;

pub use store::{ArchiveOutcome, MetadataStore, Slot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::StorageFormat;

/// Keys every sidecar must carry
const REQUIRED_KEYS: [&str; 7] = [
    "graph_id",
    "name",
    "version",
    "created_at",
    "modified_at",
    "size_bytes",
    "format",
];

/// Descriptive record of one stored version of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// Caller-chosen graph identifier
    pub graph_id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Version number, starting at 1
    pub version: u64,
    /// When the first version of this graph was written; later versions carry it forward
    pub created_at: DateTime<Utc>,
    /// When this version was written
    pub modified_at: DateTime<Utc>,
    /// Author
    #[serde(default)]
    pub author: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Payload size on disk
    pub size_bytes: u64,
    /// Nodes across all collections
    #[serde(default)]
    pub node_count: u64,
    /// Relationships
    #[serde(default)]
    pub relationship_count: u64,
    /// SHA-256 of the payload bytes, lower-case hex
    #[serde(default)]
    pub checksum: String,
    /// Payload format
    pub format: StorageFormat,
    /// Compressed size over uncompressed size, for compressed formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
}

impl GraphMetadata {
    /// Encode as the on-disk sidecar
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

/// Caller-supplied metadata fields for a save
///
/// Unset fields fall back to the graph's own name and description, and to
/// an empty author and tag list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataOverrides {
    /// Display name
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Tags
    pub tags: Option<Vec<String>>,
}

impl MetadataOverrides {
    /// No overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Why a sidecar was rejected
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Not JSON, or not an object
    #[error("malformed metadata: {0}")]
    Malformed(String),

    /// A required key is absent
    #[error("metadata is missing required key '{0}'")]
    MissingKey(&'static str),

    /// A key has an unusable value
    #[error("metadata field '{field}' is invalid: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What was wrong
        reason: String,
    },
}

/// Parse and shape-check a sidecar
///
/// Requires the keys in `REQUIRED_KEYS`, a non-empty string `graph_id`, a
/// positive integer `version` and a non-negative integer `size_bytes`
/// before the typed decode is attempted.
pub fn parse_metadata(bytes: &[u8]) -> Result<GraphMetadata, MetadataError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| MetadataError::Malformed(e.to_string()))?;
    let fields = value
        .as_object()
        .ok_or_else(|| MetadataError::Malformed("expected a JSON object".to_string()))?;

    for key in REQUIRED_KEYS {
        if !fields.contains_key(key) {
            return Err(MetadataError::MissingKey(key));
        }
    }

    match fields["graph_id"].as_str() {
        Some(id) if !id.is_empty() => {}
        _ => {
            return Err(MetadataError::InvalidField {
                field: "graph_id",
                reason: "expected a non-empty string".to_string(),
            })
        }
    }
    match fields["version"].as_u64() {
        Some(v) if v > 0 => {}
        _ => {
            return Err(MetadataError::InvalidField {
                field: "version",
                reason: "expected a positive integer".to_string(),
            })
        }
    }
    if fields["size_bytes"].as_u64().is_none() {
        return Err(MetadataError::InvalidField {
            field: "size_bytes",
            reason: "expected a non-negative integer".to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| MetadataError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> GraphMetadata {
        let now = Utc::now();
        GraphMetadata {
            graph_id: "g1".to_string(),
            name: "Corn belt".to_string(),
            description: String::new(),
            version: 2,
            created_at: now,
            modified_at: now,
            author: "analyst".to_string(),
            tags: vec!["agriculture".to_string()],
            size_bytes: 1024,
            node_count: 3,
            relationship_count: 2,
            checksum: "ab".repeat(32),
            format: StorageFormat::JsonGz,
            compression_ratio: None,
        }
    }

    #[test]
    fn test_sidecar_roundtrip() {
        let meta = sample();
        let bytes = meta.to_json().unwrap();
        assert_eq!(parse_metadata(&bytes).unwrap(), meta);
    }

    #[test]
    fn test_sidecar_field_encoding() {
        let bytes = sample().to_json().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["format"], "json.gz");
        assert!(value.get("compression_ratio").is_none());
        let created = value["created_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[test]
    fn test_missing_required_key() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("format");
        let bytes = serde_json::to_vec(&value).unwrap();

        assert!(matches!(
            parse_metadata(&bytes),
            Err(MetadataError::MissingKey("format"))
        ));
    }

    #[test]
    fn test_invalid_shapes() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["version"] = json!(0);
        let err = parse_metadata(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidField { field: "version", .. }));

        let mut value = serde_json::to_value(sample()).unwrap();
        value["graph_id"] = json!("");
        let err = parse_metadata(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidField { field: "graph_id", .. }));

        let mut value = serde_json::to_value(sample()).unwrap();
        value["size_bytes"] = json!(-5);
        let err = parse_metadata(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidField { field: "size_bytes", .. }));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse_metadata(b"not json"),
            Err(MetadataError::Malformed(_))
        ));
        assert!(matches!(
            parse_metadata(b"[1, 2]"),
            Err(MetadataError::Malformed(_))
        ));
    }

    #[test]
    fn test_overrides_builder() {
        let overrides = MetadataOverrides::new()
            .with_author("analyst")
            .with_tags(["a", "b"]);
        assert_eq!(overrides.author.as_deref(), Some("analyst"));
        assert_eq!(overrides.tags, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(overrides.name.is_none());
    }
}
