//! Error types surfaced by the persistence layer
//!
//! Callers see two kinds of failure:
//! - [`SerializationError`]: turning a graph into bytes or bytes into a graph
//! - [`PersistenceError`]: everything else the manager does (lookups,
//!   validation, filesystem access, restores)
//!
//! Component errors ([`IntegrityError`], [`ConfigError`], [`LayoutError`],
//! [`CodecError`]) nest inside these two so the original cause stays
//! reachable through `source()`.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::integrity::IntegrityError;
use crate::layout::LayoutError;

/// Failure while encoding or decoding a graph payload
#[derive(Debug, Error)]
pub enum SerializationError {
    /// JSON encode/decode failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MessagePack encode failed
    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MessagePack decode failed
    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Compression or decompression failed
    #[error("Compression error: {0}")]
    Codec(#[from] CodecError),

    /// A required key is absent from the document
    #[error("Missing required key '{key}' in {context}")]
    MissingKey {
        /// Missing key
        key: String,
        /// Where the key was expected (e.g. "graph", "actors/<id>")
        context: String,
    },

    /// A field is present but has the wrong shape
    #[error("Invalid field '{field}' in {context}: {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// Where the field was read
        context: String,
        /// What was wrong with it
        reason: String,
    },

    /// A record carries a type tag no decoder knows
    #[error("Unknown record type '{tag}' in {context}")]
    UnknownRecordType {
        /// Offending tag
        tag: String,
        /// Where the record was read
        context: String,
    },

    /// A controlled-vocabulary value did not resolve
    #[error("{context}: {source}")]
    Vocabulary {
        /// Where the value was read
        context: String,
        /// Underlying resolution failure
        #[source]
        source: sfm_core::Error,
    },

    /// The document was written by an incompatible serializer version
    #[error("Unsupported serialization version '{0}'")]
    UnsupportedVersion(String),

    /// A format tag did not match any supported format
    #[error("Unsupported storage format: '{0}'")]
    UnknownFormat(String),
}

/// Result type for codec operations
pub type SerializationResult<T> = Result<T, SerializationError>;

/// Failure in a persistence manager operation
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Encoding or decoding the payload of a graph failed
    #[error("Serialization failed for graph '{graph_id}': {source}")]
    Serialization {
        /// Graph being saved or loaded
        graph_id: String,
        /// Underlying codec failure
        #[source]
        source: SerializationError,
    },

    /// The graph failed structural or referential validation
    #[error("Graph '{graph_id}' failed validation: {source}")]
    Validation {
        /// Graph being validated
        graph_id: String,
        /// Violated rule
        #[source]
        source: IntegrityError,
    },

    /// No current metadata exists for the graph
    #[error("Graph '{0}' not found")]
    GraphNotFound(String),

    /// Metadata exists but its payload file does not
    #[error("Payload for graph '{graph_id}' version {version} is missing at {path}")]
    PayloadMissing {
        /// Graph id
        graph_id: String,
        /// Version whose payload is missing
        version: u64,
        /// Expected payload location
        path: PathBuf,
    },

    /// Backup file does not exist
    #[error("Backup not found: {0}")]
    BackupNotFound(PathBuf),

    /// Backups are disabled in the configuration
    #[error("Backups are disabled in the persistence configuration")]
    BackupsDisabled,

    /// Stored checksum does not match the payload (strict integrity only)
    #[error("Checksum mismatch for graph '{graph_id}' version {version}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Graph id
        graph_id: String,
        /// Version checked
        version: u64,
        /// Checksum recorded in metadata
        expected: String,
        /// Checksum of the bytes on disk
        actual: String,
    },

    /// Metadata sidecar could not be encoded
    #[error("Failed to encode metadata for graph '{graph_id}': {source}")]
    MetadataEncode {
        /// Graph id
        graph_id: String,
        /// Underlying JSON failure
        #[source]
        source: serde_json::Error,
    },

    /// Restoring from a backup failed
    #[error("Restore from {path} failed: {reason}")]
    Restore {
        /// Backup file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Graph id or backup name is not a valid path component
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] LayoutError),

    /// Configuration rejected at manager construction
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An argument is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl PersistenceError {
    /// Create an I/O error tagged with the path involved
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap a codec failure for `graph_id`
    pub fn serialization(graph_id: impl Into<String>, source: SerializationError) -> Self {
        Self::Serialization {
            graph_id: graph_id.into(),
            source,
        }
    }

    /// Wrap a validation failure for `graph_id`
    pub fn validation(graph_id: impl Into<String>, source: IntegrityError) -> Self {
        Self::Validation {
            graph_id: graph_id.into(),
            source,
        }
    }

    /// Create a restore error
    pub fn restore(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Restore {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// True for the "does not exist" family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GraphNotFound(_) | Self::PayloadMissing { .. } | Self::BackupNotFound(_)
        )
    }
}

/// Result type for persistence manager operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = PersistenceError::GraphNotFound("g1".to_string());
        assert!(err.to_string().contains("g1"));

        let err = PersistenceError::ChecksumMismatch {
            graph_id: "g1".to_string(),
            version: 3,
            expected: "abc".to_string(),
            actual: "def".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("g1"));
        assert!(msg.contains('3'));
        assert!(msg.contains("abc"));
        assert!(msg.contains("def"));
    }

    #[test]
    fn test_serialization_error_keeps_cause_chain() {
        let inner = SerializationError::MissingKey {
            key: "relationships".to_string(),
            context: "graph".to_string(),
        };
        let err = PersistenceError::serialization("g1", inner);

        assert!(err.to_string().contains("g1"));
        let source = err.source().expect("cause preserved");
        assert!(source.to_string().contains("relationships"));
    }

    #[test]
    fn test_io_error_constructor() {
        let err = PersistenceError::io(
            "/tmp/x",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, PersistenceError::Io { .. }));
        assert!(err.to_string().contains("/tmp/x"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_is_not_found() {
        assert!(PersistenceError::GraphNotFound("g".into()).is_not_found());
        assert!(PersistenceError::BackupNotFound(PathBuf::from("b")).is_not_found());
        assert!(!PersistenceError::BackupsDisabled.is_not_found());
    }
}
