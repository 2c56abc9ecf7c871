//! Persistence layer for SFM graphs
//!
//! This crate handles everything that touches disk:
//!
//! - Payload formats: JSON or MessagePack, optionally gzip-compressed
//! - Graph codec and SHA-256 payload checksums
//! - Storage layout: current payloads, metadata sidecars, archived versions, backups
//! - Metadata store with a validated in-memory cache
//! - Structural integrity validation on save and load
//! - Persistence manager: versioned save/load, backups, cleanup, diagnostics
//! - One-shot convenience functions

#![warn(missing_docs)]
#![warn(clippy::all)]

mod atomic;

pub mod codec; // Graph <-> payload bytes, compression codecs, checksums
pub mod config; // PersistenceConfig, versioning strategies, TOML loading
pub mod error; // SerializationError, PersistenceError
pub mod format; // StorageFormat tags and extensions
pub mod integrity; // Graph integrity validation
pub mod layout; // Directory structure and file naming
pub mod manager; // PersistenceManager
pub mod metadata; // GraphMetadata and the metadata store
pub mod quick; // save_graph / load_graph / list_graphs

pub use codec::{checksum, decode, encode, StorageCodec};
pub use config::{ConfigError, PersistenceConfig, VersioningStrategy};
pub use error::{PersistenceError, PersistenceResult, SerializationError, SerializationResult};
pub use format::StorageFormat;
pub use integrity::{validate_graph, IntegrityError, IntegrityReport, IntegrityValidator};
pub use layout::{validate_graph_id, LayoutError, StorageLayout};
pub use manager::{
    BackupCleanupReport, BackupStatistics, CleanupReport, ConsistencyReport, PersistenceManager,
    SaveOptions, StorageStatistics,
};
pub use metadata::{GraphMetadata, MetadataOverrides, MetadataStore};
pub use quick::{list_graphs, load_graph, save_graph, DEFAULT_STORAGE_PATH};
