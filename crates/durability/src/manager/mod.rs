//! Persistence manager
//!
//! The public entry point for storing graphs. A manager owns one storage
//! root and exposes:
//!
//! - `save` / `load` / `delete` of graphs, with automatic versioning
//! - metadata queries (`metadata`, `version_history`, `list_graphs`)
//! - backups (`create_backup`, `restore_from_backup`, `cleanup_old_backups`)
//! - maintenance (`cleanup_old_versions`, `check_version_consistency`,
//!   `storage_statistics`)
//!
//! # Save protocol
//!
//! 1. Validate the graph (if configured) and encode it; nothing is written
//!    if either fails.
//! 2. Archive the outgoing version (payload copy, then sidecar).
//! 3. Write the new payload (temp file + rename).
//! 4. Write the new sidecar (temp file + rename).
//! 5. Remove any current payload left over in another format.
//!
//! A sidecar is never written before the payload it describes, so a crash
//! leaves the previous version fully readable.
//!
//! # Concurrency
//!
//! With `thread_safe` set, every public operation runs under one re-entrant
//! lock, so operations from different threads are serialized and an
//! operation may call another (statistics calls listing). Separate managers
//! over the same root are not coordinated.

mod backup;
mod maintenance;
mod reports;

pub use reports::{
    BackupCleanupReport, BackupStatistics, CleanupReport, ConsistencyReport, StorageStatistics,
};

use chrono::Utc;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use sfm_core::Graph;

use crate::atomic::{cleanup_temp_files, remove_file_if_exists, write_atomic};
use crate::codec;
use crate::config::PersistenceConfig;
use crate::error::{PersistenceError, PersistenceResult};
use crate::format::StorageFormat;
use crate::integrity::IntegrityValidator;
use crate::layout::{graph_id_from_metadata_file, validate_graph_id, StorageLayout};
use crate::metadata::{ArchiveOutcome, GraphMetadata, MetadataOverrides, MetadataStore};

/// Per-call options for [`PersistenceManager::save_with`]
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Format to write; `None` uses the configured default
    pub format: Option<StorageFormat>,
    /// Metadata fields to record
    pub metadata: MetadataOverrides,
}

impl SaveOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Write in `format`
    pub fn with_format(mut self, format: StorageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Record `metadata`
    pub fn with_metadata(mut self, metadata: MetadataOverrides) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Versioned, checksummed graph store rooted at one directory
#[derive(Debug)]
pub struct PersistenceManager {
    config: PersistenceConfig,
    layout: StorageLayout,
    metadata: MetadataStore,
    validator: IntegrityValidator,
    op_lock: Option<ReentrantMutex<()>>,
}

impl PersistenceManager {
    /// Open a manager with `config`
    ///
    /// Creates the directory tree when `auto_create_directories` is set and
    /// removes temporaries left behind by interrupted writes.
    pub fn new(config: PersistenceConfig) -> PersistenceResult<Self> {
        config.validate()?;
        let layout = StorageLayout::from_root(&config.base_path);

        if config.auto_create_directories {
            layout
                .create_directories()
                .map_err(|e| PersistenceError::io(layout.root(), e))?;
        }
        let mut sweep = vec![
            layout.graphs_dir(),
            layout.metadata_dir(),
            layout.backups_dir(),
        ];
        sweep.extend(version_dirs(&layout.versions_dir())?);
        for dir in sweep {
            let removed = cleanup_temp_files(&dir).map_err(|e| PersistenceError::io(&dir, e))?;
            if removed > 0 {
                warn!(
                    target: "sfm::persistence",
                    dir = %dir.display(),
                    removed,
                    "Removed temporary files from interrupted writes"
                );
            }
        }

        info!(
            target: "sfm::persistence",
            root = %layout.root().display(),
            default_format = %config.effective_format(None),
            versioning = ?config.versioning_strategy,
            "Persistence manager opened"
        );

        Ok(PersistenceManager {
            metadata: MetadataStore::new(layout.clone(), config.strict_integrity),
            validator: IntegrityValidator::default(),
            op_lock: config.thread_safe.then(|| ReentrantMutex::new(())),
            layout,
            config,
        })
    }

    /// Open a manager over `base_path` with default settings
    pub fn open(base_path: impl AsRef<Path>) -> PersistenceResult<Self> {
        Self::new(PersistenceConfig::new(base_path))
    }

    /// Active configuration
    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    /// Storage layout
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Metadata store
    pub fn metadata_store(&self) -> &MetadataStore {
        &self.metadata
    }

    fn serialize_op(&self) -> Option<ReentrantMutexGuard<'_, ()>> {
        self.op_lock.as_ref().map(|lock| lock.lock())
    }

    /// Save `graph` as the next version of `graph_id` with default options
    pub fn save(&self, graph_id: &str, graph: &Graph) -> PersistenceResult<GraphMetadata> {
        self.save_with(graph_id, graph, &SaveOptions::default())
    }

    /// Save `graph` as the next version of `graph_id`
    ///
    /// Returns the metadata of the new version. On error, the previously
    /// current version is still current.
    pub fn save_with(
        &self,
        graph_id: &str,
        graph: &Graph,
        options: &SaveOptions,
    ) -> PersistenceResult<GraphMetadata> {
        let _op = self.serialize_op();
        validate_graph_id(graph_id)?;
        let format = self.config.effective_format(options.format);

        if self.config.validate_on_save {
            self.validator
                .validate(graph)
                .map_err(|e| PersistenceError::validation(graph_id, e))?;
        }
        let payload = codec::encode_payload(graph, format)
            .map_err(|e| PersistenceError::serialization(graph_id, e))?;

        let previous = self.metadata.get(graph_id, None)?;
        let last_archived = self.metadata.archived_versions(graph_id)?.last().copied();
        let current = previous.as_ref().map(|m| m.version);
        if last_archived > current {
            warn!(
                target: "sfm::persistence",
                graph_id,
                current = ?current,
                last_archived = ?last_archived,
                "Archived history is ahead of current metadata, numbering past it"
            );
        }
        let version = current.max(last_archived).map_or(1, |v| v + 1);

        if let Some(prev) = previous.as_ref() {
            if self.config.archives_version(prev.version)
                && self.metadata.archive(prev)? == ArchiveOutcome::Archived
            {
                debug!(
                    target: "sfm::persistence",
                    graph_id,
                    version = prev.version,
                    "Archived previous version"
                );
            }
        }

        let payload_path = self.layout.current_payload(graph_id, format);
        write_atomic(&payload_path, &payload.bytes)
            .map_err(|e| PersistenceError::io(&payload_path, e))?;

        let now = Utc::now();
        let overrides = &options.metadata;
        let metadata = GraphMetadata {
            graph_id: graph_id.to_string(),
            name: overrides.name.clone().unwrap_or_else(|| {
                if graph.name.is_empty() {
                    graph_id.to_string()
                } else {
                    graph.name.clone()
                }
            }),
            description: overrides
                .description
                .clone()
                .unwrap_or_else(|| graph.description.clone()),
            version,
            created_at: previous.as_ref().map_or(now, |m| m.created_at),
            modified_at: now,
            author: overrides.author.clone().unwrap_or_default(),
            tags: overrides.tags.clone().unwrap_or_default(),
            size_bytes: payload.bytes.len() as u64,
            node_count: graph.node_count() as u64,
            relationship_count: graph.relationship_count() as u64,
            checksum: codec::checksum(&payload.bytes),
            format,
            compression_ratio: payload.compression_ratio(format),
        };
        self.metadata.put(&metadata)?;

        if let Some(prev) = previous.as_ref().filter(|m| m.format != format) {
            self.remove_current_payloads(graph_id, Some(format))?;
            debug!(
                target: "sfm::persistence",
                graph_id,
                from = %prev.format,
                to = %format,
                "Format changed, removed stale payload"
            );
        }

        if let Some(keep) = self.config.rolling_limit() {
            self.prune_versions(graph_id, keep)?;
        }

        info!(
            target: "sfm::persistence",
            graph_id,
            version,
            format = %format,
            size_bytes = metadata.size_bytes,
            nodes = metadata.node_count,
            relationships = metadata.relationship_count,
            "Graph saved"
        );
        Ok(metadata)
    }

    /// Load the current version of `graph_id`, or `version`
    ///
    /// Returns `Ok(None)` when no such version exists or its payload file is
    /// missing.
    pub fn load(&self, graph_id: &str, version: Option<u64>) -> PersistenceResult<Option<Graph>> {
        let _op = self.serialize_op();
        validate_graph_id(graph_id)?;

        let Some((metadata, slot)) = self.metadata.resolve(graph_id, version)? else {
            warn!(target: "sfm::persistence", graph_id, ?version, "Graph not found");
            return Ok(None);
        };

        let path = self.metadata.payload_path(&metadata, slot);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!(
                    target: "sfm::persistence",
                    graph_id,
                    version = metadata.version,
                    path = %path.display(),
                    "Payload file missing"
                );
                return Ok(None);
            }
            Err(e) => return Err(PersistenceError::io(&path, e)),
        };

        self.metadata.verify_checksum(&metadata, &bytes)?;
        let graph = codec::decode(&bytes, metadata.format)
            .map_err(|e| PersistenceError::serialization(graph_id, e))?;

        if self.config.validate_on_load {
            self.validator
                .validate(&graph)
                .map_err(|e| PersistenceError::validation(graph_id, e))?;
        }

        info!(
            target: "sfm::persistence",
            graph_id,
            version = metadata.version,
            nodes = graph.node_count(),
            relationships = graph.relationship_count(),
            "Graph loaded"
        );
        Ok(Some(graph))
    }

    /// Delete `graph_id`, and its archived versions if `include_versions`
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn delete(&self, graph_id: &str, include_versions: bool) -> PersistenceResult<bool> {
        let _op = self.serialize_op();
        validate_graph_id(graph_id)?;

        let mut removed = self.remove_current_payloads(graph_id, None)? > 0;
        let meta_path = self.layout.current_metadata(graph_id);
        removed |= remove_file_if_exists(&meta_path)
            .map_err(|e| PersistenceError::io(&meta_path, e))?
            .is_some();

        if include_versions {
            let dir = self.layout.version_dir(graph_id);
            match fs::remove_dir_all(&dir) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(PersistenceError::io(&dir, e)),
            }
        }
        self.metadata.evict(graph_id);

        if removed {
            info!(target: "sfm::persistence", graph_id, include_versions, "Graph deleted");
        } else {
            debug!(target: "sfm::persistence", graph_id, "Nothing to delete");
        }
        Ok(removed)
    }

    /// Ids of all stored graphs, sorted
    pub fn list_graph_ids(&self) -> PersistenceResult<Vec<String>> {
        let _op = self.serialize_op();
        let dir = self.layout.metadata_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::io(&dir, e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PersistenceError::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(id) = graph_id_from_metadata_file(&name) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Current metadata of every stored graph, sorted by id
    ///
    /// Graphs whose metadata cannot be read are skipped with a warning.
    pub fn list_graphs(&self) -> PersistenceResult<Vec<GraphMetadata>> {
        let _op = self.serialize_op();
        let mut graphs = Vec::new();
        for graph_id in self.list_graph_ids()? {
            match self.metadata.get(&graph_id, None) {
                Ok(Some(metadata)) => graphs.push(metadata),
                Ok(None) => {}
                Err(e) => warn!(
                    target: "sfm::persistence",
                    graph_id = %graph_id,
                    error = %e,
                    "Skipping graph with unreadable metadata"
                ),
            }
        }
        Ok(graphs)
    }

    /// Current metadata of `graph_id`
    pub fn metadata(&self, graph_id: &str) -> PersistenceResult<Option<GraphMetadata>> {
        let _op = self.serialize_op();
        validate_graph_id(graph_id)?;
        self.metadata.get(graph_id, None)
    }

    /// Archived versions of `graph_id`, oldest first
    pub fn version_history(&self, graph_id: &str) -> PersistenceResult<Vec<GraphMetadata>> {
        let _op = self.serialize_op();
        validate_graph_id(graph_id)?;
        self.metadata.history(graph_id)
    }

    /// True if `graph_id` has current metadata
    pub fn exists(&self, graph_id: &str) -> PersistenceResult<bool> {
        Ok(self.metadata(graph_id)?.is_some())
    }

    /// Remove current payloads of `graph_id` in every format except `keep`
    fn remove_current_payloads(
        &self,
        graph_id: &str,
        keep: Option<StorageFormat>,
    ) -> PersistenceResult<usize> {
        let mut removed = 0;
        for format in StorageFormat::ALL {
            if Some(format) == keep {
                continue;
            }
            let path = self.layout.current_payload(graph_id, format);
            if remove_file_if_exists(&path)
                .map_err(|e| PersistenceError::io(&path, e))?
                .is_some()
            {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// Per-graph directories under `versions/`.
fn version_dirs(versions_dir: &Path) -> PersistenceResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(versions_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PersistenceError::io(versions_dir, e)),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PersistenceError::io(versions_dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SerializationError;
    use sfm_core::{Actor, Node, NodeId, NodeKind, Relationship, RelationshipKind};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, PersistenceManager) {
        let dir = tempdir().unwrap();
        let manager = PersistenceManager::new(PersistenceConfig::for_testing(dir.path())).unwrap();
        (dir, manager)
    }

    fn small_graph(name: &str) -> Graph {
        let mut graph = Graph::new(name);
        let a = graph
            .add_node(Node::new("A", NodeKind::Actor(Actor::default())))
            .unwrap();
        let b = graph
            .add_node(Node::new("B", NodeKind::Actor(Actor::default())))
            .unwrap();
        graph.add_relationship(Relationship::new(a, b, RelationshipKind::SellsTo));
        graph
    }

    #[test]
    fn test_new_creates_directories() {
        let (_dir, manager) = setup();
        assert!(manager.layout().graphs_dir().is_dir());
        assert!(manager.layout().metadata_dir().is_dir());
        assert!(manager.layout().versions_dir().is_dir());
        assert!(manager.layout().backups_dir().is_dir());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let config = PersistenceConfig::for_testing(dir.path()).with_max_versions(0);
        assert!(matches!(
            PersistenceManager::new(config),
            Err(PersistenceError::Config(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, manager) = setup();
        let graph = small_graph("demo");

        let metadata = manager.save("g1", &graph).unwrap();
        assert_eq!(metadata.version, 1);
        assert_eq!(metadata.node_count, 2);
        assert_eq!(metadata.relationship_count, 1);
        assert_eq!(metadata.name, "demo");
        assert_eq!(metadata.format, StorageFormat::Json);

        let loaded = manager.load("g1", None).unwrap().unwrap();
        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_created_at_inherited_across_versions() {
        let (_dir, manager) = setup();
        let first = manager.save("g1", &small_graph("demo")).unwrap();
        let second = manager.save("g1", &small_graph("demo")).unwrap();

        assert_eq!(second.version, 2);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.modified_at >= first.modified_at);
    }

    #[test]
    fn test_save_with_overrides() {
        let (_dir, manager) = setup();
        let options = SaveOptions::new()
            .with_format(StorageFormat::MsgPackGz)
            .with_metadata(
                MetadataOverrides::new()
                    .with_name("Renamed")
                    .with_author("analyst")
                    .with_tags(["draft"]),
            );

        let metadata = manager.save_with("g1", &small_graph("demo"), &options).unwrap();
        assert_eq!(metadata.name, "Renamed");
        assert_eq!(metadata.author, "analyst");
        assert_eq!(metadata.tags, vec!["draft".to_string()]);
        assert_eq!(metadata.format, StorageFormat::MsgPackGz);
        assert!(metadata.compression_ratio.is_some());
    }

    #[test]
    fn test_invalid_graph_id_rejected() {
        let (_dir, manager) = setup();
        let graph = small_graph("demo");
        assert!(matches!(
            manager.save("../escape", &graph),
            Err(PersistenceError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            manager.load("", None),
            Err(PersistenceError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_dangling_relationship_rejected_without_writing() {
        let (_dir, manager) = setup();
        let mut graph = small_graph("demo");
        let a = *graph.actors.keys().next().unwrap();
        graph.add_relationship(Relationship::new(a, NodeId::new(), RelationshipKind::Funds));

        assert!(matches!(
            manager.save("g1", &graph),
            Err(PersistenceError::Validation { .. })
        ));
        assert!(manager.list_graph_ids().unwrap().is_empty());
        assert!(!manager
            .layout()
            .current_payload("g1", StorageFormat::Json)
            .exists());
    }

    #[test]
    fn test_load_missing_graph_is_none() {
        let (_dir, manager) = setup();
        assert!(manager.load("nope", None).unwrap().is_none());
        assert!(manager.load("nope", Some(3)).unwrap().is_none());
    }

    #[test]
    fn test_load_missing_payload_is_none() {
        let (_dir, manager) = setup();
        manager.save("g1", &small_graph("demo")).unwrap();
        fs::remove_file(manager.layout().current_payload("g1", StorageFormat::Json)).unwrap();

        assert!(manager.load("g1", None).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_payload_fails_to_decode() {
        let dir = tempdir().unwrap();
        let config = PersistenceConfig::for_testing(dir.path()).with_strict_integrity(false);
        let manager = PersistenceManager::new(config).unwrap();
        manager.save("g1", &small_graph("demo")).unwrap();
        fs::write(
            manager.layout().current_payload("g1", StorageFormat::Json),
            b"{\"name\": \"truncated\"}",
        )
        .unwrap();

        match manager.load("g1", None) {
            Err(PersistenceError::Serialization { graph_id, source }) => {
                assert_eq!(graph_id, "g1");
                assert!(matches!(source, SerializationError::MissingKey { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_format_change_removes_stale_payload() {
        let (_dir, manager) = setup();
        let graph = small_graph("demo");
        manager.save("g1", &graph).unwrap();
        manager
            .save_with("g1", &graph, &SaveOptions::new().with_format(StorageFormat::MsgPack))
            .unwrap();

        let layout = manager.layout();
        assert!(!layout.current_payload("g1", StorageFormat::Json).exists());
        assert!(layout.current_payload("g1", StorageFormat::MsgPack).exists());
        assert!(layout.archived_payload("g1", 1, StorageFormat::Json).exists());
        assert_eq!(manager.load("g1", Some(1)).unwrap().unwrap(), graph);
        assert_eq!(manager.load("g1", None).unwrap().unwrap(), graph);
    }

    #[test]
    fn test_delete() {
        let (_dir, manager) = setup();
        manager.save("g1", &small_graph("demo")).unwrap();
        manager.save("g1", &small_graph("demo")).unwrap();

        assert!(manager.delete("g1", true).unwrap());
        assert!(!manager.exists("g1").unwrap());
        assert!(manager.load("g1", None).unwrap().is_none());
        assert!(!manager.layout().version_dir("g1").exists());
        assert!(!manager.delete("g1", true).unwrap());
    }

    #[test]
    fn test_delete_keeps_versions_when_asked() {
        let (_dir, manager) = setup();
        let first = small_graph("demo");
        manager.save("g1", &first).unwrap();
        manager.save("g1", &small_graph("demo")).unwrap();

        assert!(manager.delete("g1", false).unwrap());
        assert!(manager
            .layout()
            .archived_metadata("g1", 1)
            .exists());

        // numbering continues past the kept history
        assert_eq!(manager.save("g1", &small_graph("again")).unwrap().version, 3);
        assert_eq!(manager.load("g1", Some(1)).unwrap().unwrap(), first);
    }

    #[test]
    fn test_corrupt_sidecar_does_not_reuse_archived_versions() {
        let dir = tempdir().unwrap();
        let config = PersistenceConfig::for_testing(dir.path());
        let first = small_graph("first");
        {
            let manager = PersistenceManager::new(config.clone()).unwrap();
            manager.save("g1", &first).unwrap();
            manager.save("g1", &small_graph("second")).unwrap();
            manager.save("g1", &small_graph("third")).unwrap();
            fs::write(manager.layout().current_metadata("g1"), b"{ truncated").unwrap();
        }

        let manager = PersistenceManager::new(config).unwrap();
        let fourth = small_graph("fourth");
        assert_eq!(manager.save("g1", &fourth).unwrap().version, 4);
        assert_eq!(manager.load("g1", Some(1)).unwrap().unwrap(), first);
        assert_eq!(manager.load("g1", None).unwrap().unwrap(), fourth);

        assert_eq!(manager.save("g1", &small_graph("fifth")).unwrap().version, 5);
        assert_eq!(manager.load("g1", Some(4)).unwrap().unwrap(), fourth);
        let versions: Vec<u64> = manager
            .version_history("g1")
            .unwrap()
            .iter()
            .map(|m| m.version)
            .collect();
        assert_eq!(versions, vec![1, 2, 4]);
    }

    #[test]
    fn test_new_sweeps_temporaries_in_version_dirs() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join("versions").join("g1").join(".v000001.json.tmp");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"partial").unwrap();
        let kept = stale.with_file_name("v000001.json");
        fs::write(&kept, b"{}").unwrap();

        PersistenceManager::new(PersistenceConfig::for_testing(dir.path())).unwrap();

        assert!(!stale.exists());
        assert!(kept.exists());
    }

    #[test]
    fn test_list_graphs_sorted() {
        let (_dir, manager) = setup();
        for id in ["b", "a", "c"] {
            manager.save(id, &small_graph(id)).unwrap();
        }
        fs::write(manager.layout().metadata_dir().join(".a.json.tmp"), b"junk").unwrap();

        assert_eq!(manager.list_graph_ids().unwrap(), vec!["a", "b", "c"]);
        let names: Vec<String> = manager
            .list_graphs()
            .unwrap()
            .into_iter()
            .map(|m| m.graph_id)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_open_removes_leftover_temporaries() {
        let dir = tempdir().unwrap();
        let layout = StorageLayout::from_root(dir.path());
        layout.create_directories().unwrap();
        let stray = layout.graphs_dir().join(".g1.json.tmp");
        fs::write(&stray, b"partial").unwrap();

        PersistenceManager::new(PersistenceConfig::for_testing(dir.path())).unwrap();
        assert!(!stray.exists());
    }
}
