//! Metadata store with a re-validating cache
//!
//! Current sidecars are cached per graph id. A cache hit is only trusted
//! after a cheap consistency check against the payload file: the payload
//! must exist, its size must be within max(64 B, 1%) of `size_bytes`, and
//! its mtime within 60 s of `modified_at`. Anything else evicts the entry
//! and the sidecar is re-read from disk.
//!
//! Archived sidecars are never cached.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{parse_metadata, GraphMetadata};
use crate::atomic::{copy_atomic, write_atomic};
use crate::codec::checksum;
use crate::error::{PersistenceError, PersistenceResult};
use crate::layout::{parse_archived_version, StorageLayout};

/// Minimum size drift tolerated on a cache hit
const SIZE_TOLERANCE_BYTES: u64 = 64;

/// Maximum mtime drift tolerated on a cache hit
const MTIME_TOLERANCE_SECS: i64 = 60;

/// Where a version's files live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// `graphs/` and `metadata/`
    Current,
    /// `versions/<graph_id>/`
    Archived,
}

/// Result of [`MetadataStore::archive`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Metadata (and payload, if present) copied into the version directory
    Archived,
    /// The version was already archived; nothing was touched
    AlreadyArchived,
}

/// Reads, writes and caches metadata sidecars
#[derive(Debug)]
pub struct MetadataStore {
    layout: StorageLayout,
    cache: Mutex<HashMap<String, GraphMetadata>>,
    strict_integrity: bool,
}

impl MetadataStore {
    /// Create a store over `layout`
    ///
    /// With `strict_integrity`, checksum mismatches are errors; otherwise
    /// they are logged and the data is returned anyway.
    pub fn new(layout: StorageLayout, strict_integrity: bool) -> Self {
        MetadataStore {
            layout,
            cache: Mutex::new(HashMap::new()),
            strict_integrity,
        }
    }

    /// Storage layout
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Metadata of the current version, or of `version`
    pub fn get(
        &self,
        graph_id: &str,
        version: Option<u64>,
    ) -> PersistenceResult<Option<GraphMetadata>> {
        Ok(self.resolve(graph_id, version)?.map(|(metadata, _)| metadata))
    }

    /// Like [`MetadataStore::get`], also telling which slot holds the version
    ///
    /// A request for the version that is currently live resolves to the
    /// current slot.
    pub fn resolve(
        &self,
        graph_id: &str,
        version: Option<u64>,
    ) -> PersistenceResult<Option<(GraphMetadata, Slot)>> {
        let Some(wanted) = version else {
            return Ok(self.current(graph_id)?.map(|m| (m, Slot::Current)));
        };

        let path = self.layout.archived_metadata(graph_id, wanted);
        if let Some(metadata) = self.read_sidecar(&path, graph_id, Some(wanted))? {
            let payload = self.payload_path(&metadata, Slot::Archived);
            self.verify_payload_file(&metadata, &payload)?;
            return Ok(Some((metadata, Slot::Archived)));
        }

        Ok(self
            .current(graph_id)?
            .filter(|m| m.version == wanted)
            .map(|m| (m, Slot::Current)))
    }

    /// Write the current sidecar and refresh the cache
    pub fn put(&self, metadata: &GraphMetadata) -> PersistenceResult<()> {
        let path = self.layout.current_metadata(&metadata.graph_id);
        let bytes = metadata
            .to_json()
            .map_err(|source| PersistenceError::MetadataEncode {
                graph_id: metadata.graph_id.clone(),
                source,
            })?;
        write_atomic(&path, &bytes).map_err(|e| PersistenceError::io(&path, e))?;

        self.cache
            .lock()
            .insert(metadata.graph_id.clone(), metadata.clone());
        debug!(
            target: "sfm::metadata",
            graph_id = %metadata.graph_id,
            version = metadata.version,
            "Metadata written"
        );
        Ok(())
    }

    /// Copy `metadata` and its current payload into the version directory
    ///
    /// Never overwrites an existing archived version.
    pub fn archive(&self, metadata: &GraphMetadata) -> PersistenceResult<ArchiveOutcome> {
        let graph_id = metadata.graph_id.as_str();
        let version = metadata.version;
        let dir = self.layout.version_dir(graph_id);
        fs::create_dir_all(&dir).map_err(|e| PersistenceError::io(&dir, e))?;

        let meta_path = self.layout.archived_metadata(graph_id, version);
        if meta_path.exists() {
            warn!(
                target: "sfm::metadata",
                graph_id,
                version,
                "Version already archived, leaving it untouched"
            );
            return Ok(ArchiveOutcome::AlreadyArchived);
        }

        let src = self.payload_path(metadata, Slot::Current);
        let dst = self.payload_path(metadata, Slot::Archived);
        if src.exists() {
            if !dst.exists() {
                copy_atomic(&src, &dst).map_err(|e| PersistenceError::io(&dst, e))?;
            }
        } else {
            warn!(
                target: "sfm::metadata",
                graph_id,
                version,
                path = %src.display(),
                "Current payload missing, archiving metadata only"
            );
        }

        let bytes = metadata
            .to_json()
            .map_err(|source| PersistenceError::MetadataEncode {
                graph_id: graph_id.to_string(),
                source,
            })?;
        write_atomic(&meta_path, &bytes).map_err(|e| PersistenceError::io(&meta_path, e))?;

        debug!(target: "sfm::metadata", graph_id, version, "Version archived");
        Ok(ArchiveOutcome::Archived)
    }

    /// Archived version numbers of `graph_id`, ascending
    pub fn archived_versions(&self, graph_id: &str) -> PersistenceResult<Vec<u64>> {
        let dir = self.layout.version_dir(graph_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::io(&dir, e)),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PersistenceError::io(&dir, e))?;
            if let Some(v) = parse_archived_version(&entry.file_name().to_string_lossy()) {
                versions.push(v);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// Every readable archived sidecar of `graph_id`, ascending by version
    pub fn history(&self, graph_id: &str) -> PersistenceResult<Vec<GraphMetadata>> {
        let mut history = Vec::new();
        for version in self.archived_versions(graph_id)? {
            let path = self.layout.archived_metadata(graph_id, version);
            if let Some(metadata) = self.read_sidecar(&path, graph_id, Some(version))? {
                history.push(metadata);
            }
        }
        Ok(history)
    }

    /// Payload path of `metadata` in `slot`
    pub fn payload_path(&self, metadata: &GraphMetadata, slot: Slot) -> PathBuf {
        match slot {
            Slot::Current => self
                .layout
                .current_payload(&metadata.graph_id, metadata.format),
            Slot::Archived => {
                self.layout
                    .archived_payload(&metadata.graph_id, metadata.version, metadata.format)
            }
        }
    }

    /// Compare `bytes` against the recorded checksum
    ///
    /// Returns `Ok(false)` on a mismatch in lenient mode and
    /// [`PersistenceError::ChecksumMismatch`] in strict mode. A sidecar with
    /// no checksum always passes.
    pub fn verify_checksum(&self, metadata: &GraphMetadata, bytes: &[u8]) -> PersistenceResult<bool> {
        if metadata.checksum.is_empty() {
            return Ok(true);
        }
        let actual = checksum(bytes);
        if actual == metadata.checksum {
            return Ok(true);
        }

        if self.strict_integrity {
            return Err(PersistenceError::ChecksumMismatch {
                graph_id: metadata.graph_id.clone(),
                version: metadata.version,
                expected: metadata.checksum.clone(),
                actual,
            });
        }
        warn!(
            target: "sfm::metadata",
            graph_id = %metadata.graph_id,
            version = metadata.version,
            expected = %metadata.checksum,
            actual = %actual,
            "Checksum mismatch"
        );
        Ok(false)
    }

    /// Drop the cached entry of `graph_id`
    pub fn evict(&self, graph_id: &str) {
        self.cache.lock().remove(graph_id);
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Cached entry of `graph_id`, without re-validation
    pub fn cached(&self, graph_id: &str) -> Option<GraphMetadata> {
        self.cache.lock().get(graph_id).cloned()
    }

    fn current(&self, graph_id: &str) -> PersistenceResult<Option<GraphMetadata>> {
        let hit = self.cache.lock().get(graph_id).cloned();
        if let Some(metadata) = hit {
            if self.is_consistent(&metadata) {
                return Ok(Some(metadata));
            }
            debug!(target: "sfm::metadata", graph_id, "Cached metadata is stale, re-reading");
            self.evict(graph_id);
        }

        let path = self.layout.current_metadata(graph_id);
        let Some(metadata) = self.read_sidecar(&path, graph_id, None)? else {
            return Ok(None);
        };
        let payload = self.payload_path(&metadata, Slot::Current);
        self.verify_payload_file(&metadata, &payload)?;

        self.cache
            .lock()
            .insert(graph_id.to_string(), metadata.clone());
        Ok(Some(metadata))
    }

    fn is_consistent(&self, metadata: &GraphMetadata) -> bool {
        let path = self.payload_path(metadata, Slot::Current);
        let Ok(stat) = fs::metadata(&path) else {
            return false;
        };

        let tolerance = SIZE_TOLERANCE_BYTES.max(metadata.size_bytes / 100);
        if stat.len().abs_diff(metadata.size_bytes) > tolerance {
            return false;
        }
        if let Ok(mtime) = stat.modified() {
            let mtime: DateTime<Utc> = mtime.into();
            if (mtime - metadata.modified_at).num_seconds().abs() > MTIME_TOLERANCE_SECS {
                return false;
            }
        }
        true
    }

    /// Read and shape-check one sidecar; unusable sidecars read as absent
    fn read_sidecar(
        &self,
        path: &Path,
        graph_id: &str,
        version: Option<u64>,
    ) -> PersistenceResult<Option<GraphMetadata>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::io(path, e)),
        };

        let metadata = match parse_metadata(&bytes) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    target: "sfm::metadata",
                    graph_id,
                    path = %path.display(),
                    error = %e,
                    "Ignoring invalid metadata"
                );
                return Ok(None);
            }
        };

        if metadata.graph_id != graph_id || version.is_some_and(|v| v != metadata.version) {
            warn!(
                target: "sfm::metadata",
                graph_id,
                found_graph_id = %metadata.graph_id,
                found_version = metadata.version,
                path = %path.display(),
                "Ignoring metadata that describes a different graph or version"
            );
            return Ok(None);
        }
        Ok(Some(metadata))
    }

    fn verify_payload_file(&self, metadata: &GraphMetadata, path: &Path) -> PersistenceResult<()> {
        match fs::read(path) {
            Ok(bytes) => self.verify_checksum(metadata, &bytes).map(|_| ()),
            // A missing payload is reported by whoever needs the bytes.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::StorageFormat;
    use tempfile::{tempdir, TempDir};

    fn setup(strict: bool) -> (TempDir, MetadataStore) {
        let dir = tempdir().unwrap();
        let layout = StorageLayout::from_root(dir.path());
        layout.create_directories().unwrap();
        (dir, MetadataStore::new(layout, strict))
    }

    fn write_version(store: &MetadataStore, graph_id: &str, version: u64, payload: &[u8]) -> GraphMetadata {
        let now = Utc::now();
        let metadata = GraphMetadata {
            graph_id: graph_id.to_string(),
            name: graph_id.to_string(),
            description: String::new(),
            version,
            created_at: now,
            modified_at: now,
            author: String::new(),
            tags: Vec::new(),
            size_bytes: payload.len() as u64,
            node_count: 0,
            relationship_count: 0,
            checksum: checksum(payload),
            format: StorageFormat::Json,
            compression_ratio: None,
        };
        let path = store.layout().current_payload(graph_id, StorageFormat::Json);
        fs::write(path, payload).unwrap();
        store.put(&metadata).unwrap();
        metadata
    }

    #[test]
    fn test_put_then_get() {
        let (_dir, store) = setup(true);
        let written = write_version(&store, "g1", 1, b"{}");

        assert_eq!(store.get("g1", None).unwrap(), Some(written.clone()));
        assert_eq!(store.cached("g1"), Some(written));
        assert!(store.get("missing", None).unwrap().is_none());
    }

    #[test]
    fn test_get_survives_cache_clear() {
        let (_dir, store) = setup(true);
        let written = write_version(&store, "g1", 1, b"{}");

        store.clear();
        assert!(store.cached("g1").is_none());
        assert_eq!(store.get("g1", None).unwrap(), Some(written));
        assert!(store.cached("g1").is_some());
    }

    #[test]
    fn test_stale_cache_entry_is_evicted() {
        let (_dir, store) = setup(false);
        write_version(&store, "g1", 1, b"{}");

        // Another writer replaces payload and sidecar behind the store's back.
        let payload = vec![b' '; 500];
        let mut changed = store.get("g1", None).unwrap().unwrap();
        changed.size_bytes = payload.len() as u64;
        changed.checksum = checksum(&payload);
        changed.name = "renamed".to_string();
        fs::write(
            store.layout().current_payload("g1", StorageFormat::Json),
            &payload,
        )
        .unwrap();
        fs::write(
            store.layout().current_metadata("g1"),
            changed.to_json().unwrap(),
        )
        .unwrap();

        let reread = store.get("g1", None).unwrap().unwrap();
        assert_eq!(reread.name, "renamed");
        assert_eq!(store.cached("g1").unwrap().name, "renamed");
    }

    #[test]
    fn test_checksum_mismatch_strict_vs_lenient() {
        let (_dir, strict) = setup(true);
        write_version(&strict, "g1", 1, b"{\"a\": 1}");
        fs::write(
            strict.layout().current_payload("g1", StorageFormat::Json),
            b"{\"a\": 2}",
        )
        .unwrap();
        strict.clear();
        assert!(matches!(
            strict.get("g1", None),
            Err(PersistenceError::ChecksumMismatch { version: 1, .. })
        ));

        let (_dir, lenient) = setup(false);
        write_version(&lenient, "g1", 1, b"{\"a\": 1}");
        fs::write(
            lenient.layout().current_payload("g1", StorageFormat::Json),
            b"{\"a\": 2}",
        )
        .unwrap();
        lenient.clear();
        assert!(lenient.get("g1", None).unwrap().is_some());
    }

    #[test]
    fn test_malformed_sidecar_reads_as_absent() {
        let (_dir, store) = setup(true);
        fs::write(store.layout().current_metadata("g1"), b"{ not json").unwrap();
        assert!(store.get("g1", None).unwrap().is_none());
    }

    #[test]
    fn test_sidecar_for_other_graph_is_ignored() {
        let (_dir, store) = setup(true);
        write_version(&store, "g1", 1, b"{}");
        fs::copy(
            store.layout().current_metadata("g1"),
            store.layout().current_metadata("g2"),
        )
        .unwrap();

        assert!(store.get("g2", None).unwrap().is_none());
    }

    #[test]
    fn test_archive_and_history() {
        let (_dir, store) = setup(true);
        let v1 = write_version(&store, "g1", 1, b"{\"v\": 1}");

        assert_eq!(store.archive(&v1).unwrap(), ArchiveOutcome::Archived);
        assert_eq!(store.archive(&v1).unwrap(), ArchiveOutcome::AlreadyArchived);
        assert_eq!(
            fs::read(store.layout().archived_payload("g1", 1, StorageFormat::Json)).unwrap(),
            b"{\"v\": 1}"
        );

        let v2 = write_version(&store, "g1", 2, b"{\"v\": 2}");
        store.archive(&v2).unwrap();
        write_version(&store, "g1", 3, b"{\"v\": 3}");

        assert_eq!(store.archived_versions("g1").unwrap(), vec![1, 2]);
        let history: Vec<u64> = store.history("g1").unwrap().iter().map(|m| m.version).collect();
        assert_eq!(history, vec![1, 2]);
    }

    #[test]
    fn test_resolve_slots() {
        let (_dir, store) = setup(true);
        let v1 = write_version(&store, "g1", 1, b"{\"v\": 1}");
        store.archive(&v1).unwrap();
        write_version(&store, "g1", 2, b"{\"v\": 2}");

        let (m, slot) = store.resolve("g1", Some(1)).unwrap().unwrap();
        assert_eq!((m.version, slot), (1, Slot::Archived));
        let (m, slot) = store.resolve("g1", Some(2)).unwrap().unwrap();
        assert_eq!((m.version, slot), (2, Slot::Current));
        assert!(store.resolve("g1", Some(9)).unwrap().is_none());
    }

    #[test]
    fn test_history_of_unknown_graph_is_empty() {
        let (_dir, store) = setup(true);
        assert!(store.history("nope").unwrap().is_empty());
    }
}
