//! Backups
//!
//! A backup is a verbatim copy of a graph's current payload bytes at
//! `backups/<name>.backup`. Backups carry no metadata of their own; a
//! restore decodes the bytes with the configured default format and
//! rebuilds metadata from the decoded graph.

use chrono::Utc;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use super::reports::{BackupCleanupReport, BackupStatistics};
use super::PersistenceManager;
use crate::atomic::{copy_atomic, remove_file_if_exists, write_atomic};
use crate::codec;
use crate::error::{PersistenceError, PersistenceResult};
use crate::layout::{backup_name, validate_graph_id};
use crate::metadata::GraphMetadata;

/// Length of the `_YYYYmmdd_HHMMSS` suffix of default backup names
const TIMESTAMP_SUFFIX_LEN: usize = 16;

/// Bytes read when probing whether a backup is readable
const HEADER_LEN: usize = 16;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

impl PersistenceManager {
    /// Copy the current payload of `graph_id` into the backup directory
    ///
    /// `name` defaults to `<graph_id>_<YYYYmmdd_HHMMSS>`. An existing backup
    /// with the same name is replaced. Returns the backup path.
    pub fn create_backup(&self, graph_id: &str, name: Option<&str>) -> PersistenceResult<PathBuf> {
        let _op = self.serialize_op();
        if !self.config.enable_backup {
            return Err(PersistenceError::BackupsDisabled);
        }
        validate_graph_id(graph_id)?;
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("{}_{}", graph_id, Utc::now().format("%Y%m%d_%H%M%S")),
        };
        validate_graph_id(&name)?;

        let metadata = self
            .metadata
            .get(graph_id, None)?
            .ok_or_else(|| PersistenceError::GraphNotFound(graph_id.to_string()))?;
        let src = self.layout.current_payload(graph_id, metadata.format);
        if !src.exists() {
            return Err(PersistenceError::PayloadMissing {
                graph_id: graph_id.to_string(),
                version: metadata.version,
                path: src,
            });
        }

        let dir = self.layout.backups_dir();
        fs::create_dir_all(&dir).map_err(|e| PersistenceError::io(&dir, e))?;
        let dst = self.layout.backup_file(&name);
        let size = copy_atomic(&src, &dst).map_err(|e| PersistenceError::io(&dst, e))?;

        info!(
            target: "sfm::persistence",
            graph_id,
            version = metadata.version,
            backup = %dst.display(),
            size_bytes = size,
            "Backup created"
        );
        Ok(dst)
    }

    /// Restore a graph from the backup at `path`
    ///
    /// The target id is `new_graph_id`, or else the backup name with any
    /// default timestamp suffix removed. The target's previous payloads and
    /// archived versions are discarded and the restored graph becomes
    /// version 1. Nothing is changed if the backup cannot be decoded.
    /// Returns the target id.
    pub fn restore_from_backup(
        &self,
        path: impl AsRef<Path>,
        new_graph_id: Option<&str>,
    ) -> PersistenceResult<String> {
        let _op = self.serialize_op();
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PersistenceError::BackupNotFound(path.to_path_buf()));
        }

        let graph_id = match new_graph_id {
            Some(id) => id.to_string(),
            None => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let name = backup_name(&file_name).unwrap_or(&file_name);
                graph_id_from_backup_name(name).to_string()
            }
        };
        validate_graph_id(&graph_id)?;

        let bytes = fs::read(path).map_err(|e| PersistenceError::io(path, e))?;
        if bytes.is_empty() {
            return Err(PersistenceError::restore(path, "backup file is empty"));
        }
        let format = self.config.effective_format(None);
        let (graph, uncompressed_len) = codec::decode_payload(&bytes, format)
            .map_err(|e| PersistenceError::serialization(&graph_id, e))?;
        if self.config.validate_on_load {
            self.validator
                .validate(&graph)
                .map_err(|e| PersistenceError::validation(&graph_id, e))?;
        }

        let version_dir = self.layout.version_dir(&graph_id);
        match fs::remove_dir_all(&version_dir) {
            Ok(()) => debug!(target: "sfm::persistence", graph_id = %graph_id, "Discarded version history"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(PersistenceError::io(&version_dir, e)),
        }
        self.remove_current_payloads(&graph_id, Some(format))?;

        let payload_path = self.layout.current_payload(&graph_id, format);
        write_atomic(&payload_path, &bytes).map_err(|e| PersistenceError::io(&payload_path, e))?;

        let now = Utc::now();
        let compression_ratio = (format.is_compressed() && uncompressed_len > 0)
            .then(|| bytes.len() as f64 / uncompressed_len as f64);
        let metadata = GraphMetadata {
            graph_id: graph_id.clone(),
            name: if graph.name.is_empty() {
                graph_id.clone()
            } else {
                graph.name.clone()
            },
            description: graph.description.clone(),
            version: 1,
            created_at: now,
            modified_at: now,
            author: String::new(),
            tags: Vec::new(),
            size_bytes: bytes.len() as u64,
            node_count: graph.node_count() as u64,
            relationship_count: graph.relationship_count() as u64,
            checksum: codec::checksum(&bytes),
            format,
            compression_ratio,
        };
        self.metadata.put(&metadata)?;

        info!(
            target: "sfm::persistence",
            graph_id = %graph_id,
            backup = %path.display(),
            nodes = metadata.node_count,
            relationships = metadata.relationship_count,
            "Graph restored from backup"
        );
        Ok(graph_id)
    }

    /// Delete backups last modified at least `max_age_days` days ago
    pub fn cleanup_old_backups(&self, max_age_days: u64) -> PersistenceResult<BackupCleanupReport> {
        let _op = self.serialize_op();
        let cutoff = SystemTime::now()
            .checked_sub(Duration::from_secs(max_age_days.saturating_mul(SECS_PER_DAY)))
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let backups = self.backup_entries()?;
        let examined = backups.len();
        let mut removed = Vec::new();
        let mut bytes_freed = 0;
        for (path, stat) in backups {
            let modified = stat.modified().map_err(|e| PersistenceError::io(&path, e))?;
            if modified > cutoff {
                continue;
            }
            if let Some(len) =
                remove_file_if_exists(&path).map_err(|e| PersistenceError::io(&path, e))?
            {
                bytes_freed += len;
                removed.push(path);
            }
        }

        if !removed.is_empty() {
            info!(
                target: "sfm::persistence",
                removed = removed.len(),
                bytes_freed,
                max_age_days,
                "Old backups cleaned up"
            );
        }
        Ok(BackupCleanupReport {
            max_age_days,
            examined,
            remaining: examined - removed.len(),
            removed,
            bytes_freed,
        })
    }

    /// Backup files, sorted by path
    pub fn list_backups(&self) -> PersistenceResult<Vec<PathBuf>> {
        let _op = self.serialize_op();
        Ok(self
            .backup_entries()?
            .into_iter()
            .map(|(path, _)| path)
            .collect())
    }

    /// Count, size, validity and age of backups
    pub fn backup_statistics(&self) -> PersistenceResult<BackupStatistics> {
        let _op = self.serialize_op();
        let now = SystemTime::now();
        let mut stats = BackupStatistics::default();
        let mut ages = Vec::new();

        for (path, stat) in self.backup_entries()? {
            stats.total_backups += 1;
            stats.total_backup_size_bytes += stat.len();
            if is_readable(&path) {
                stats.valid_backups += 1;
            }
            if let Ok(modified) = stat.modified() {
                let age = now.duration_since(modified).unwrap_or_default();
                ages.push(age.as_secs_f64() / 3600.0);
            }
        }

        if !ages.is_empty() {
            stats.oldest_backup_age_hours = ages.iter().copied().reduce(f64::max);
            stats.newest_backup_age_hours = ages.iter().copied().reduce(f64::min);
            stats.average_backup_age_hours = Some(ages.iter().sum::<f64>() / ages.len() as f64);
        }
        Ok(stats)
    }

    fn backup_entries(&self) -> PersistenceResult<Vec<(PathBuf, fs::Metadata)>> {
        let dir = self.layout.backups_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::io(&dir, e)),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PersistenceError::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if backup_name(&name).is_none() {
                continue;
            }
            let stat = entry
                .metadata()
                .map_err(|e| PersistenceError::io(entry.path(), e))?;
            if stat.is_file() {
                backups.push((entry.path(), stat));
            }
        }
        backups.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(backups)
    }
}

/// Strip a `_YYYYmmdd_HHMMSS` suffix, if present
fn graph_id_from_backup_name(name: &str) -> &str {
    if name.len() <= TIMESTAMP_SUFFIX_LEN {
        return name;
    }
    let split = name.len() - TIMESTAMP_SUFFIX_LEN;
    if !name.is_char_boundary(split) {
        return name;
    }
    let (id, stamp) = name.split_at(split);
    let b = stamp.as_bytes();
    let is_stamp = b[0] == b'_'
        && b[9] == b'_'
        && b[1..9].iter().all(u8::is_ascii_digit)
        && b[10..].iter().all(u8::is_ascii_digit);
    if is_stamp {
        id
    } else {
        name
    }
}

fn is_readable(path: &Path) -> bool {
    let mut header = [0u8; HEADER_LEN];
    File::open(path)
        .and_then(|mut f| f.read(&mut header))
        .map(|n| n > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersistenceConfig;
    use crate::format::StorageFormat;
    use sfm_core::{Actor, Graph, Node, NodeKind};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, PersistenceManager) {
        let dir = tempdir().unwrap();
        let manager = PersistenceManager::new(PersistenceConfig::for_testing(dir.path())).unwrap();
        (dir, manager)
    }

    fn graph() -> Graph {
        let mut graph = Graph::new("backup me");
        graph
            .add_node(Node::new("A", NodeKind::Actor(Actor::default())))
            .unwrap();
        graph
    }

    #[test]
    fn test_graph_id_from_backup_name() {
        assert_eq!(graph_id_from_backup_name("g1_20240131_235959"), "g1");
        assert_eq!(
            graph_id_from_backup_name("my_graph_20240131_235959"),
            "my_graph"
        );
        assert_eq!(graph_id_from_backup_name("nightly"), "nightly");
        assert_eq!(graph_id_from_backup_name("g1_2024013x_235959"), "g1_2024013x_235959");
    }

    #[test]
    fn test_backup_is_verbatim_copy() {
        let (_dir, manager) = setup();
        manager.save("g1", &graph()).unwrap();

        let path = manager.create_backup("g1", Some("b1")).unwrap();
        assert_eq!(path, manager.layout().backup_file("b1"));
        assert_eq!(
            fs::read(&path).unwrap(),
            fs::read(manager.layout().current_payload("g1", StorageFormat::Json)).unwrap()
        );
    }

    #[test]
    fn test_default_backup_name_restores_to_same_id() {
        let (_dir, manager) = setup();
        let original = graph();
        manager.save("g1", &original).unwrap();
        manager.save("g1", &original).unwrap();

        let path = manager.create_backup("g1", None).unwrap();
        assert!(manager.delete("g1", true).unwrap());

        assert_eq!(manager.restore_from_backup(&path, None).unwrap(), "g1");
        let metadata = manager.metadata("g1").unwrap().unwrap();
        assert_eq!(metadata.version, 1);
        assert_eq!(manager.load("g1", None).unwrap().unwrap(), original);
    }

    #[test]
    fn test_backup_missing_graph() {
        let (_dir, manager) = setup();
        assert!(matches!(
            manager.create_backup("nope", None),
            Err(PersistenceError::GraphNotFound(_))
        ));
    }

    #[test]
    fn test_backups_disabled() {
        let dir = tempdir().unwrap();
        let config = PersistenceConfig::for_testing(dir.path()).with_backup(false);
        let manager = PersistenceManager::new(config).unwrap();
        manager.save("g1", &graph()).unwrap();

        assert!(matches!(
            manager.create_backup("g1", None),
            Err(PersistenceError::BackupsDisabled)
        ));
    }

    #[test]
    fn test_restore_missing_backup() {
        let (dir, manager) = setup();
        assert!(matches!(
            manager.restore_from_backup(dir.path().join("nope.backup"), None),
            Err(PersistenceError::BackupNotFound(_))
        ));
    }

    #[test]
    fn test_restore_garbage_changes_nothing() {
        let (_dir, manager) = setup();
        manager.save("g1", &graph()).unwrap();
        let bogus = manager.layout().backup_file("g1_20240101_000000");
        fs::write(&bogus, b"not a graph").unwrap();

        assert!(manager.restore_from_backup(&bogus, None).is_err());
        assert_eq!(manager.metadata("g1").unwrap().unwrap().version, 1);
        assert!(manager.load("g1", None).unwrap().is_some());
    }

    #[test]
    fn test_cleanup_old_backups() {
        let (_dir, manager) = setup();
        manager.save("g1", &graph()).unwrap();
        manager.create_backup("g1", Some("b1")).unwrap();
        manager.create_backup("g1", Some("b2")).unwrap();

        let report = manager.cleanup_old_backups(7).unwrap();
        assert_eq!(report.examined, 2);
        assert!(report.removed.is_empty());

        let report = manager.cleanup_old_backups(0).unwrap();
        assert_eq!(report.removed.len(), 2);
        assert_eq!(report.remaining, 0);
        assert!(report.bytes_freed > 0);
        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_backup_statistics() {
        let (_dir, manager) = setup();
        manager.save("g1", &graph()).unwrap();
        manager.create_backup("g1", Some("b1")).unwrap();
        fs::write(manager.layout().backup_file("empty"), b"").unwrap();

        let stats = manager.backup_statistics().unwrap();
        assert_eq!(stats.total_backups, 2);
        assert_eq!(stats.valid_backups, 1);
        assert!(stats.total_backup_size_bytes > 0);
        assert!(stats.newest_backup_age_hours.unwrap() >= 0.0);
        assert!(stats.oldest_backup_age_hours >= stats.newest_backup_age_hours);
    }
}
