//! Maintenance and statistics reports

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome of [`super::PersistenceManager::cleanup_old_versions`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Graph cleaned
    pub graph_id: String,
    /// Versions retained, counting the current one
    pub keep: usize,
    /// Versions before cleanup, counting the current one
    pub versions_before: usize,
    /// Versions after cleanup, counting the current one
    pub versions_after: usize,
    /// Archived versions removed, ascending
    pub removed_versions: Vec<u64>,
    /// Bytes of the removed payload and metadata files
    pub bytes_freed: u64,
}

impl CleanupReport {
    /// Number of versions removed
    pub fn cleaned_up(&self) -> usize {
        self.removed_versions.len()
    }
}

/// Outcome of [`super::PersistenceManager::cleanup_old_backups`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupCleanupReport {
    /// Age threshold in days
    pub max_age_days: u64,
    /// Backups examined
    pub examined: usize,
    /// Backups removed
    pub removed: Vec<PathBuf>,
    /// Backups left
    pub remaining: usize,
    /// Bytes of the removed backups
    pub bytes_freed: u64,
}

/// Outcome of [`super::PersistenceManager::check_version_consistency`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Graph checked
    pub graph_id: String,
    /// True when no issues were found
    pub is_consistent: bool,
    /// Version of the current metadata, if readable
    pub current_version: Option<u64>,
    /// Archived version numbers found, ascending
    pub archived_versions: Vec<u64>,
    /// Problems found
    pub issues: Vec<String>,
    /// Suggested fixes, one per kind of problem
    pub recommendations: Vec<String>,
}

/// Backup directory statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BackupStatistics {
    /// Backup files
    pub total_backups: usize,
    /// Combined size of all backups
    pub total_backup_size_bytes: u64,
    /// Backups that are readable and non-empty
    pub valid_backups: usize,
    /// Age of the oldest backup in hours
    pub oldest_backup_age_hours: Option<f64>,
    /// Age of the newest backup in hours
    pub newest_backup_age_hours: Option<f64>,
    /// Mean backup age in hours
    pub average_backup_age_hours: Option<f64>,
}

/// Whole-store statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StorageStatistics {
    /// Storage root
    pub base_path: PathBuf,
    /// Stored graphs
    pub total_graphs: usize,
    /// Combined size of current payloads
    pub total_size_bytes: u64,
    /// Archived versions across all graphs
    pub total_archived_versions: usize,
    /// Graph count per payload format tag
    pub format_distribution: BTreeMap<String, usize>,
    /// Nodes across all current versions
    pub total_nodes: u64,
    /// Relationships across all current versions
    pub total_relationships: u64,
    /// Id of the largest current payload
    pub largest_graph: Option<String>,
    /// Id of the graph created first
    pub oldest_graph: Option<String>,
    /// Id of the graph created last
    pub newest_graph: Option<String>,
    /// Backup statistics
    pub backups: BackupStatistics,
}
