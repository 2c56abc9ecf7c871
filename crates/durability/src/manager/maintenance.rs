//! Version cleanup, consistency checks and statistics

use std::collections::BTreeMap;
use std::fs;
use std::io;
use tracing::{info, warn};

use super::reports::{CleanupReport, ConsistencyReport, StorageStatistics};
use super::PersistenceManager;
use crate::atomic::remove_file_if_exists;
use crate::codec;
use crate::error::{PersistenceError, PersistenceResult};
use crate::format::StorageFormat;
use crate::layout::{parse_archived_payload, validate_graph_id};
use crate::metadata::parse_metadata;

impl PersistenceManager {
    /// Remove archived versions of `graph_id` beyond the newest `keep`
    ///
    /// `keep` counts the current version, which is never removed, so
    /// `keep = 1` leaves only the current version. Defaults to
    /// `max_versions`.
    pub fn cleanup_old_versions(
        &self,
        graph_id: &str,
        keep: Option<usize>,
    ) -> PersistenceResult<CleanupReport> {
        let _op = self.serialize_op();
        validate_graph_id(graph_id)?;
        let keep = keep.unwrap_or(self.config.max_versions);
        if keep == 0 {
            return Err(PersistenceError::InvalidArgument(
                "keep must be at least 1".to_string(),
            ));
        }
        self.prune_versions(graph_id, keep)
    }

    pub(super) fn prune_versions(
        &self,
        graph_id: &str,
        keep: usize,
    ) -> PersistenceResult<CleanupReport> {
        let archived = self.metadata.archived_versions(graph_id)?;
        let current = match self.metadata.get(graph_id, None) {
            Ok(metadata) => metadata.map(|m| m.version),
            Err(e) => {
                warn!(
                    target: "sfm::persistence",
                    graph_id,
                    error = %e,
                    "Current metadata unreadable, pruning archived versions only"
                );
                None
            }
        };

        let mut all = archived.clone();
        if let Some(v) = current.filter(|v| !archived.contains(v)) {
            all.push(v);
        }
        all.sort_unstable_by(|a, b| b.cmp(a));
        let retained = &all[..keep.min(all.len())];

        let mut removed_versions = Vec::new();
        let mut bytes_freed = 0;
        for &version in archived.iter().filter(|v| !retained.contains(v)) {
            bytes_freed += self.remove_archived_version(graph_id, version)?;
            removed_versions.push(version);
        }

        let report = CleanupReport {
            graph_id: graph_id.to_string(),
            keep,
            versions_before: all.len(),
            versions_after: all.len() - removed_versions.len(),
            removed_versions,
            bytes_freed,
        };
        if report.cleaned_up() > 0 {
            info!(
                target: "sfm::persistence",
                graph_id,
                removed = report.cleaned_up(),
                bytes_freed,
                "Old versions cleaned up"
            );
        }
        Ok(report)
    }

    fn remove_archived_version(&self, graph_id: &str, version: u64) -> PersistenceResult<u64> {
        let mut freed = 0;
        let paths = StorageFormat::ALL
            .into_iter()
            .map(|format| self.layout.archived_payload(graph_id, version, format))
            .chain(std::iter::once(
                self.layout.archived_metadata(graph_id, version),
            ));
        for path in paths {
            if let Some(len) =
                remove_file_if_exists(&path).map_err(|e| PersistenceError::io(&path, e))?
            {
                freed += len;
            }
        }
        Ok(freed)
    }

    /// Diagnose the on-disk state of `graph_id` without changing it
    pub fn check_version_consistency(&self, graph_id: &str) -> PersistenceResult<ConsistencyReport> {
        let _op = self.serialize_op();
        validate_graph_id(graph_id)?;
        let mut issues = Vec::new();
        let mut recommendations: Vec<String> = Vec::new();
        let mut recommend = |text: &str| {
            if !recommendations.iter().any(|r| r == text) {
                recommendations.push(text.to_string());
            }
        };

        let current = match self.metadata.get(graph_id, None) {
            Ok(metadata) => metadata,
            Err(e) => {
                issues.push(format!("current metadata unusable: {e}"));
                recommend("Restore the graph from a backup or save it again");
                None
            }
        };

        match &current {
            None if issues.is_empty() => {
                issues.push("no current metadata".to_string());
                recommend("The graph does not exist; restore it from a backup if it should");
            }
            None => {}
            Some(metadata) => {
                let path = self.layout.current_payload(graph_id, metadata.format);
                match fs::read(&path) {
                    Ok(bytes) => {
                        if !metadata.checksum.is_empty() && codec::checksum(&bytes) != metadata.checksum
                        {
                            issues.push(format!(
                                "current payload checksum does not match metadata (version {})",
                                metadata.version
                            ));
                            recommend("Restore the graph from a backup or save it again");
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        issues.push(format!("current payload missing: {}", path.display()));
                        recommend("Restore the graph from a backup or save it again");
                    }
                    Err(e) => issues.push(format!("current payload unreadable: {e}")),
                }
            }
        }

        let archived = self.metadata.archived_versions(graph_id)?;
        for &version in &archived {
            let meta_path = self.layout.archived_metadata(graph_id, version);
            let parsed = fs::read(&meta_path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| parse_metadata(&bytes).map_err(|e| e.to_string()));
            let metadata = match parsed {
                Ok(metadata) => metadata,
                Err(e) => {
                    issues.push(format!("archived metadata for version {version} unreadable: {e}"));
                    recommend("Remove unreadable archived versions with cleanup_old_versions");
                    continue;
                }
            };

            if metadata.version != version || metadata.graph_id != graph_id {
                issues.push(format!(
                    "archived metadata file for version {version} describes {} version {}",
                    metadata.graph_id, metadata.version
                ));
            }
            if !self
                .layout
                .archived_payload(graph_id, version, metadata.format)
                .exists()
            {
                issues.push(format!("archived payload for version {version} missing"));
                recommend("Remove unreadable archived versions with cleanup_old_versions");
            }
            if let Some(current) = current.as_ref().filter(|c| version >= c.version) {
                issues.push(format!(
                    "archived version {version} is not older than current version {}",
                    current.version
                ));
            }
        }

        let dir = self.layout.version_dir(graph_id);
        if let Ok(entries) = fs::read_dir(&dir) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if let Some((version, _)) = parse_archived_payload(&name) {
                    if !archived.contains(&version) {
                        issues.push(format!("archived payload {name} has no metadata"));
                        recommend("Delete orphaned archived payloads");
                    }
                }
            }
        }

        let report = ConsistencyReport {
            graph_id: graph_id.to_string(),
            is_consistent: issues.is_empty(),
            current_version: current.map(|m| m.version),
            archived_versions: archived,
            issues,
            recommendations,
        };
        if !report.is_consistent {
            warn!(
                target: "sfm::persistence",
                graph_id,
                issues = report.issues.len(),
                "Version consistency check found issues"
            );
        }
        Ok(report)
    }

    /// Aggregate statistics over every stored graph and backup
    pub fn storage_statistics(&self) -> PersistenceResult<StorageStatistics> {
        let _op = self.serialize_op();
        let graphs = self.list_graphs()?;

        let mut format_distribution = BTreeMap::new();
        let mut total_archived_versions = 0;
        for metadata in &graphs {
            *format_distribution
                .entry(metadata.format.tag().to_string())
                .or_insert(0) += 1;
            total_archived_versions += self.metadata.archived_versions(&metadata.graph_id)?.len();
        }

        Ok(StorageStatistics {
            base_path: self.layout.root().to_path_buf(),
            total_graphs: graphs.len(),
            total_size_bytes: graphs.iter().map(|m| m.size_bytes).sum(),
            total_archived_versions,
            format_distribution,
            total_nodes: graphs.iter().map(|m| m.node_count).sum(),
            total_relationships: graphs.iter().map(|m| m.relationship_count).sum(),
            largest_graph: graphs
                .iter()
                .max_by_key(|m| m.size_bytes)
                .map(|m| m.graph_id.clone()),
            oldest_graph: graphs
                .iter()
                .min_by_key(|m| m.created_at)
                .map(|m| m.graph_id.clone()),
            newest_graph: graphs
                .iter()
                .max_by_key(|m| m.created_at)
                .map(|m| m.graph_id.clone()),
            backups: self.backup_statistics()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersistenceConfig;
    use crate::manager::SaveOptions;
    use sfm_core::{Actor, Graph, Node, NodeKind};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, PersistenceManager) {
        let dir = tempdir().unwrap();
        let manager = PersistenceManager::new(PersistenceConfig::for_testing(dir.path())).unwrap();
        (dir, manager)
    }

    fn graph(label: &str) -> Graph {
        let mut graph = Graph::new("maintenance");
        graph
            .add_node(Node::new(label, NodeKind::Actor(Actor::default())))
            .unwrap();
        graph
    }

    #[test]
    fn test_cleanup_keep_counts_current_version() {
        let (_dir, manager) = setup();
        manager.save("g1", &graph("one")).unwrap();
        manager.save("g1", &graph("two")).unwrap();

        let report = manager.cleanup_old_versions("g1", Some(1)).unwrap();
        assert_eq!(report.removed_versions, vec![1]);
        assert_eq!(report.versions_before, 2);
        assert_eq!(report.versions_after, 1);
        assert!(report.bytes_freed > 0);
        assert!(manager.version_history("g1").unwrap().is_empty());
        assert!(manager.load("g1", None).unwrap().is_some());
    }

    #[test]
    fn test_cleanup_rejects_zero_keep() {
        let (_dir, manager) = setup();
        assert!(matches!(
            manager.cleanup_old_versions("g1", Some(0)),
            Err(PersistenceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_cleanup_noop_under_limit() {
        let (_dir, manager) = setup();
        manager.save("g1", &graph("one")).unwrap();
        manager.save("g1", &graph("two")).unwrap();

        let report = manager.cleanup_old_versions("g1", None).unwrap();
        assert_eq!(report.cleaned_up(), 0);
        assert_eq!(report.bytes_freed, 0);
        assert_eq!(report.keep, 10);
    }

    #[test]
    fn test_consistency_of_healthy_graph() {
        let (_dir, manager) = setup();
        manager.save("g1", &graph("one")).unwrap();
        manager.save("g1", &graph("two")).unwrap();

        let report = manager.check_version_consistency("g1").unwrap();
        assert!(report.is_consistent, "{:?}", report.issues);
        assert_eq!(report.current_version, Some(2));
        assert_eq!(report.archived_versions, vec![1]);
    }

    #[test]
    fn test_consistency_of_missing_graph() {
        let (_dir, manager) = setup();
        let report = manager.check_version_consistency("ghost").unwrap();
        assert!(!report.is_consistent);
        assert_eq!(report.current_version, None);
        assert!(!report.recommendations.is_empty());
    }

    #[test]
    fn test_consistency_detects_missing_archived_payload() {
        let (_dir, manager) = setup();
        manager.save("g1", &graph("one")).unwrap();
        manager.save("g1", &graph("two")).unwrap();
        fs::remove_file(
            manager
                .layout()
                .archived_payload("g1", 1, StorageFormat::Json),
        )
        .unwrap();

        let report = manager.check_version_consistency("g1").unwrap();
        assert!(!report.is_consistent);
        assert!(report.issues.iter().any(|i| i.contains("version 1")));
    }

    #[test]
    fn test_statistics() {
        let (_dir, manager) = setup();
        manager.save("a", &graph("one")).unwrap();
        manager.save("a", &graph("two")).unwrap();
        manager
            .save_with(
                "b",
                &graph("three"),
                &SaveOptions::new().with_format(StorageFormat::MsgPack),
            )
            .unwrap();

        let stats = manager.storage_statistics().unwrap();
        assert_eq!(stats.total_graphs, 2);
        assert_eq!(stats.total_archived_versions, 1);
        assert_eq!(stats.total_nodes, 2);
        assert_eq!(stats.format_distribution.get("json"), Some(&1));
        assert_eq!(stats.format_distribution.get("msgpack"), Some(&1));
        assert!(stats.largest_graph.is_some());
        assert_eq!(stats.oldest_graph.as_deref(), Some("a"));
        assert_eq!(stats.newest_graph.as_deref(), Some("b"));
        assert_eq!(stats.backups.total_backups, 0);
    }
}
