//! One-shot helpers
//!
//! Each function opens a default-configured [`PersistenceManager`] over the
//! given root, performs one operation and drops it.

use std::path::Path;

use sfm_core::Graph;

use crate::error::PersistenceResult;
use crate::manager::PersistenceManager;
use crate::metadata::GraphMetadata;

/// Root used when callers have no preference
pub const DEFAULT_STORAGE_PATH: &str = crate::config::DEFAULT_BASE_PATH;

/// Save `graph` under `graph_id` in the store at `root`
pub fn save_graph(
    root: impl AsRef<Path>,
    graph_id: &str,
    graph: &Graph,
) -> PersistenceResult<GraphMetadata> {
    PersistenceManager::open(root)?.save(graph_id, graph)
}

/// Load the current version of `graph_id` from the store at `root`
pub fn load_graph(root: impl AsRef<Path>, graph_id: &str) -> PersistenceResult<Option<Graph>> {
    PersistenceManager::open(root)?.load(graph_id, None)
}

/// Ids of the graphs in the store at `root`, sorted
pub fn list_graphs(root: impl AsRef<Path>) -> PersistenceResult<Vec<String>> {
    PersistenceManager::open(root)?.list_graph_ids()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::StorageFormat;
    use sfm_core::{Node, NodeKind, Resource};
    use tempfile::tempdir;

    #[test]
    fn test_quick_round_trip() {
        let dir = tempdir().unwrap();
        let mut graph = Graph::new("quick");
        graph
            .add_node(Node::new("Water", NodeKind::Resource(Resource::default())))
            .unwrap();

        let metadata = save_graph(dir.path(), "q1", &graph).unwrap();
        assert_eq!(metadata.version, 1);
        // default config compresses
        assert_eq!(metadata.format, StorageFormat::JsonGz);

        assert_eq!(load_graph(dir.path(), "q1").unwrap().unwrap(), graph);
        assert_eq!(list_graphs(dir.path()).unwrap(), vec!["q1"]);
        assert!(load_graph(dir.path(), "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_empty_store() {
        let dir = tempdir().unwrap();
        assert!(list_graphs(dir.path().join("fresh")).unwrap().is_empty());
    }
}
