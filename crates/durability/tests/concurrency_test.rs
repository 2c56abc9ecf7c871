//! Concurrent access through one shared manager
//!
//! With `thread_safe` on, operations are serialized, so concurrent saves of
//! one graph still produce a gap-free version sequence.

use sfm_core::{Actor, Graph, Node, NodeKind};
use sfm_durability::{PersistenceConfig, PersistenceManager};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 4;
const SAVES_PER_THREAD: usize = 5;

fn graph(label: &str) -> Graph {
    let mut graph = Graph::new("concurrent");
    graph
        .add_node(Node::new(label, NodeKind::Actor(Actor::default())))
        .unwrap();
    graph
}

fn shared_manager() -> (TempDir, Arc<PersistenceManager>) {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
    let dir = TempDir::new().unwrap();
    let config = PersistenceConfig::for_testing(dir.path())
        .with_max_versions(THREADS * SAVES_PER_THREAD)
        .with_thread_safety(true);
    (dir, Arc::new(PersistenceManager::new(config).unwrap()))
}

#[test]
fn test_concurrent_saves_of_one_graph() {
    let (_dir, manager) = shared_manager();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                (0..SAVES_PER_THREAD)
                    .map(|i| {
                        manager
                            .save("shared", &graph(&format!("t{t}-{i}")))
                            .unwrap()
                            .version
                    })
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let versions: BTreeSet<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let total = (THREADS * SAVES_PER_THREAD) as u64;
    assert_eq!(versions, (1..=total).collect::<BTreeSet<u64>>());

    assert_eq!(manager.metadata("shared").unwrap().unwrap().version, total);
    assert_eq!(
        manager.version_history("shared").unwrap().len(),
        (total - 1) as usize
    );
    let report = manager.check_version_consistency("shared").unwrap();
    assert!(report.is_consistent, "{:?}", report.issues);
}

#[test]
fn test_concurrent_saves_and_loads_of_distinct_graphs() {
    let (_dir, manager) = shared_manager();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let id = format!("graph-{t}");
                for i in 0..SAVES_PER_THREAD {
                    let saved = graph(&format!("{id}-{i}"));
                    manager.save(&id, &saved).unwrap();
                    assert_eq!(manager.load(&id, None).unwrap().unwrap(), saved);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ids = manager.list_graph_ids().unwrap();
    assert_eq!(ids.len(), THREADS);
    for id in ids {
        assert_eq!(
            manager.metadata(&id).unwrap().unwrap().version,
            SAVES_PER_THREAD as u64
        );
    }
}
