//! SFM Store - versioned, checksum-verified persistence for Social Fabric Matrix graphs
//!
//! # Quick Start
//!
//! ```no_run
//! use sfm_store::{Actor, Graph, Node, NodeKind, PersistenceManager};
//!
//! let manager = PersistenceManager::open("./sfm_data")?;
//!
//! let mut graph = Graph::new("demo");
//! graph.add_node(Node::new("Farm", NodeKind::Actor(Actor::default())))?;
//!
//! let metadata = manager.save("g1", &graph)?;
//! assert_eq!(metadata.version, 1);
//!
//! let loaded = manager.load("g1", None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! - `sfm-core`: the graph model (nodes, relationships, vocabularies)
//! - `sfm-durability`: formats, codec, layout, metadata, integrity, manager
//!
//! The graph model is re-exported at the top level, the persistence API
//! by name. Everything else is reachable through [`durability`].

pub use sfm_core::*;
pub use sfm_durability as durability;
pub use sfm_durability::{
    list_graphs, load_graph, save_graph, BackupCleanupReport, BackupStatistics, CleanupReport,
    ConsistencyReport, GraphMetadata, MetadataOverrides, PersistenceConfig, PersistenceError,
    PersistenceManager, PersistenceResult, SaveOptions, SerializationError, StorageFormat,
    StorageStatistics, VersioningStrategy,
};
