//! The facade exposes the graph model and the persistence API together

use sfm_store::durability::layout::validate_graph_id;
use sfm_store::{
    load_graph, save_graph, Actor, Graph, Node, NodeKind, PersistenceConfig, PersistenceManager,
    Policy, Relationship, RelationshipKind, StorageFormat,
};
use tempfile::TempDir;

#[test]
fn test_facade_save_load() {
    let dir = TempDir::new().unwrap();
    let mut graph = Graph::new("facade");
    let farm = graph
        .add_node(Node::new("Farm", NodeKind::Actor(Actor::default())))
        .unwrap();
    let subsidy = graph
        .add_node(Node::new("Subsidy", NodeKind::Policy(Policy::default())))
        .unwrap();
    graph.add_relationship(Relationship::new(subsidy, farm, RelationshipKind::Subsidizes));

    let metadata = save_graph(dir.path(), "g1", &graph).unwrap();
    assert_eq!(metadata.format, StorageFormat::JsonGz);
    assert_eq!(load_graph(dir.path(), "g1").unwrap().unwrap(), graph);

    let manager = PersistenceManager::new(PersistenceConfig::new(dir.path())).unwrap();
    assert_eq!(manager.list_graph_ids().unwrap(), vec!["g1"]);
    assert!(validate_graph_id("g1").is_ok());
}
