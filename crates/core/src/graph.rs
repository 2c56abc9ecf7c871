//! In-memory SFM graph
//!
//! A graph is twelve disjoint node collections (one per [`crate::node::NodeKind`]) plus
//! one relationship collection. Every collection is an ordered map so that
//! iteration order, and therefore any encoding of the graph, is stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::node::{Node, NodeCollection};
use crate::relationship::Relationship;
use crate::types::{GraphId, NodeId, RelationshipId};

/// Map from node id to node
pub type NodeMap = BTreeMap<NodeId, Node>;

/// Map from relationship id to relationship
pub type RelationshipMap = BTreeMap<RelationshipId, Relationship>;

/// Social Fabric Matrix graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Graph identifier
    pub id: GraphId,
    /// Graph name
    pub name: String,
    /// Graph description
    pub description: String,
    /// Actor nodes
    pub actors: NodeMap,
    /// Institution nodes
    pub institutions: NodeMap,
    /// Resource nodes
    pub resources: NodeMap,
    /// Process nodes
    pub processes: NodeMap,
    /// Flow nodes
    pub flows: NodeMap,
    /// Policy nodes
    pub policies: NodeMap,
    /// Belief system nodes
    pub belief_systems: NodeMap,
    /// Technology system nodes
    pub technology_systems: NodeMap,
    /// Indicator nodes
    pub indicators: NodeMap,
    /// Feedback loop nodes
    pub feedback_loops: NodeMap,
    /// System property nodes
    pub system_properties: NodeMap,
    /// Analytical context nodes
    pub analytical_contexts: NodeMap,
    /// Relationships between nodes
    pub relationships: RelationshipMap,
}

impl Graph {
    /// Create an empty graph with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(GraphId::new(), name)
    }

    /// Create an empty graph with the given id
    pub fn with_id(id: GraphId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            actors: NodeMap::new(),
            institutions: NodeMap::new(),
            resources: NodeMap::new(),
            processes: NodeMap::new(),
            flows: NodeMap::new(),
            policies: NodeMap::new(),
            belief_systems: NodeMap::new(),
            technology_systems: NodeMap::new(),
            indicators: NodeMap::new(),
            feedback_loops: NodeMap::new(),
            system_properties: NodeMap::new(),
            analytical_contexts: NodeMap::new(),
            relationships: RelationshipMap::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Borrow one node collection
    pub fn collection(&self, collection: NodeCollection) -> &NodeMap {
        match collection {
            NodeCollection::Actors => &self.actors,
            NodeCollection::Institutions => &self.institutions,
            NodeCollection::Resources => &self.resources,
            NodeCollection::Processes => &self.processes,
            NodeCollection::Flows => &self.flows,
            NodeCollection::Policies => &self.policies,
            NodeCollection::BeliefSystems => &self.belief_systems,
            NodeCollection::TechnologySystems => &self.technology_systems,
            NodeCollection::Indicators => &self.indicators,
            NodeCollection::FeedbackLoops => &self.feedback_loops,
            NodeCollection::SystemProperties => &self.system_properties,
            NodeCollection::AnalyticalContexts => &self.analytical_contexts,
        }
    }

    /// Mutably borrow one node collection
    ///
    /// Inserting through this bypasses the checks done by [`Graph::add_node`].
    pub fn collection_mut(&mut self, collection: NodeCollection) -> &mut NodeMap {
        match collection {
            NodeCollection::Actors => &mut self.actors,
            NodeCollection::Institutions => &mut self.institutions,
            NodeCollection::Resources => &mut self.resources,
            NodeCollection::Processes => &mut self.processes,
            NodeCollection::Flows => &mut self.flows,
            NodeCollection::Policies => &mut self.policies,
            NodeCollection::BeliefSystems => &mut self.belief_systems,
            NodeCollection::TechnologySystems => &mut self.technology_systems,
            NodeCollection::Indicators => &mut self.indicators,
            NodeCollection::FeedbackLoops => &mut self.feedback_loops,
            NodeCollection::SystemProperties => &mut self.system_properties,
            NodeCollection::AnalyticalContexts => &mut self.analytical_contexts,
        }
    }

    /// Iterate all collections in fixed order
    pub fn collections(&self) -> impl Iterator<Item = (NodeCollection, &NodeMap)> {
        NodeCollection::ALL.into_iter().map(move |c| (c, self.collection(c)))
    }

    /// Iterate every node of every collection
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.collections().flat_map(|(_, map)| map.values())
    }

    /// Add a node to the collection matching its kind
    ///
    /// # Errors
    /// Returns [`Error::DuplicateNode`] if the id is already used by any
    /// collection.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        let id = node.id;
        if self.node(id).is_some() {
            return Err(Error::DuplicateNode(id));
        }
        self.collection_mut(node.collection()).insert(id, node);
        Ok(id)
    }

    /// Add a relationship, replacing any relationship with the same id
    pub fn add_relationship(&mut self, relationship: Relationship) -> RelationshipId {
        let id = relationship.id;
        self.relationships.insert(id, relationship);
        id
    }

    /// Look a node up in any collection
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.collections().find_map(|(_, map)| map.get(&id))
    }

    /// Total number of nodes across all collections
    pub fn node_count(&self) -> usize {
        self.collections().map(|(_, map)| map.len()).sum()
    }

    /// Number of relationships
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Node count per collection (empty collections included)
    pub fn node_counts(&self) -> BTreeMap<NodeCollection, usize> {
        self.collections().map(|(c, map)| (c, map.len())).collect()
    }

    /// True if the graph has no nodes and no relationships
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0 && self.relationships.is_empty()
    }
}
