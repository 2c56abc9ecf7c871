//! Structural and referential graph validation
//!
//! Hard rules, checked in this order. The first violation is returned:
//!
//! 1. The graph id is not nil.
//! 2. Every node sits in the collection for its kind.
//! 3. Every node is keyed by its own id.
//! 4. No node id appears in more than one collection.
//! 5. Every relationship is keyed by its own id.
//! 6. Every relationship's source and target resolve to a node.
//!
//! Soft findings (suspicious but loadable) go into
//! [`IntegrityReport::warnings`] and are logged.

use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use sfm_core::{Graph, NodeCollection, NodeId, RelationshipId};

/// Relationship-to-node ratio above which a warning is raised
pub const DEFAULT_MAX_RELATIONSHIP_RATIO: f64 = 10.0;

/// Result of a successful validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityReport {
    /// Nodes across all collections
    pub node_count: usize,
    /// Relationships
    pub relationship_count: usize,
    /// Soft findings
    pub warnings: Vec<String>,
}

impl IntegrityReport {
    /// True if validation raised no warnings
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// First hard rule a graph violates
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityError {
    /// The graph id is nil
    #[error("graph has no identifier")]
    MissingGraphId,

    /// A node sits in a collection that does not hold its kind
    #[error("node {node_id} of kind {kind} is stored in collection '{collection}'")]
    WrongCollection {
        /// Offending node
        node_id: NodeId,
        /// The node's kind tag
        kind: &'static str,
        /// Collection it was found in
        collection: NodeCollection,
    },

    /// A node's map key differs from its id
    #[error("node keyed {key} in '{collection}' has id {node_id}")]
    NodeKeyMismatch {
        /// Collection
        collection: NodeCollection,
        /// Map key
        key: NodeId,
        /// Id inside the node
        node_id: NodeId,
    },

    /// One node id appears in two collections
    #[error("node {node_id} appears in both '{first}' and '{second}'")]
    DuplicateNodeId {
        /// Duplicated id
        node_id: NodeId,
        /// Collection where it was seen first
        first: NodeCollection,
        /// Collection where it was seen again
        second: NodeCollection,
    },

    /// A relationship's map key differs from its id
    #[error("relationship keyed {key} has id {relationship_id}")]
    RelationshipKeyMismatch {
        /// Map key
        key: RelationshipId,
        /// Id inside the relationship
        relationship_id: RelationshipId,
    },

    /// A relationship's source does not resolve
    #[error("relationship {relationship_id} references missing source node {node_id}")]
    DanglingSource {
        /// Offending relationship
        relationship_id: RelationshipId,
        /// Unresolved node id
        node_id: NodeId,
    },

    /// A relationship's target does not resolve
    #[error("relationship {relationship_id} references missing target node {node_id}")]
    DanglingTarget {
        /// Offending relationship
        relationship_id: RelationshipId,
        /// Unresolved node id
        node_id: NodeId,
    },
}

/// Graph validator
#[derive(Debug, Clone)]
pub struct IntegrityValidator {
    max_relationship_ratio: f64,
}

impl Default for IntegrityValidator {
    fn default() -> Self {
        IntegrityValidator {
            max_relationship_ratio: DEFAULT_MAX_RELATIONSHIP_RATIO,
        }
    }
}

impl IntegrityValidator {
    /// Validator with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the relationship-to-node ratio that triggers a warning
    pub fn with_max_relationship_ratio(mut self, ratio: f64) -> Self {
        self.max_relationship_ratio = ratio;
        self
    }

    /// Validate `graph`
    pub fn validate(&self, graph: &Graph) -> Result<IntegrityReport, IntegrityError> {
        if graph.id.is_nil() {
            return Err(IntegrityError::MissingGraphId);
        }

        let mut warnings = Vec::new();
        let mut seen: HashMap<NodeId, NodeCollection> = HashMap::new();

        for (collection, nodes) in graph.collections() {
            for (key, node) in nodes {
                if !collection.accepts(&node.kind) {
                    return Err(IntegrityError::WrongCollection {
                        node_id: node.id,
                        kind: node.kind.tag(),
                        collection,
                    });
                }
                if *key != node.id {
                    return Err(IntegrityError::NodeKeyMismatch {
                        collection,
                        key: *key,
                        node_id: node.id,
                    });
                }
                if let Some(first) = seen.insert(node.id, collection) {
                    return Err(IntegrityError::DuplicateNodeId {
                        node_id: node.id,
                        first,
                        second: collection,
                    });
                }
                if let Some(c) = node.certainty.filter(|c| !(0.0..=1.0).contains(c)) {
                    warnings.push(format!("node {} has certainty {} outside [0, 1]", node.id, c));
                }
            }
        }

        for (key, rel) in &graph.relationships {
            if *key != rel.id {
                return Err(IntegrityError::RelationshipKeyMismatch {
                    key: *key,
                    relationship_id: rel.id,
                });
            }
            if !seen.contains_key(&rel.source_id) {
                return Err(IntegrityError::DanglingSource {
                    relationship_id: rel.id,
                    node_id: rel.source_id,
                });
            }
            if !seen.contains_key(&rel.target_id) {
                return Err(IntegrityError::DanglingTarget {
                    relationship_id: rel.id,
                    node_id: rel.target_id,
                });
            }
            if !rel.weight.is_finite() {
                warnings.push(format!("relationship {} has non-finite weight", rel.id));
            }
            if let Some(c) = rel.certainty.filter(|c| !(0.0..=1.0).contains(c)) {
                warnings.push(format!(
                    "relationship {} has certainty {} outside [0, 1]",
                    rel.id, c
                ));
            }
        }

        let node_count = seen.len();
        let relationship_count = graph.relationships.len();
        if node_count > 0
            && relationship_count as f64 > node_count as f64 * self.max_relationship_ratio
        {
            warnings.push(format!(
                "unusually dense graph: {} relationships for {} nodes",
                relationship_count, node_count
            ));
        }

        for warning in &warnings {
            warn!(target: "sfm::integrity", graph_id = %graph.id, "{}", warning);
        }

        Ok(IntegrityReport {
            node_count,
            relationship_count,
            warnings,
        })
    }
}

/// Validate `graph` with default thresholds
pub fn validate_graph(graph: &Graph) -> Result<IntegrityReport, IntegrityError> {
    IntegrityValidator::default().validate(graph)
}
