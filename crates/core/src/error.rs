//! Error types for the graph model
//!
//! The graph model itself has very few failure modes: resolving a
//! controlled-vocabulary name and routing a node into a collection.

use thiserror::Error;

use crate::node::NodeCollection;
use crate::types::NodeId;

/// Result type alias for graph model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the graph model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A name did not resolve to any member of a controlled vocabulary
    #[error("Unknown {vocabulary} value: '{name}'")]
    UnknownVariant {
        /// Vocabulary that was searched (e.g. "RelationshipKind")
        vocabulary: &'static str,
        /// The name that failed to resolve
        name: String,
    },

    /// A node was inserted into a collection that does not hold its kind
    #[error("Node {node_id} of kind {kind} does not belong in collection '{collection}'")]
    WrongCollection {
        /// Offending node
        node_id: NodeId,
        /// Tag of the node's kind
        kind: &'static str,
        /// Collection it was placed in
        collection: NodeCollection,
    },

    /// A node id is already present in some collection of the graph
    #[error("Duplicate node id {0}")]
    DuplicateNode(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_variant() {
        let err = Error::UnknownVariant {
            vocabulary: "RelationshipKind",
            name: "frobnicates".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("RelationshipKind"));
        assert!(msg.contains("frobnicates"));
    }

    #[test]
    fn test_error_display_wrong_collection() {
        let err = Error::WrongCollection {
            node_id: NodeId::nil(),
            kind: "Actor",
            collection: NodeCollection::Policies,
        };
        let msg = err.to_string();
        assert!(msg.contains("Actor"));
        assert!(msg.contains("policies"));
    }
}
