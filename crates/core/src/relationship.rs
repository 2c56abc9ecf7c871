//! Typed edges between nodes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{NodeId, RelationshipId};
use crate::vocab::RelationshipKind;

/// Typed edge connecting two nodes by identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship identifier
    pub id: RelationshipId,
    /// Node the edge starts at
    pub source_id: NodeId,
    /// Node the edge ends at
    pub target_id: NodeId,
    /// Kind tag
    pub kind: RelationshipKind,
    /// Numeric weight ($-value, mass, influence score...)
    pub weight: f64,
    /// Free-form key/value metadata
    pub meta: BTreeMap<String, String>,
    /// Confidence level (0-1)
    pub certainty: Option<f64>,
    /// Schema version of the relationship record
    pub version: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub modified_at: Option<DateTime<Utc>>,
}

impl Relationship {
    /// Create a relationship with a fresh id and weight 1.0
    pub fn new(source_id: NodeId, target_id: NodeId, kind: RelationshipKind) -> Self {
        Self {
            id: RelationshipId::new(),
            source_id,
            target_id,
            kind,
            weight: 1.0,
            meta: BTreeMap::new(),
            certainty: Some(1.0),
            version: 1,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    /// Set the weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Add a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// True if the edge touches `node`
    pub fn touches(&self, node: NodeId) -> bool {
        self.source_id == node || self.target_id == node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_relationship() {
        let a = NodeId::new();
        let b = NodeId::new();
        let rel = Relationship::new(a, b, RelationshipKind::Funds).with_weight(2.5);

        assert_eq!(rel.source_id, a);
        assert_eq!(rel.target_id, b);
        assert_eq!(rel.kind, RelationshipKind::Funds);
        assert_eq!(rel.weight, 2.5);
        assert!(rel.touches(a));
        assert!(rel.touches(b));
        assert!(!rel.touches(NodeId::new()));
    }
}
