//! Core types for SFM graph storage
//!
//! This crate defines the graph model consumed by the persistence layer:
//! - GraphId / NodeId / RelationshipId: UUID-backed identifiers
//! - Node / NodeKind: common node fields plus a closed set of node kinds
//! - NodeCollection: the twelve node collections of a graph
//! - Relationship: typed edge between two nodes
//! - Graph: the node collections plus the relationship collection
//! - Controlled vocabularies: RelationshipKind, ResourceType, FlowNature, ...
//! - Error: graph model error type

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod node;
pub mod relationship;
pub mod types;
pub mod vocab;

pub use error::{Error, Result};
pub use graph::{Graph, NodeMap, RelationshipMap};
pub use node::{
    Actor, AnalyticalContext, BeliefSystem, FeedbackLoop, Flow, Indicator, Institution, Node,
    NodeCollection, NodeKind, Policy, Process, Resource, SystemProperty, TechnologySystem,
};
pub use relationship::Relationship;
pub use types::{GraphId, NodeId, RelationshipId};
pub use vocab::{
    FeedbackPolarity, FlowNature, FlowType, InstitutionLayer, RelationshipKind, ResourceType,
};
