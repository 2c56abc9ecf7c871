//! Node model
//!
//! A node is a set of common fields (identifier, label, free-form metadata,
//! versioning and data-quality fields) plus a [`NodeKind`] carrying the
//! fields specific to its kind. `NodeKind` is closed: adding a kind means
//! adding a variant, and every `match` over it (codec, validator, collection
//! routing) is checked by the compiler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{NodeId, RelationshipId};
use crate::vocab::{FeedbackPolarity, FlowNature, FlowType, InstitutionLayer, ResourceType};

/// Individuals, firms, agencies, communities
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Actor {
    /// Legal form, e.g. "Corporation", "Household"
    pub legal_form: Option<String>,
    /// Sector (NAICS or custom taxonomy)
    pub sector: Option<String>,
    /// Named power resources and their magnitudes
    pub power_resources: BTreeMap<String, f64>,
    /// Decision-making capacity (0-1)
    pub decision_making_capacity: Option<f64>,
}

/// Rules-in-use, organizations or informal norms
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Institution {
    /// Institutional layer
    pub layer: Option<InstitutionLayer>,
    /// Codified rules
    pub formal_rules: Vec<String>,
    /// Uncodified norms
    pub informal_norms: Vec<String>,
}

/// Stock or asset available for use or transformation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    /// Resource category
    pub category: ResourceType,
    /// Unit of measure, e.g. "tonnes"
    pub unit: Option<String>,
}

/// Transformation activity converting inputs to outputs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Process {
    /// Technology used, e.g. "EAF-Steel-2024"
    pub technology: Option<String>,
    /// Actor controlling the process
    pub responsible_actor_id: Option<NodeId>,
}

/// Quantified transfer of resources or value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Flow {
    /// Nature of the flow
    pub nature: FlowNature,
    /// Medium of the flow
    pub flow_type: FlowType,
    /// Quantity transferred
    pub quantity: Option<f64>,
    /// Unit of `quantity`
    pub unit: Option<String>,
    /// Process the flow leaves
    pub source_process_id: Option<NodeId>,
    /// Process the flow enters
    pub target_process_id: Option<NodeId>,
}

/// Policy intervention or regulatory framework
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Institutional layer of the policy
    pub layer: Option<InstitutionLayer>,
    /// Implementing body
    pub authority: Option<String>,
    /// Strength of enforcement (0-1)
    pub enforcement: Option<f64>,
    /// Sectors the policy targets
    pub target_sectors: Vec<String>,
}

/// Cultural myth, ideology or worldview
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BeliefSystem {
    /// Cultural embeddedness (0-1)
    pub strength: Option<f64>,
    /// Area of society where the belief operates
    pub domain: Option<String>,
}

/// Coherent system of techniques, tools and knowledge
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TechnologySystem {
    /// Technology readiness level (1-9)
    pub maturity: Option<u8>,
    /// Fit with other systems
    pub compatibility: BTreeMap<String, f64>,
}

/// Measurable proxy for system performance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Indicator {
    /// Unit of measurement
    pub measurement_unit: Option<String>,
    /// Latest observed value
    pub current_value: Option<f64>,
    /// Target value
    pub target_value: Option<f64>,
    /// Named thresholds
    pub threshold_values: BTreeMap<String, f64>,
}

/// Feedback loop through a chain of relationships
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedbackLoop {
    /// Reinforcing or balancing
    pub polarity: Option<FeedbackPolarity>,
    /// Loop strength
    pub strength: Option<f64>,
    /// Relationships forming the loop
    pub relationships: Vec<RelationshipId>,
}

/// System-level property or metric
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemProperty {
    /// Measured value
    pub value: Option<f64>,
    /// Unit of `value`
    pub unit: Option<String>,
    /// Nodes the property applies to
    pub affected_nodes: Vec<NodeId>,
}

/// Parameters and assumptions of an analysis
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticalContext {
    /// Methods used
    pub methods_used: Vec<String>,
    /// Named assumptions
    pub assumptions: BTreeMap<String, String>,
    /// Named data sources
    pub data_sources: BTreeMap<String, String>,
    /// How results were validated
    pub validation_approach: Option<String>,
}

/// Kind-specific part of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Actor node
    Actor(Actor),
    /// Institution node
    Institution(Institution),
    /// Resource node
    Resource(Resource),
    /// Process node
    Process(Process),
    /// Flow node
    Flow(Flow),
    /// Policy node
    Policy(Policy),
    /// Belief system node
    BeliefSystem(BeliefSystem),
    /// Technology system node
    TechnologySystem(TechnologySystem),
    /// Indicator node
    Indicator(Indicator),
    /// Feedback loop node
    FeedbackLoop(FeedbackLoop),
    /// System property node
    SystemProperty(SystemProperty),
    /// Analytical context node
    AnalyticalContext(AnalyticalContext),
}

impl NodeKind {
    /// Record tag used by the structured-text codec
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Actor(_) => "Actor",
            NodeKind::Institution(_) => "Institution",
            NodeKind::Resource(_) => "Resource",
            NodeKind::Process(_) => "Process",
            NodeKind::Flow(_) => "Flow",
            NodeKind::Policy(_) => "Policy",
            NodeKind::BeliefSystem(_) => "BeliefSystem",
            NodeKind::TechnologySystem(_) => "TechnologySystem",
            NodeKind::Indicator(_) => "Indicator",
            NodeKind::FeedbackLoop(_) => "FeedbackLoop",
            NodeKind::SystemProperty(_) => "SystemProperty",
            NodeKind::AnalyticalContext(_) => "AnalyticalContext",
        }
    }

    /// Collection this kind of node lives in
    pub fn collection(&self) -> NodeCollection {
        match self {
            NodeKind::Actor(_) => NodeCollection::Actors,
            NodeKind::Institution(_) => NodeCollection::Institutions,
            NodeKind::Resource(_) => NodeCollection::Resources,
            NodeKind::Process(_) => NodeCollection::Processes,
            NodeKind::Flow(_) => NodeCollection::Flows,
            NodeKind::Policy(_) => NodeCollection::Policies,
            NodeKind::BeliefSystem(_) => NodeCollection::BeliefSystems,
            NodeKind::TechnologySystem(_) => NodeCollection::TechnologySystems,
            NodeKind::Indicator(_) => NodeCollection::Indicators,
            NodeKind::FeedbackLoop(_) => NodeCollection::FeedbackLoops,
            NodeKind::SystemProperty(_) => NodeCollection::SystemProperties,
            NodeKind::AnalyticalContext(_) => NodeCollection::AnalyticalContexts,
        }
    }
}

/// The twelve node collections of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCollection {
    /// Actor nodes
    Actors,
    /// Institution nodes
    Institutions,
    /// Resource nodes
    Resources,
    /// Process nodes
    Processes,
    /// Flow nodes
    Flows,
    /// Policy nodes
    Policies,
    /// Belief system nodes
    BeliefSystems,
    /// Technology system nodes
    TechnologySystems,
    /// Indicator nodes
    Indicators,
    /// Feedback loop nodes
    FeedbackLoops,
    /// System property nodes
    SystemProperties,
    /// Analytical context nodes
    AnalyticalContexts,
}

impl NodeCollection {
    /// Every collection, in the fixed order used for encoding
    pub const ALL: [NodeCollection; 12] = [
        NodeCollection::Actors,
        NodeCollection::Institutions,
        NodeCollection::Resources,
        NodeCollection::Processes,
        NodeCollection::Flows,
        NodeCollection::Policies,
        NodeCollection::BeliefSystems,
        NodeCollection::TechnologySystems,
        NodeCollection::Indicators,
        NodeCollection::FeedbackLoops,
        NodeCollection::SystemProperties,
        NodeCollection::AnalyticalContexts,
    ];

    /// Key of the collection in the structured-text encoding
    pub fn name(&self) -> &'static str {
        match self {
            NodeCollection::Actors => "actors",
            NodeCollection::Institutions => "institutions",
            NodeCollection::Resources => "resources",
            NodeCollection::Processes => "processes",
            NodeCollection::Flows => "flows",
            NodeCollection::Policies => "policies",
            NodeCollection::BeliefSystems => "belief_systems",
            NodeCollection::TechnologySystems => "technology_systems",
            NodeCollection::Indicators => "indicators",
            NodeCollection::FeedbackLoops => "feedback_loops",
            NodeCollection::SystemProperties => "system_properties",
            NodeCollection::AnalyticalContexts => "analytical_contexts",
        }
    }

    /// True if nodes of `kind` belong in this collection
    pub fn accepts(&self, kind: &NodeKind) -> bool {
        kind.collection() == *self
    }
}

impl fmt::Display for NodeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Graph node: common fields plus a kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier
    pub id: NodeId,
    /// Human-readable label
    pub label: String,
    /// Optional long description
    pub description: Option<String>,
    /// Free-form key/value metadata
    pub meta: BTreeMap<String, String>,
    /// Schema version of the node record
    pub version: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub modified_at: Option<DateTime<Utc>>,
    /// Confidence level (0-1)
    pub certainty: Option<f64>,
    /// Description of data quality
    pub data_quality: Option<String>,
    /// Kind-specific fields
    pub kind: NodeKind,
}

impl Node {
    /// Create a node with a fresh id
    pub fn new(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            description: None,
            meta: BTreeMap::new(),
            version: 1,
            created_at: Utc::now(),
            modified_at: None,
            certainty: Some(1.0),
            data_quality: None,
            kind,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Use a specific id instead of a generated one
    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    /// Collection this node belongs in
    pub fn collection(&self) -> NodeCollection {
        self.kind.collection()
    }
}
