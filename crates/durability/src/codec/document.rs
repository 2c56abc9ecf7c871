//! Structured-text document model of a graph
//!
//! ```text
//! {
//!   "id": "<graph uuid>",
//!   "name": "...",
//!   "description": "...",
//!   "actors":        { "<node uuid>": { "type": "Actor", "id": ..., "label": ..., ... } },
//!   "institutions":  { ... },
//!   ...                                   (one object per node collection)
//!   "relationships": { "<rel uuid>": { "id": ..., "source_id": ..., "kind": "FUNDS", ... } },
//!   "metadata":      { "serialization_version": "1.0" }
//! }
//! ```
//!
//! Every node record carries its kind tag under `"type"` and is decoded by
//! the matching per-kind function. Decoding applies a few documented
//! defaults for absent optional fields:
//!
//! | Field                      | Default     |
//! |----------------------------|-------------|
//! | resource `rtype`           | `NATURAL`   |
//! | flow `nature`              | `TRANSFER`  |
//! | flow `flow_type`           | `MATERIAL`  |
//! | policy `enforcement`       | `0.0`       |
//! | relationship `weight`      | `1.0`       |
//! | node/relationship `certainty` | `1.0`    |
//!
//! Anything present but unresolvable (an unknown vocabulary name, a bad
//! uuid) fails the decode, as does a relationship without a `kind`.
//!
//! The document holds no wall-clock values of its own, so encoding the same
//! graph twice yields identical bytes.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use sfm_core::{
    Actor, AnalyticalContext, BeliefSystem, FeedbackLoop, FeedbackPolarity, Flow, FlowNature,
    FlowType, Graph, GraphId, Indicator, Institution, InstitutionLayer, Node, NodeCollection,
    NodeId, NodeKind, Policy, Process, Relationship, RelationshipId, RelationshipKind, Resource,
    ResourceType, SystemProperty, TechnologySystem,
};

use crate::error::{SerializationError, SerializationResult};

/// Version written under `metadata.serialization_version`
pub const SERIALIZATION_VERSION: &str = "1.0";

/// Keys that must be present at the top level before any record is decoded
const REQUIRED_KEYS: [&str; 4] = ["id", "name", "description", "relationships"];

// ============================================================================
// Encoding
// ============================================================================

/// Build the document for `graph`
pub fn graph_to_document(graph: &Graph) -> Value {
    let mut doc = Map::new();
    doc.insert("id".into(), json!(graph.id));
    doc.insert("name".into(), json!(graph.name));
    doc.insert("description".into(), json!(graph.description));

    for (collection, nodes) in graph.collections() {
        let records: Map<String, Value> = nodes
            .iter()
            .map(|(id, node)| (id.to_string(), encode_node(node)))
            .collect();
        doc.insert(collection.name().into(), Value::Object(records));
    }

    let relationships: Map<String, Value> = graph
        .relationships
        .iter()
        .map(|(id, rel)| (id.to_string(), encode_relationship(rel)))
        .collect();
    doc.insert("relationships".into(), Value::Object(relationships));
    doc.insert(
        "metadata".into(),
        json!({ "serialization_version": SERIALIZATION_VERSION }),
    );

    Value::Object(doc)
}

/// Reject NaN and infinite numbers, which a JSON document cannot hold
pub fn ensure_finite(graph: &Graph) -> SerializationResult<()> {
    for (collection, nodes) in graph.collections() {
        for (id, node) in nodes {
            check_finite(&format!("{}/{id}", collection.name()), &node_numbers(node))?;
        }
    }
    for (id, rel) in &graph.relationships {
        let mut numbers = vec![("weight", rel.weight)];
        numbers.extend(rel.certainty.map(|v| ("certainty", v)));
        check_finite(&format!("relationships/{id}"), &numbers)?;
    }
    Ok(())
}

fn node_numbers(node: &Node) -> Vec<(&'static str, f64)> {
    let mut numbers: Vec<(&'static str, f64)> = Vec::new();
    numbers.extend(node.certainty.map(|v| ("certainty", v)));
    match &node.kind {
        NodeKind::Actor(k) => {
            numbers.extend(k.power_resources.values().map(|&v| ("power_resources", v)));
            numbers.extend(k.decision_making_capacity.map(|v| ("decision_making_capacity", v)));
        }
        NodeKind::Flow(k) => numbers.extend(k.quantity.map(|v| ("quantity", v))),
        NodeKind::Policy(k) => numbers.extend(k.enforcement.map(|v| ("enforcement", v))),
        NodeKind::BeliefSystem(k) => numbers.extend(k.strength.map(|v| ("strength", v))),
        NodeKind::TechnologySystem(k) => {
            numbers.extend(k.compatibility.values().map(|&v| ("compatibility", v)));
        }
        NodeKind::Indicator(k) => {
            numbers.extend(k.current_value.map(|v| ("current_value", v)));
            numbers.extend(k.target_value.map(|v| ("target_value", v)));
            numbers.extend(k.threshold_values.values().map(|&v| ("threshold_values", v)));
        }
        NodeKind::FeedbackLoop(k) => numbers.extend(k.strength.map(|v| ("strength", v))),
        NodeKind::SystemProperty(k) => numbers.extend(k.value.map(|v| ("value", v))),
        NodeKind::Institution(_)
        | NodeKind::Resource(_)
        | NodeKind::Process(_)
        | NodeKind::AnalyticalContext(_) => {}
    }
    numbers
}

fn check_finite(context: &str, numbers: &[(&str, f64)]) -> SerializationResult<()> {
    match numbers.iter().find(|(_, v)| !v.is_finite()) {
        Some((field, v)) => Err(SerializationError::InvalidField {
            field: (*field).to_string(),
            context: context.to_string(),
            reason: format!("non-finite number {v} cannot be stored as JSON"),
        }),
        None => Ok(()),
    }
}

fn encode_node(node: &Node) -> Value {
    let mut record = Map::new();
    record.insert("type".into(), json!(node.kind.tag()));
    record.insert("id".into(), json!(node.id));
    record.insert("label".into(), json!(node.label));
    record.insert("description".into(), json!(node.description));
    record.insert("meta".into(), json!(node.meta));
    record.insert("version".into(), json!(node.version));
    record.insert("created_at".into(), json!(node.created_at));
    record.insert("modified_at".into(), json!(node.modified_at));
    record.insert("certainty".into(), json!(node.certainty));
    record.insert("data_quality".into(), json!(node.data_quality));

    match &node.kind {
        NodeKind::Actor(k) => encode_actor(k, &mut record),
        NodeKind::Institution(k) => encode_institution(k, &mut record),
        NodeKind::Resource(k) => encode_resource(k, &mut record),
        NodeKind::Process(k) => encode_process(k, &mut record),
        NodeKind::Flow(k) => encode_flow(k, &mut record),
        NodeKind::Policy(k) => encode_policy(k, &mut record),
        NodeKind::BeliefSystem(k) => encode_belief_system(k, &mut record),
        NodeKind::TechnologySystem(k) => encode_technology_system(k, &mut record),
        NodeKind::Indicator(k) => encode_indicator(k, &mut record),
        NodeKind::FeedbackLoop(k) => encode_feedback_loop(k, &mut record),
        NodeKind::SystemProperty(k) => encode_system_property(k, &mut record),
        NodeKind::AnalyticalContext(k) => encode_analytical_context(k, &mut record),
    }

    Value::Object(record)
}

fn encode_actor(actor: &Actor, record: &mut Map<String, Value>) {
    record.insert("legal_form".into(), json!(actor.legal_form));
    record.insert("sector".into(), json!(actor.sector));
    record.insert("power_resources".into(), json!(actor.power_resources));
    record.insert(
        "decision_making_capacity".into(),
        json!(actor.decision_making_capacity),
    );
}

fn encode_institution(institution: &Institution, record: &mut Map<String, Value>) {
    record.insert("layer".into(), json!(institution.layer));
    record.insert("formal_rules".into(), json!(institution.formal_rules));
    record.insert("informal_norms".into(), json!(institution.informal_norms));
}

fn encode_resource(resource: &Resource, record: &mut Map<String, Value>) {
    record.insert("rtype".into(), json!(resource.category));
    record.insert("unit".into(), json!(resource.unit));
}

fn encode_process(process: &Process, record: &mut Map<String, Value>) {
    record.insert("technology".into(), json!(process.technology));
    record.insert(
        "responsible_actor_id".into(),
        json!(process.responsible_actor_id),
    );
}

fn encode_flow(flow: &Flow, record: &mut Map<String, Value>) {
    record.insert("nature".into(), json!(flow.nature));
    record.insert("flow_type".into(), json!(flow.flow_type));
    record.insert("quantity".into(), json!(flow.quantity));
    record.insert("unit".into(), json!(flow.unit));
    record.insert("source_process_id".into(), json!(flow.source_process_id));
    record.insert("target_process_id".into(), json!(flow.target_process_id));
}

fn encode_policy(policy: &Policy, record: &mut Map<String, Value>) {
    record.insert("layer".into(), json!(policy.layer));
    record.insert("authority".into(), json!(policy.authority));
    record.insert("enforcement".into(), json!(policy.enforcement));
    record.insert("target_sectors".into(), json!(policy.target_sectors));
}

fn encode_belief_system(belief: &BeliefSystem, record: &mut Map<String, Value>) {
    record.insert("strength".into(), json!(belief.strength));
    record.insert("domain".into(), json!(belief.domain));
}

fn encode_technology_system(tech: &TechnologySystem, record: &mut Map<String, Value>) {
    record.insert("maturity".into(), json!(tech.maturity));
    record.insert("compatibility".into(), json!(tech.compatibility));
}

fn encode_indicator(indicator: &Indicator, record: &mut Map<String, Value>) {
    record.insert("measurement_unit".into(), json!(indicator.measurement_unit));
    record.insert("current_value".into(), json!(indicator.current_value));
    record.insert("target_value".into(), json!(indicator.target_value));
    record.insert("threshold_values".into(), json!(indicator.threshold_values));
}

fn encode_feedback_loop(feedback: &FeedbackLoop, record: &mut Map<String, Value>) {
    record.insert("polarity".into(), json!(feedback.polarity));
    record.insert("strength".into(), json!(feedback.strength));
    record.insert("relationships".into(), json!(feedback.relationships));
}

fn encode_system_property(property: &SystemProperty, record: &mut Map<String, Value>) {
    record.insert("value".into(), json!(property.value));
    record.insert("unit".into(), json!(property.unit));
    record.insert("affected_nodes".into(), json!(property.affected_nodes));
}

fn encode_analytical_context(context: &AnalyticalContext, record: &mut Map<String, Value>) {
    record.insert("methods_used".into(), json!(context.methods_used));
    record.insert("assumptions".into(), json!(context.assumptions));
    record.insert("data_sources".into(), json!(context.data_sources));
    record.insert(
        "validation_approach".into(),
        json!(context.validation_approach),
    );
}

fn encode_relationship(rel: &Relationship) -> Value {
    json!({
        "id": rel.id,
        "source_id": rel.source_id,
        "target_id": rel.target_id,
        "kind": rel.kind,
        "weight": rel.weight,
        "meta": rel.meta,
        "certainty": rel.certainty,
        "version": rel.version,
        "created_at": rel.created_at,
        "modified_at": rel.modified_at,
    })
}

// ============================================================================
// Decoding
// ============================================================================

/// Rebuild a graph from its document
///
/// Nodes are re-keyed by the identifier inside each record and placed in
/// the collection they were listed under, so a record filed under the wrong
/// collection survives decoding and is caught by integrity validation.
pub fn document_to_graph(doc: &Value) -> SerializationResult<Graph> {
    let top = Record::new(doc, "graph".to_string())?;
    for key in REQUIRED_KEYS {
        top.require(key)?;
    }

    if let Some(version) = top.get("metadata").and_then(|m| m.get("serialization_version")) {
        let version = version.as_str().unwrap_or_default();
        if version.split('.').next() != Some("1") {
            return Err(SerializationError::UnsupportedVersion(version.to_string()));
        }
    }

    let id: GraphId = top.id("id")?;
    let mut graph = Graph::with_id(id, top.string("name")?);
    graph.description = top.opt_string("description")?.unwrap_or_default();

    for collection in NodeCollection::ALL {
        let Some(records) = top.get(collection.name()) else {
            continue;
        };
        let records = as_object(records, collection.name(), "graph")?;
        for (key, value) in records {
            let context = format!("{}/{}", collection.name(), key);
            let node = decode_node(&Record::new(value, context)?)?;
            graph.collection_mut(collection).insert(node.id, node);
        }
    }

    let relationships = as_object(top.require("relationships")?, "relationships", "graph")?;
    for (key, value) in relationships {
        let rel = decode_relationship(&Record::new(value, format!("relationships/{key}"))?)?;
        graph.relationships.insert(rel.id, rel);
    }

    Ok(graph)
}

fn decode_node(record: &Record<'_>) -> SerializationResult<Node> {
    let tag = record.string("type")?;
    let kind = match tag.as_str() {
        "Actor" => NodeKind::Actor(decode_actor(record)?),
        "Institution" => NodeKind::Institution(decode_institution(record)?),
        "Resource" => NodeKind::Resource(decode_resource(record)?),
        "Process" => NodeKind::Process(decode_process(record)?),
        "Flow" => NodeKind::Flow(decode_flow(record)?),
        "Policy" => NodeKind::Policy(decode_policy(record)?),
        "BeliefSystem" => NodeKind::BeliefSystem(decode_belief_system(record)?),
        "TechnologySystem" => NodeKind::TechnologySystem(decode_technology_system(record)?),
        "Indicator" => NodeKind::Indicator(decode_indicator(record)?),
        "FeedbackLoop" => NodeKind::FeedbackLoop(decode_feedback_loop(record)?),
        "SystemProperty" => NodeKind::SystemProperty(decode_system_property(record)?),
        "AnalyticalContext" => NodeKind::AnalyticalContext(decode_analytical_context(record)?),
        _ => {
            return Err(SerializationError::UnknownRecordType {
                tag,
                context: record.context.clone(),
            })
        }
    };

    Ok(Node {
        id: record.id("id")?,
        label: record.string("label")?,
        description: record.opt_string("description")?,
        meta: record.typed_or_default("meta")?,
        version: record.typed("version")?.unwrap_or(1),
        created_at: record.timestamp_or_now("created_at")?,
        modified_at: record.typed("modified_at")?,
        certainty: record.certainty()?,
        data_quality: record.opt_string("data_quality")?,
        kind,
    })
}

fn decode_actor(record: &Record<'_>) -> SerializationResult<Actor> {
    Ok(Actor {
        legal_form: record.opt_string("legal_form")?,
        sector: record.opt_string("sector")?,
        power_resources: record.typed_or_default("power_resources")?,
        decision_making_capacity: record.typed("decision_making_capacity")?,
    })
}

fn decode_institution(record: &Record<'_>) -> SerializationResult<Institution> {
    Ok(Institution {
        layer: record.vocab("layer", InstitutionLayer::from_name)?,
        formal_rules: record.typed_or_default("formal_rules")?,
        informal_norms: record.typed_or_default("informal_norms")?,
    })
}

fn decode_resource(record: &Record<'_>) -> SerializationResult<Resource> {
    Ok(Resource {
        category: record
            .vocab("rtype", ResourceType::from_name)?
            .unwrap_or_default(),
        unit: record.opt_string("unit")?,
    })
}

fn decode_process(record: &Record<'_>) -> SerializationResult<Process> {
    Ok(Process {
        technology: record.opt_string("technology")?,
        responsible_actor_id: record.typed("responsible_actor_id")?,
    })
}

fn decode_flow(record: &Record<'_>) -> SerializationResult<Flow> {
    Ok(Flow {
        nature: record
            .vocab("nature", FlowNature::from_name)?
            .unwrap_or_default(),
        flow_type: record
            .vocab("flow_type", FlowType::from_name)?
            .unwrap_or_default(),
        quantity: record.typed("quantity")?,
        unit: record.opt_string("unit")?,
        source_process_id: record.typed::<NodeId>("source_process_id")?,
        target_process_id: record.typed::<NodeId>("target_process_id")?,
    })
}

fn decode_policy(record: &Record<'_>) -> SerializationResult<Policy> {
    let enforcement = if record.has("enforcement") {
        record.typed("enforcement")?
    } else {
        Some(0.0)
    };
    Ok(Policy {
        layer: record.vocab("layer", InstitutionLayer::from_name)?,
        authority: record.opt_string("authority")?,
        enforcement,
        target_sectors: record.typed_or_default("target_sectors")?,
    })
}

fn decode_belief_system(record: &Record<'_>) -> SerializationResult<BeliefSystem> {
    Ok(BeliefSystem {
        strength: record.typed("strength")?,
        domain: record.opt_string("domain")?,
    })
}

fn decode_technology_system(record: &Record<'_>) -> SerializationResult<TechnologySystem> {
    Ok(TechnologySystem {
        maturity: record.typed("maturity")?,
        compatibility: record.typed_or_default("compatibility")?,
    })
}

fn decode_indicator(record: &Record<'_>) -> SerializationResult<Indicator> {
    Ok(Indicator {
        measurement_unit: record.opt_string("measurement_unit")?,
        current_value: record.typed("current_value")?,
        target_value: record.typed("target_value")?,
        threshold_values: record.typed_or_default("threshold_values")?,
    })
}

fn decode_feedback_loop(record: &Record<'_>) -> SerializationResult<FeedbackLoop> {
    Ok(FeedbackLoop {
        polarity: record.vocab("polarity", FeedbackPolarity::from_name)?,
        strength: record.typed("strength")?,
        relationships: record.typed_or_default::<Vec<RelationshipId>>("relationships")?,
    })
}

fn decode_system_property(record: &Record<'_>) -> SerializationResult<SystemProperty> {
    Ok(SystemProperty {
        value: record.typed("value")?,
        unit: record.opt_string("unit")?,
        affected_nodes: record.typed_or_default::<Vec<NodeId>>("affected_nodes")?,
    })
}

fn decode_analytical_context(record: &Record<'_>) -> SerializationResult<AnalyticalContext> {
    Ok(AnalyticalContext {
        methods_used: record.typed_or_default("methods_used")?,
        assumptions: record.typed_or_default::<BTreeMap<String, String>>("assumptions")?,
        data_sources: record.typed_or_default::<BTreeMap<String, String>>("data_sources")?,
        validation_approach: record.opt_string("validation_approach")?,
    })
}

fn decode_relationship(record: &Record<'_>) -> SerializationResult<Relationship> {
    let kind_name = record.string("kind")?;
    let kind = RelationshipKind::from_name(&kind_name).map_err(|source| {
        SerializationError::Vocabulary {
            context: record.context.clone(),
            source,
        }
    })?;

    Ok(Relationship {
        id: record.id("id")?,
        source_id: record.id("source_id")?,
        target_id: record.id("target_id")?,
        kind,
        weight: record.typed("weight")?.unwrap_or(1.0),
        meta: record.typed_or_default("meta")?,
        certainty: record.certainty()?,
        version: record.typed("version")?.unwrap_or(1),
        created_at: record.timestamp_or_now("created_at")?,
        modified_at: record.typed("modified_at")?,
    })
}

fn as_object<'a>(
    value: &'a Value,
    field: &str,
    context: &str,
) -> SerializationResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| SerializationError::InvalidField {
            field: field.to_string(),
            context: context.to_string(),
            reason: "expected an object".to_string(),
        })
}

/// One JSON object being decoded, with its location for error messages
struct Record<'a> {
    fields: &'a Map<String, Value>,
    context: String,
}

impl<'a> Record<'a> {
    fn new(value: &'a Value, context: String) -> SerializationResult<Self> {
        match value.as_object() {
            Some(fields) => Ok(Record { fields, context }),
            None => Err(SerializationError::InvalidField {
                field: "<record>".to_string(),
                context,
                reason: "expected an object".to_string(),
            }),
        }
    }

    fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Value of `key`, treating explicit null as absent
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn require(&self, key: &str) -> SerializationResult<&'a Value> {
        self.fields
            .get(key)
            .ok_or_else(|| SerializationError::MissingKey {
                key: key.to_string(),
                context: self.context.clone(),
            })
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> SerializationError {
        SerializationError::InvalidField {
            field: key.to_string(),
            context: self.context.clone(),
            reason: reason.into(),
        }
    }

    fn string(&self, key: &str) -> SerializationResult<String> {
        self.require(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(key, "expected a string"))
    }

    fn opt_string(&self, key: &str) -> SerializationResult<Option<String>> {
        self.typed(key)
    }

    fn id<T: DeserializeOwned>(&self, key: &str) -> SerializationResult<T> {
        let value = self.require(key)?;
        serde_json::from_value(value.clone())
            .map_err(|e| self.invalid(key, format!("expected a uuid string: {e}")))
    }

    /// Deserialize `key` if present and non-null
    fn typed<T: DeserializeOwned>(&self, key: &str) -> SerializationResult<Option<T>> {
        match self.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| self.invalid(key, e.to_string())),
            None => Ok(None),
        }
    }

    fn typed_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> SerializationResult<T> {
        Ok(self.typed(key)?.unwrap_or_default())
    }

    fn vocab<T>(
        &self,
        key: &str,
        resolve: fn(&str) -> sfm_core::Result<T>,
    ) -> SerializationResult<Option<T>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let name = value
            .as_str()
            .ok_or_else(|| self.invalid(key, "expected a vocabulary name"))?;
        resolve(name)
            .map(Some)
            .map_err(|source| SerializationError::Vocabulary {
                context: format!("{}.{}", self.context, key),
                source,
            })
    }

    fn timestamp_or_now(&self, key: &str) -> SerializationResult<DateTime<Utc>> {
        Ok(self.typed(key)?.unwrap_or_else(Utc::now))
    }

    /// Absent means full certainty; explicit null means unknown
    fn certainty(&self) -> SerializationResult<Option<f64>> {
        if self.has("certainty") {
            self.typed("certainty")
        } else {
            Ok(Some(1.0))
        }
    }
}
