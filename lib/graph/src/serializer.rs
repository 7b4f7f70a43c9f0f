//! Conversion between [`Flow`] and the backend wire document.
//!
//! Writing is total. Reading recovers as much of a damaged document as it
//! can and reports every repair as a [`LoadWarning`]; the only fatal case is
//! a document with no usable nodes.
//!
//! Reading works in two passes: nodes first, so that every edge destination
//! can then be resolved against the complete node-id set.

use crate::edge::{Edge, TransitionCondition};
use crate::error::WireError;
use crate::flow::{Flow, FlowSettings};
use crate::node::{Instruction, Node, NodeConfig};
use crate::registry::NodeType;
use crate::wire::{
    WireEdge, WireFlow, WireInstruction, WireNode, WireTransferDestination,
    WireTransitionCondition,
};
use callflow_core::{EdgeId, FlowId, NodeId};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// A repair made while reading a wire document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A node had no usable id and was dropped.
    MissingNodeId { index: usize },
    /// A node's type tag isn't known; the node was dropped.
    UnknownNodeType { node_id: String, node_type: String },
    /// A second node used an id already taken; it was dropped.
    DuplicateNodeId { node_id: NodeId },
    /// An edge pointed at a node that doesn't exist; it was kept as an
    /// unconnected transition.
    DanglingEdge {
        node_id: NodeId,
        edge_id: EdgeId,
        destination: String,
    },
    /// An edge had no id; a fresh one was assigned.
    MissingEdgeId { node_id: NodeId, assigned: EdgeId },
    /// An edge reused an id already taken in the flow; a fresh one was
    /// assigned.
    DuplicateEdgeId {
        node_id: NodeId,
        edge_id: EdgeId,
        assigned: EdgeId,
    },
    /// An edge had no usable transition condition; the default was used.
    MissingCondition { node_id: NodeId, edge_id: EdgeId },
    /// A node's instruction is of a kind the editor doesn't support; it was
    /// dropped.
    UnsupportedInstruction { node_id: NodeId },
    /// The document's start node was missing or unknown.
    StartNodeRepaired {
        requested: Option<String>,
        start_node_id: NodeId,
    },
    /// The document's flow id was blank and was ignored.
    InvalidFlowId { value: String },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNodeId { index } => write!(f, "node #{index} has no id; dropped"),
            Self::UnknownNodeType { node_id, node_type } => {
                write!(f, "node {node_id} has unknown type '{node_type}'; dropped")
            }
            Self::DuplicateNodeId { node_id } => {
                write!(f, "duplicate node id {node_id}; later node dropped")
            }
            Self::DanglingEdge {
                node_id,
                edge_id,
                destination,
            } => write!(
                f,
                "edge {edge_id} on node {node_id} points at unknown node {destination}; \
                 left unconnected"
            ),
            Self::MissingEdgeId { node_id, assigned } => {
                write!(f, "edge on node {node_id} had no id; assigned {assigned}")
            }
            Self::DuplicateEdgeId {
                node_id,
                edge_id,
                assigned,
            } => write!(
                f,
                "edge id {edge_id} on node {node_id} is already taken; assigned {assigned}"
            ),
            Self::MissingCondition { node_id, edge_id } => write!(
                f,
                "edge {edge_id} on node {node_id} had no condition; using the default"
            ),
            Self::UnsupportedInstruction { node_id } => {
                write!(f, "node {node_id} has an unsupported instruction; dropped")
            }
            Self::StartNodeRepaired {
                requested,
                start_node_id,
            } => match requested {
                Some(requested) => write!(
                    f,
                    "start node {requested} not found; using {start_node_id}"
                ),
                None => write!(f, "no start node given; using {start_node_id}"),
            },
            Self::InvalidFlowId { value } => write!(f, "flow id '{value}' is invalid; ignored"),
        }
    }
}

/// A value read from a wire document, with the repairs that were needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    pub warnings: Vec<LoadWarning>,
}

impl<T> Loaded<T> {
    /// Returns whether the document was read without repairs.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Discards the warnings.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Converts a flow into its wire document.
#[must_use]
pub fn to_wire(flow: &Flow) -> WireFlow {
    let settings = &flow.settings;
    WireFlow {
        id: flow.id().map(|id| id.to_string()),
        name: flow.name.clone(),
        description: settings.description.clone(),
        model_choice: settings.model_choice.clone(),
        start_speaker: settings.start_speaker,
        global_prompt: flow.global_prompt.clone(),
        start_node_id: Some(flow.start_node_id().to_string()),
        nodes: flow.nodes().map(node_to_wire).collect(),
        tools: settings.tools.clone(),
        knowledge_base_ids: settings.knowledge_base_ids.clone(),
        default_dynamic_variables: settings.default_dynamic_variables.clone(),
        begin_tag_position: settings.begin_tag_position,
    }
}

fn node_to_wire(node: &Node) -> WireNode {
    let (tool_id, transfer_destination) = match &node.config {
        NodeConfig::Function { tool_id } => (tool_id.clone(), None),
        NodeConfig::TransferCall { transfer_number } => (
            None,
            transfer_number
                .as_ref()
                .map(WireTransferDestination::predefined),
        ),
        NodeConfig::Conversation
        | NodeConfig::Logic
        | NodeConfig::EndCall
        | NodeConfig::PressDigit => (None, None),
    };

    WireNode {
        id: Some(node.id().to_string()),
        node_type: node.node_type().as_str().to_string(),
        name: Some(node.name.clone()),
        instruction: node.instruction.as_ref().map(|i| match i {
            Instruction::Prompt { text } => WireInstruction::Prompt { text: text.clone() },
        }),
        edges: node.edges().iter().map(edge_to_wire).collect(),
        display_position: Some(node.position),
        tool_id,
        knowledge_base_ids: node.knowledge_base_ids.clone(),
        transfer_destination,
    }
}

fn edge_to_wire(edge: &Edge) -> WireEdge {
    WireEdge {
        id: Some(edge.id().to_string()),
        destination_node_id: edge.destination().map(|d| d.to_string()),
        transition_condition: Some(match &edge.condition {
            TransitionCondition::Prompt { text } => {
                WireTransitionCondition::Prompt { prompt: text.clone() }
            }
        }),
    }
}

/// Reads a flow from its wire document.
///
/// # Errors
///
/// Returns `MalformedDocument` if no node survives recovery.
pub fn from_wire(wire: WireFlow) -> Result<Loaded<Flow>, WireError> {
    let mut warnings = Vec::new();

    // Pass 1: nodes, without edges.
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(wire.nodes.len());
    let mut pending_edges = Vec::with_capacity(wire.nodes.len());
    for (index, wire_node) in wire.nodes.into_iter().enumerate() {
        let Some(id) = wire_node
            .id
            .as_deref()
            .and_then(|raw| raw.parse::<NodeId>().ok())
        else {
            warnings.push(LoadWarning::MissingNodeId { index });
            continue;
        };
        let node_type = match wire_node.node_type.parse::<NodeType>() {
            Ok(node_type) => node_type,
            Err(_) => {
                warnings.push(LoadWarning::UnknownNodeType {
                    node_id: id.to_string(),
                    node_type: wire_node.node_type,
                });
                continue;
            }
        };
        if !seen.insert(id.clone()) {
            warnings.push(LoadWarning::DuplicateNodeId { node_id: id });
            continue;
        }

        let config = match node_type {
            NodeType::Function => NodeConfig::Function {
                tool_id: wire_node.tool_id,
            },
            NodeType::TransferCall => NodeConfig::TransferCall {
                transfer_number: wire_node.transfer_destination.map(|d| d.number),
            },
            other => NodeConfig::default_for(other),
        };
        let name = wire_node
            .name
            .unwrap_or_else(|| node_type.info().default_name.to_string());
        let mut node = Node::new(
            id,
            name,
            config,
            wire_node.display_position.unwrap_or_default(),
        );
        node.instruction = match wire_node.instruction {
            Some(WireInstruction::Prompt { text }) => Some(Instruction::Prompt { text }),
            Some(WireInstruction::Unsupported) => {
                warnings.push(LoadWarning::UnsupportedInstruction {
                    node_id: node.id().clone(),
                });
                None
            }
            None => None,
        };
        node.knowledge_base_ids = wire_node.knowledge_base_ids;

        nodes.push(node);
        pending_edges.push(wire_node.edges);
    }

    if nodes.is_empty() {
        return Err(WireError::MalformedDocument {
            reason: "document contains no usable nodes".to_string(),
        });
    }

    // Pass 2: edges, resolved against the surviving node ids. Edge ids must
    // be unique across the whole flow, not just per node.
    let mut edge_ids = HashSet::new();
    for (node, wire_edges) in nodes.iter_mut().zip(pending_edges) {
        for wire_edge in wire_edges {
            let edge = edge_from_wire(node.id(), wire_edge, &seen, &mut edge_ids, &mut warnings);
            node.push_edge(edge);
        }
    }

    let requested = wire.start_node_id;
    let start_node_id = match requested
        .as_deref()
        .and_then(|raw| raw.parse::<NodeId>().ok())
        .filter(|id| seen.contains(id))
    {
        Some(id) => id,
        None => {
            let fallback = nodes[0].id().clone();
            warnings.push(LoadWarning::StartNodeRepaired {
                requested,
                start_node_id: fallback.clone(),
            });
            fallback
        }
    };

    let id = match wire.id {
        Some(raw) => match raw.parse::<FlowId>() {
            Ok(id) => Some(id),
            Err(_) => {
                warnings.push(LoadWarning::InvalidFlowId { value: raw });
                None
            }
        },
        None => None,
    };

    for warning in &warnings {
        warn!(flow_id = ?id, warning = %warning, "repaired flow document");
    }

    let settings = FlowSettings {
        description: wire.description,
        model_choice: wire.model_choice,
        start_speaker: wire.start_speaker,
        tools: wire.tools,
        knowledge_base_ids: wire.knowledge_base_ids,
        default_dynamic_variables: wire.default_dynamic_variables,
        begin_tag_position: wire.begin_tag_position,
    };
    let flow = Flow::from_parts(
        id,
        wire.name,
        wire.global_prompt,
        settings,
        start_node_id,
        nodes,
    );
    Ok(Loaded {
        value: flow,
        warnings,
    })
}

fn edge_from_wire(
    source: &NodeId,
    wire: WireEdge,
    known: &HashSet<NodeId>,
    taken: &mut HashSet<EdgeId>,
    warnings: &mut Vec<LoadWarning>,
) -> Edge {
    let id = match wire.id.as_deref().and_then(|raw| raw.parse::<EdgeId>().ok()) {
        Some(id) if taken.contains(&id) => {
            let assigned = EdgeId::new();
            warnings.push(LoadWarning::DuplicateEdgeId {
                node_id: source.clone(),
                edge_id: id,
                assigned: assigned.clone(),
            });
            assigned
        }
        Some(id) => id,
        None => {
            let assigned = EdgeId::new();
            warnings.push(LoadWarning::MissingEdgeId {
                node_id: source.clone(),
                assigned: assigned.clone(),
            });
            assigned
        }
    };
    taken.insert(id.clone());

    let destination = match wire.destination_node_id {
        None => None,
        Some(raw) => match raw.parse::<NodeId>() {
            Ok(node_id) if known.contains(&node_id) => Some(node_id),
            _ => {
                warnings.push(LoadWarning::DanglingEdge {
                    node_id: source.clone(),
                    edge_id: id.clone(),
                    destination: raw,
                });
                None
            }
        },
    };

    let condition = match wire.transition_condition {
        Some(WireTransitionCondition::Prompt { prompt }) => {
            TransitionCondition::Prompt { text: prompt }
        }
        Some(WireTransitionCondition::Unsupported) | None => {
            warnings.push(LoadWarning::MissingCondition {
                node_id: source.clone(),
                edge_id: id.clone(),
            });
            TransitionCondition::default()
        }
    };

    Edge::with_id(id, destination, condition)
}

/// Serializes a flow as pretty-printed wire JSON.
///
/// # Errors
///
/// Returns `Json` if serialization fails.
pub fn to_json(flow: &Flow) -> Result<String, WireError> {
    Ok(serde_json::to_string_pretty(&to_wire(flow))?)
}

/// Reads a flow from wire JSON.
///
/// # Errors
///
/// Returns `Json` if the text doesn't match the wire schema, or
/// `MalformedDocument` if no node survives recovery.
pub fn from_json(json: &str) -> Result<Loaded<Flow>, WireError> {
    let wire: WireFlow = serde_json::from_str(json)?;
    from_wire(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgePatch;
    use crate::flow::{ModelChoice, StartSpeaker};
    use crate::node::{NodePatch, Position};
    use serde_json::json;

    fn sample_flow() -> Flow {
        let mut flow = Flow::new("Support line");
        flow.global_prompt = "You are a friendly receptionist.".to_string();
        flow.assign_id(FlowId::from_static("flow_123"));
        flow.settings.description = Some("Front desk".to_string());
        flow.settings.start_speaker = StartSpeaker::User;
        flow.settings
            .default_dynamic_variables
            .insert("company".to_string(), "Acme".to_string());
        flow.settings.begin_tag_position = Some(Position::new(10.0, 10.0));

        let start = flow.start_node_id().clone();
        let lookup = flow
            .add_node(NodeType::Function, Position::new(250.0, 200.0))
            .id()
            .clone();
        let transfer = flow
            .add_node(NodeType::TransferCall, Position::new(100.0, 350.0))
            .id()
            .clone();
        let end = flow
            .add_node(NodeType::EndCall, Position::new(400.0, 350.0))
            .id()
            .clone();

        flow.update_node(
            &lookup,
            NodePatch::new().with_config(NodeConfig::Function {
                tool_id: Some("tool_lookup".to_string()),
            }),
        )
        .unwrap();
        flow.update_node(
            &transfer,
            NodePatch::new().with_config(NodeConfig::TransferCall {
                transfer_number: Some("+15550100".to_string()),
            }),
        )
        .unwrap();
        flow.update_node(
            &start,
            NodePatch::new().with_knowledge_base_ids(vec!["kb_faq".to_string()]),
        )
        .unwrap();

        flow.add_edge(&start, &lookup).unwrap();
        let edge = flow.add_edge(&lookup, &transfer).unwrap().id().clone();
        flow.update_edge(
            &lookup,
            &edge,
            EdgePatch::new().with_condition(TransitionCondition::prompt("caller wants a human")),
        )
        .unwrap();
        flow.add_edge(&lookup, &end).unwrap();
        flow.add_edge(&lookup, &start).unwrap();
        flow
    }

    #[test]
    fn round_trip_preserves_flow() {
        let flow = sample_flow();
        let loaded = from_wire(to_wire(&flow)).unwrap();
        assert!(loaded.is_clean(), "{:?}", loaded.warnings);
        assert_eq!(loaded.value, flow);
    }

    #[test]
    fn json_round_trip_preserves_flow() {
        let flow = sample_flow();
        let json = to_json(&flow).unwrap();
        let loaded = from_json(&json).unwrap();
        assert_eq!(loaded.into_value(), flow);
    }

    #[test]
    fn round_trip_keeps_unresolved_transitions() {
        let mut flow = Flow::new("draft");
        let start = flow.start_node_id().clone();
        flow.add_transition(&start).unwrap();
        let loaded = from_wire(to_wire(&flow)).unwrap();
        assert!(loaded.is_clean());
        assert_eq!(loaded.value, flow);
    }

    #[test]
    fn minimal_flow_round_trip() {
        let wire: WireFlow = serde_json::from_value(json!({
            "name": "Minimal",
            "global_prompt": "",
            "start_node_id": "start",
            "nodes": [{
                "id": "start",
                "type": "conversation",
                "name": "Start",
                "instruction": { "type": "prompt", "text": "Hello" },
                "edges": [],
                "display_position": { "x": 0.0, "y": 0.0 }
            }]
        }))
        .unwrap();

        let loaded = from_wire(wire.clone()).unwrap();
        assert!(loaded.is_clean());
        let flow = loaded.value;
        assert_eq!(flow.node_count(), 1);
        assert_eq!(flow.edge_count(), 0);
        assert_eq!(flow.start_node_id().as_str(), "start");

        let written = to_wire(&flow);
        assert_eq!(written.nodes, wire.nodes);
        assert_eq!(written.start_node_id, wire.start_node_id);
    }

    #[test]
    fn connected_pair_round_trip() {
        let document = json!({
            "name": "Pair",
            "global_prompt": "Be brief.",
            "start_node_id": "a",
            "nodes": [
                {
                    "id": "a",
                    "type": "conversation",
                    "name": "Ask",
                    "instruction": { "type": "prompt", "text": "Ask what they need" },
                    "edges": [{
                        "id": "e1",
                        "destination_node_id": "b",
                        "transition_condition": { "type": "prompt", "prompt": "user done" }
                    }],
                    "display_position": { "x": 0.0, "y": 0.0 }
                },
                {
                    "id": "b",
                    "type": "end_call",
                    "name": "Bye",
                    "instruction": null,
                    "edges": [],
                    "display_position": { "x": 0.0, "y": 150.0 }
                }
            ]
        });

        let flow = from_json(&document.to_string()).unwrap().value;
        let a = flow.node(&NodeId::from_static("a")).unwrap();
        assert_eq!(a.edges().len(), 1);
        let edge = &a.edges()[0];
        assert_eq!(edge.id().as_str(), "e1");
        assert_eq!(edge.destination().map(NodeId::as_str), Some("b"));
        assert_eq!(edge.condition.text(), "user done");

        let written = serde_json::to_value(to_wire(&flow)).unwrap();
        assert_eq!(written["nodes"], document["nodes"]);
        assert_eq!(written["start_node_id"], json!("a"));
        assert_eq!(written["global_prompt"], json!("Be brief."));
    }

    #[test]
    fn type_specific_settings_use_backend_fields() {
        let flow = sample_flow();
        let value = serde_json::to_value(to_wire(&flow)).unwrap();
        let nodes = value["nodes"].as_array().unwrap();

        let function = nodes.iter().find(|n| n["type"] == "function").unwrap();
        assert_eq!(function["tool_id"], json!("tool_lookup"));

        let transfer = nodes.iter().find(|n| n["type"] == "transfer_call").unwrap();
        assert_eq!(
            transfer["transfer_destination"],
            json!({ "type": "predefined", "number": "+15550100" })
        );

        assert_eq!(value["id"], json!("flow_123"));
        assert_eq!(value["begin_tag_display_position"], json!({ "x": 10.0, "y": 10.0 }));
        assert_eq!(value["default_dynamic_variables"]["company"], json!("Acme"));
        assert_eq!(
            serde_json::from_value::<ModelChoice>(value["model_choice"].clone()).unwrap(),
            ModelChoice::default()
        );
    }

    #[test]
    fn damaged_document_is_repaired() {
        let document = json!({
            "name": "Damaged",
            "start_node_id": "ghost",
            "nodes": [
                {
                    "id": "a",
                    "type": "conversation",
                    "edges": [
                        { "id": "e1", "destination_node_id": "b",
                          "transition_condition": { "type": "prompt", "prompt": "ok" } },
                        { "id": "e2", "destination_node_id": "missing",
                          "transition_condition": { "type": "prompt", "prompt": "lost" } },
                        { "destination_node_id": "b",
                          "transition_condition": { "type": "prompt", "prompt": "no id" } },
                        { "id": "e4", "destination_node_id": "webhook" }
                    ]
                },
                { "id": "b", "type": "end_call", "name": "Bye" },
                { "id": "a", "type": "logic", "name": "Duplicate" },
                { "id": "webhook", "type": "webhook" },
                { "type": "conversation" }
            ]
        });

        let loaded = from_json(&document.to_string()).unwrap();
        let flow = &loaded.value;

        assert_eq!(flow.node_count(), 2);
        assert_eq!(flow.start_node_id().as_str(), "a");
        let a = flow.node(&NodeId::from_static("a")).unwrap();
        assert_eq!(a.node_type(), NodeType::Conversation);
        assert_eq!(a.name, "Conversation");
        assert_eq!(a.edges().len(), 4);
        for (_, edge) in flow.edges() {
            if let Some(destination) = edge.destination() {
                assert!(flow.contains(destination));
            }
        }
        let unconnected: Vec<_> = a
            .edges()
            .iter()
            .filter(|e| !e.is_resolved())
            .map(|e| e.id().as_str())
            .collect();
        assert_eq!(unconnected, vec!["e2", "e4"]);
        assert_eq!(a.edge(&EdgeId::from_static("e2")).unwrap().condition.text(), "lost");

        assert_eq!(loaded.warnings.len(), 8, "{:?}", loaded.warnings);
        assert!(loaded.warnings.contains(&LoadWarning::MissingNodeId { index: 4 }));
        assert!(
            loaded
                .warnings
                .iter()
                .any(|w| matches!(w, LoadWarning::MissingEdgeId { .. }))
        );
        assert!(loaded.warnings.contains(&LoadWarning::DuplicateNodeId {
            node_id: NodeId::from_static("a")
        }));
        assert!(loaded.warnings.contains(&LoadWarning::UnknownNodeType {
            node_id: "webhook".to_string(),
            node_type: "webhook".to_string()
        }));
        assert!(loaded.warnings.contains(&LoadWarning::DanglingEdge {
            node_id: NodeId::from_static("a"),
            edge_id: EdgeId::from_static("e2"),
            destination: "missing".to_string()
        }));
        assert!(loaded.warnings.contains(&LoadWarning::DanglingEdge {
            node_id: NodeId::from_static("a"),
            edge_id: EdgeId::from_static("e4"),
            destination: "webhook".to_string()
        }));
        assert!(loaded.warnings.contains(&LoadWarning::MissingCondition {
            node_id: NodeId::from_static("a"),
            edge_id: EdgeId::from_static("e4")
        }));
        assert!(loaded.warnings.contains(&LoadWarning::StartNodeRepaired {
            requested: Some("ghost".to_string()),
            start_node_id: NodeId::from_static("a")
        }));
    }

    #[test]
    fn missing_condition_gets_default() {
        let document = json!({
            "name": "x",
            "start_node_id": "a",
            "nodes": [
                {
                    "id": "a",
                    "type": "logic",
                    "edges": [{ "id": "e1", "destination_node_id": "b" }]
                },
                { "id": "b", "type": "end_call" }
            ]
        });
        let loaded = from_json(&document.to_string()).unwrap();
        let edge = &loaded.value.node(&NodeId::from_static("a")).unwrap().edges()[0];
        assert_eq!(edge.condition, TransitionCondition::default());
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].to_string().contains("no condition"));
    }

    #[test]
    fn repeated_edge_ids_are_reassigned() {
        let document = json!({
            "name": "Loop",
            "start_node_id": "a",
            "nodes": [
                {
                    "id": "a",
                    "type": "conversation",
                    "edges": [
                        { "id": "e1", "destination_node_id": "b",
                          "transition_condition": { "type": "prompt", "prompt": "next" } },
                        { "id": "e1", "destination_node_id": "a",
                          "transition_condition": { "type": "prompt", "prompt": "again" } }
                    ]
                },
                {
                    "id": "b",
                    "type": "conversation",
                    "edges": [
                        { "id": "e1", "destination_node_id": "a",
                          "transition_condition": { "type": "prompt", "prompt": "back" } }
                    ]
                }
            ]
        });

        let loaded = from_json(&document.to_string()).unwrap();
        let flow = &loaded.value;

        let ids: HashSet<_> = flow.edges().map(|(_, e)| e.id().clone()).collect();
        assert_eq!(ids.len(), 3);
        let a = flow.node(&NodeId::from_static("a")).unwrap();
        assert_eq!(a.edges()[0].id().as_str(), "e1");
        assert_eq!(a.edges()[1].condition.text(), "again");

        let duplicates: Vec<_> = loaded
            .warnings
            .iter()
            .filter_map(|w| match w {
                LoadWarning::DuplicateEdgeId { node_id, edge_id, .. } => {
                    Some((node_id.as_str(), edge_id.as_str()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(duplicates, vec![("a", "e1"), ("b", "e1")]);
    }

    #[test]
    fn unsupported_payloads_are_dropped_with_warnings() {
        let document = json!({
            "name": "Mixed",
            "start_node_id": "a",
            "nodes": [
                {
                    "id": "a",
                    "type": "conversation",
                    "instruction": { "type": "static_text", "text": "Thanks for calling." },
                    "edges": [{
                        "id": "e1",
                        "destination_node_id": "b",
                        "transition_condition": { "type": "equation", "equations": [] }
                    }],
                    "display_position": { "x": 30.0 }
                },
                { "id": "b", "type": "end_call" },
                { "id": "c", "name": "No type" }
            ]
        });

        let loaded = from_json(&document.to_string()).unwrap();
        let flow = &loaded.value;

        assert_eq!(flow.node_count(), 2);
        let a = flow.node(&NodeId::from_static("a")).unwrap();
        assert!(a.instruction.is_none());
        assert_eq!(a.position, Position::new(30.0, 0.0));
        assert_eq!(a.edges()[0].condition, TransitionCondition::default());
        assert_eq!(a.edges()[0].destination().map(NodeId::as_str), Some("b"));

        assert_eq!(loaded.warnings.len(), 3, "{:?}", loaded.warnings);
        assert!(loaded.warnings.contains(&LoadWarning::UnsupportedInstruction {
            node_id: NodeId::from_static("a")
        }));
        assert!(loaded.warnings.contains(&LoadWarning::MissingCondition {
            node_id: NodeId::from_static("a"),
            edge_id: EdgeId::from_static("e1")
        }));
        assert!(loaded.warnings.contains(&LoadWarning::UnknownNodeType {
            node_id: "c".to_string(),
            node_type: String::new()
        }));
    }

    #[test]
    fn flow_tools_survive_a_round_trip() {
        let document = json!({
            "name": "With tools",
            "start_node_id": "a",
            "nodes": [{ "id": "a", "type": "function", "tool_id": "tool_lookup" }],
            "tools": [{
                "type": "custom",
                "tool_id": "tool_lookup",
                "name": "lookup_order",
                "url": "https://hooks.example.com/orders",
                "method": "GET",
                "timeout_ms": 5000,
                "parameters": { "type": "object", "properties": {} },
                "headers": { "X-Api-Key": "abc" }
            }]
        });

        let loaded = from_json(&document.to_string()).unwrap();
        let tools = &loaded.value.settings.tools;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].tool_id, "tool_lookup");
        assert_eq!(tools[0].method, "GET");
        assert_eq!(tools[0].timeout_ms, Some(5000));
        assert!(tools[0].extra.contains_key("parameters"));

        let written = serde_json::to_value(to_wire(&loaded.value)).unwrap();
        assert_eq!(written["tools"], document["tools"]);
    }

    #[test]
    fn document_without_usable_nodes_is_rejected() {
        let err = from_json(r#"{ "name": "empty", "nodes": [] }"#).unwrap_err();
        assert!(matches!(err, WireError::MalformedDocument { .. }));

        let err = from_json(r#"{ "nodes": [{ "id": "x", "type": "teleport" }] }"#).unwrap_err();
        assert!(matches!(err, WireError::MalformedDocument { .. }));
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = from_json("{ not json").unwrap_err();
        assert!(matches!(err, WireError::Json { .. }));
    }
}
