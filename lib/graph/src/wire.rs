//! The backend's JSON document format for conversation flows.
//!
//! These types mirror the document field-for-field. They are deliberately
//! loose (ids and type tags are plain strings, most fields optional) so that
//! a damaged document still deserializes and the serializer can recover what
//! it can. Use [`crate::serializer`] to convert to and from [`crate::Flow`].

use crate::flow::{FlowTool, ModelChoice, StartSpeaker};
use crate::node::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A flow document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireFlow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub model_choice: ModelChoice,
    #[serde(default)]
    pub start_speaker: StartSpeaker,
    #[serde(default)]
    pub global_prompt: String,
    #[serde(default)]
    pub start_node_id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<WireNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FlowTool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_base_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_dynamic_variables: BTreeMap<String, String>,
    #[serde(
        default,
        rename = "begin_tag_display_position",
        skip_serializing_if = "Option::is_none"
    )]
    pub begin_tag_position: Option<Position>,
}

/// A node in a flow document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instruction: Option<WireInstruction>,
    #[serde(default)]
    pub edges: Vec<WireEdge>,
    #[serde(default)]
    pub display_position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_base_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_destination: Option<WireTransferDestination>,
}

/// A node instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireInstruction {
    Prompt {
        #[serde(default)]
        text: String,
    },
    /// Any other instruction kind; dropped on load.
    #[serde(other)]
    Unsupported,
}

/// An outgoing edge of a node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireEdge {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub destination_node_id: Option<String>,
    #[serde(default)]
    pub transition_condition: Option<WireTransitionCondition>,
}

/// When an edge is taken. Note the payload key is `prompt`, not `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireTransitionCondition {
    Prompt {
        #[serde(default)]
        prompt: String,
    },
    /// Any other condition kind; replaced by the default on load.
    #[serde(other)]
    Unsupported,
}

/// Transfer target of a transfer_call node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransferDestination {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
}

impl WireTransferDestination {
    /// Destination kind for a fixed phone number.
    pub const PREDEFINED: &'static str = "predefined";

    /// Creates a fixed-number destination.
    #[must_use]
    pub fn predefined(number: impl Into<String>) -> Self {
        Self {
            kind: Self::PREDEFINED.to_string(),
            number: number.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_payloads_use_backend_keys() {
        let edge = WireEdge {
            id: Some("e1".into()),
            destination_node_id: Some("b".into()),
            transition_condition: Some(WireTransitionCondition::Prompt {
                prompt: "user done".into(),
            }),
        };
        assert_eq!(
            serde_json::to_value(&edge).unwrap(),
            json!({
                "id": "e1",
                "destination_node_id": "b",
                "transition_condition": { "type": "prompt", "prompt": "user done" }
            })
        );

        let instruction = WireInstruction::Prompt { text: "Hi".into() };
        assert_eq!(
            serde_json::to_value(&instruction).unwrap(),
            json!({ "type": "prompt", "text": "Hi" })
        );
    }

    #[test]
    fn optional_fields_are_omitted_when_empty() {
        let node = WireNode {
            id: Some("a".into()),
            node_type: "logic".into(),
            ..WireNode::default()
        };
        let value = serde_json::to_value(&node).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("tool_id"));
        assert!(!object.contains_key("knowledge_base_ids"));
        assert!(!object.contains_key("transfer_destination"));
        assert_eq!(object["instruction"], serde_json::Value::Null);
    }

    #[test]
    fn sparse_documents_deserialize() {
        let flow: WireFlow = serde_json::from_value(json!({
            "name": "Sparse",
            "nodes": [{ "type": "conversation" }]
        }))
        .unwrap();
        assert_eq!(flow.model_choice, ModelChoice::default());
        assert_eq!(flow.start_speaker, StartSpeaker::Agent);
        assert!(flow.nodes[0].id.is_none());
        assert!(flow.nodes[0].edges.is_empty());
    }

    #[test]
    fn model_choice_uses_type_key() {
        let flow = WireFlow::default();
        let value = serde_json::to_value(&flow).unwrap();
        assert_eq!(
            value["model_choice"],
            json!({ "type": "cascading", "model": "gpt-4.1" })
        );
        assert_eq!(value["start_speaker"], json!("agent"));
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn unknown_payload_kinds_still_deserialize() {
        let node: WireNode = serde_json::from_value(json!({
            "id": "a",
            "instruction": { "type": "static_text", "text": "Hello" },
            "edges": [{
                "id": "e1",
                "destination_node_id": "b",
                "transition_condition": { "type": "equation", "equations": [] }
            }],
            "display_position": { "x": 40.0 }
        }))
        .unwrap();
        assert_eq!(node.node_type, "");
        assert_eq!(node.instruction, Some(WireInstruction::Unsupported));
        assert_eq!(
            node.edges[0].transition_condition,
            Some(WireTransitionCondition::Unsupported)
        );
        assert_eq!(node.display_position, Some(Position::new(40.0, 0.0)));
    }
}
