//! The flow document and its graph operations.
//!
//! A `Flow` owns its nodes, and each node owns its outgoing edges. All
//! mutation goes through the methods here so that the model invariants hold
//! after every call:
//!
//! - node ids are unique
//! - every connected edge points at a node of this flow
//! - the start node exists
//!
//! Operations are agnostic of node types; type-specific defaults come from
//! the registry at creation time only.

use crate::edge::{Edge, EdgePatch, TransitionCondition};
use crate::error::{GraphError, ValidationError};
use crate::node::{Node, NodePatch, Position};
use crate::registry::NodeType;
use callflow_core::{EdgeId, FlowId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Id of the node every new flow starts with.
pub const START_NODE_ID: &str = "start";

/// Where the start node of a new flow is placed.
const START_NODE_POSITION: Position = Position::new(250.0, 50.0);

/// Language model used by the voice platform to run the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelChoice {
    /// Model pipeline kind (e.g. "cascading").
    #[serde(rename = "type")]
    pub kind: String,
    /// Model name.
    pub model: String,
}

impl Default for ModelChoice {
    fn default() -> Self {
        Self {
            kind: "cascading".to_string(),
            model: "gpt-4.1".to_string(),
        }
    }
}

/// Who speaks first when a call connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSpeaker {
    #[default]
    Agent,
    User,
}

/// A custom tool the flow's function nodes can call.
///
/// Keys the editor doesn't model are kept in `extra` so that a loaded
/// document saves back without losing them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowTool {
    /// Tool kind; the backend uses "custom".
    #[serde(default = "default_tool_kind", rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tool_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Endpoint the platform calls.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_tool_method")]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_tool_kind() -> String {
    "custom".to_string()
}

fn default_tool_method() -> String {
    "POST".to_string()
}

/// Flow-wide settings that don't belong to any node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowSettings {
    /// Free-text description.
    pub description: Option<String>,
    /// Model configuration.
    pub model_choice: ModelChoice,
    /// Who speaks first.
    pub start_speaker: StartSpeaker,
    /// Custom tools referenced by function nodes.
    pub tools: Vec<FlowTool>,
    /// Knowledge bases available to every node.
    pub knowledge_base_ids: Vec<String>,
    /// Default values for `{{variables}}` used in prompts.
    pub default_dynamic_variables: BTreeMap<String, String>,
    /// Canvas position of the "begin" marker.
    pub begin_tag_position: Option<Position>,
}

/// A node removed from a flow along with the edges that pointed at it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    /// The removed node, with its own outgoing edges.
    pub node: Node,
    /// Edges of other nodes that pointed at the removed node, as
    /// `(source node, edge)` pairs.
    pub incoming: Vec<(NodeId, Edge)>,
}

/// A conversation flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    id: Option<FlowId>,
    /// Display name.
    pub name: String,
    /// Prompt prepended to every node's instruction.
    pub global_prompt: String,
    /// Flow-wide settings.
    pub settings: FlowSettings,
    start_node_id: NodeId,
    nodes: Vec<Node>,
}

impl Flow {
    /// Creates an unsaved flow containing a single conversation start node.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut start = Node::from_defaults(
            NodeId::from_static(START_NODE_ID),
            NodeType::Conversation,
            START_NODE_POSITION,
        );
        start.name = "Start".to_string();
        Self {
            id: None,
            name: name.into(),
            global_prompt: String::new(),
            settings: FlowSettings::default(),
            start_node_id: start.id().clone(),
            nodes: vec![start],
        }
    }

    /// Assembles a flow from already-validated parts.
    ///
    /// The caller guarantees unique node ids, resolved edge references and
    /// an existing start node.
    pub(crate) fn from_parts(
        id: Option<FlowId>,
        name: String,
        global_prompt: String,
        settings: FlowSettings,
        start_node_id: NodeId,
        nodes: Vec<Node>,
    ) -> Self {
        Self {
            id,
            name,
            global_prompt,
            settings,
            start_node_id,
            nodes,
        }
    }

    /// Returns the server-assigned id, if the flow has been saved.
    #[must_use]
    pub fn id(&self) -> Option<&FlowId> {
        self.id.as_ref()
    }

    /// Records the server-assigned id after the first save.
    pub fn assign_id(&mut self, id: FlowId) {
        self.id = Some(id);
    }

    /// Returns the start node id.
    #[must_use]
    pub fn start_node_id(&self) -> &NodeId {
        &self.start_node_id
    }

    /// Makes an existing node the start node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn set_start_node(&mut self, node_id: &NodeId) -> Result<(), GraphError> {
        if !self.contains(node_id) {
            return Err(GraphError::NodeNotFound {
                node_id: node_id.clone(),
            });
        }
        self.start_node_id = node_id.clone();
        Ok(())
    }

    /// Returns whether a node with this id exists.
    #[must_use]
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.iter().any(|n| n.id() == node_id)
    }

    /// Returns a node by id.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == node_id)
    }

    fn node_mut(&mut self, node_id: &NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id() == node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })
    }

    /// Returns all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns every edge with its source node, walking nodes in order.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &Edge)> {
        self.nodes
            .iter()
            .flat_map(|n| n.edges().iter().map(move |e| (n.id(), e)))
    }

    /// Returns the total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges().len()).sum()
    }

    /// Returns the edges pointing at a node, with their source node.
    #[must_use]
    pub fn incoming(&self, node_id: &NodeId) -> Vec<(&NodeId, &Edge)> {
        self.edges()
            .filter(|(_, e)| e.destination() == Some(node_id))
            .collect()
    }

    /// Adds a node of the given type, seeded with its registry defaults.
    pub fn add_node(&mut self, node_type: NodeType, position: Position) -> &Node {
        let mut id = NodeId::new();
        while self.contains(&id) {
            id = NodeId::new();
        }
        debug!(node_id = %id, node_type = %node_type, "adding node");
        self.nodes.push(Node::from_defaults(id, node_type, position));
        let last = self.nodes.len() - 1;
        &self.nodes[last]
    }

    /// Merges a patch into a node's mutable fields. Edges are untouched.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist, or
    /// `ConfigTypeMismatch` if the patch carries another type's config.
    pub fn update_node(&mut self, node_id: &NodeId, patch: NodePatch) -> Result<&Node, GraphError> {
        let node = self.node_mut(node_id)?;
        if let Some(config) = &patch.config {
            if config.node_type() != node.node_type() {
                return Err(GraphError::ConfigTypeMismatch {
                    node_id: node_id.clone(),
                    expected: node.node_type(),
                    found: config.node_type(),
                });
            }
        }
        node.apply(patch);
        Ok(node)
    }

    /// Deletes a node and every edge pointing at it, in one step.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist, or
    /// `StartNodeRemoval` if it is the start node.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Result<RemovedNode, GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id() == node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })?;
        if &self.start_node_id == node_id {
            return Err(GraphError::StartNodeRemoval {
                node_id: node_id.clone(),
            });
        }

        let node = self.nodes.remove(index);
        let mut incoming = Vec::new();
        for other in &mut self.nodes {
            let source = other.id().clone();
            incoming.extend(
                other
                    .remove_edges_to(node_id)
                    .into_iter()
                    .map(|edge| (source.clone(), edge)),
            );
        }

        debug!(
            node_id = %node_id,
            own_edges = node.edges().len(),
            incoming_edges = incoming.len(),
            "deleted node"
        );
        Ok(RemovedNode { node, incoming })
    }

    /// Connects `source` to `target` with a default condition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` without mutating anything if either node
    /// doesn't exist.
    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<&Edge, GraphError> {
        for id in [source, target] {
            if !self.contains(id) {
                return Err(GraphError::InvalidReference {
                    missing: id.clone(),
                });
            }
        }
        let edge = Edge::new(Some(target.clone()), TransitionCondition::default());
        debug!(source = %source, target = %target, edge_id = %edge.id(), "adding edge");
        let node = self.node_mut(source)?;
        Ok(node.push_edge(edge))
    }

    /// Adds a transition from `source` that isn't connected yet.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the source doesn't exist.
    pub fn add_transition(&mut self, source: &NodeId) -> Result<&Edge, GraphError> {
        let node = self.node_mut(source)?;
        Ok(node.push_edge(Edge::new(None, TransitionCondition::default())))
    }

    /// Points an existing transition at `target`.
    ///
    /// # Errors
    ///
    /// Same as [`Flow::update_edge`].
    pub fn connect_edge(
        &mut self,
        source: &NodeId,
        edge_id: &EdgeId,
        target: &NodeId,
    ) -> Result<&Edge, GraphError> {
        self.update_edge(source, edge_id, EdgePatch::new().with_destination(target.clone()))
    }

    /// Updates an edge's condition and/or destination.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound`/`EdgeNotFound` if the owning node or edge is
    /// missing, or `InvalidReference` if the new destination doesn't exist.
    pub fn update_edge(
        &mut self,
        source: &NodeId,
        edge_id: &EdgeId,
        patch: EdgePatch,
    ) -> Result<&Edge, GraphError> {
        if let Some(destination) = &patch.destination {
            if !self.contains(destination) {
                // Report a missing owner before a bad destination.
                self.node(source).ok_or_else(|| GraphError::NodeNotFound {
                    node_id: source.clone(),
                })?;
                return Err(GraphError::InvalidReference {
                    missing: destination.clone(),
                });
            }
        }
        let node = self.node_mut(source)?;
        let edge = node
            .edge_mut(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound {
                node_id: source.clone(),
                edge_id: edge_id.clone(),
            })?;
        if let Some(condition) = patch.condition {
            edge.condition = condition;
        }
        if let Some(destination) = patch.destination {
            edge.set_destination(Some(destination));
        }
        Ok(edge)
    }

    /// Removes an edge from its source node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound`/`EdgeNotFound` if the owning node or edge is missing.
    pub fn delete_edge(&mut self, source: &NodeId, edge_id: &EdgeId) -> Result<Edge, GraphError> {
        let node = self.node_mut(source)?;
        node.remove_edge(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound {
                node_id: source.clone(),
                edge_id: edge_id.clone(),
            })
    }

    /// Checks that the flow can be persisted.
    ///
    /// # Errors
    ///
    /// Returns every problem found, in node order.
    pub fn validate_for_save(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName);
        }
        for node in &self.nodes {
            if node.name.trim().is_empty() {
                errors.push(ValidationError::EmptyNodeName {
                    node_id: node.id().clone(),
                });
            }
            for edge in node.edges().iter().filter(|e| !e.is_resolved()) {
                errors.push(ValidationError::UnresolvedTransition {
                    node_id: node.id().clone(),
                    edge_id: edge.id().clone(),
                });
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Instruction, NodeConfig};

    fn pair() -> (Flow, NodeId, NodeId) {
        let mut flow = Flow::new("Support line");
        let a = flow.node(&NodeId::from_static(START_NODE_ID)).unwrap().id().clone();
        let b = flow
            .add_node(NodeType::EndCall, Position::new(250.0, 200.0))
            .id()
            .clone();
        (flow, a, b)
    }

    fn assert_no_dangling(flow: &Flow) {
        for (source, edge) in flow.edges() {
            if let Some(destination) = edge.destination() {
                assert!(
                    flow.contains(destination),
                    "edge {} on {source} points at missing node {destination}",
                    edge.id()
                );
            }
        }
    }

    #[test]
    fn new_flow_has_start_node() {
        let flow = Flow::new("Support line");
        assert!(flow.id().is_none());
        assert_eq!(flow.node_count(), 1);
        assert_eq!(flow.start_node_id().as_str(), START_NODE_ID);
        let start = flow.node(flow.start_node_id()).unwrap();
        assert_eq!(start.node_type(), NodeType::Conversation);
    }

    #[test]
    fn add_node_assigns_fresh_ids_and_defaults() {
        let mut flow = Flow::new("f");
        let first = flow.add_node(NodeType::Function, Position::default()).id().clone();
        let second = flow.add_node(NodeType::Function, Position::default()).id().clone();
        assert_ne!(first, second);
        let node = flow.node(&first).unwrap();
        assert_eq!(node.config, NodeConfig::Function { tool_id: None });
        assert_eq!(node.name, "Function");
    }

    #[test]
    fn update_node_merges_fields() {
        let (mut flow, a, b) = pair();
        flow.add_edge(&a, &b).unwrap();

        let node = flow
            .update_node(
                &a,
                NodePatch::new()
                    .with_instruction(Some(Instruction::prompt("Say hi")))
                    .with_position(Position::new(1.0, 2.0)),
            )
            .unwrap();

        assert_eq!(node.instruction.as_ref().unwrap().text(), "Say hi");
        assert_eq!(node.position, Position::new(1.0, 2.0));
        assert_eq!(node.name, "Start");
        assert_eq!(node.edges().len(), 1);
    }

    #[test]
    fn update_node_missing_is_not_found() {
        let mut flow = Flow::new("f");
        let err = flow
            .update_node(&NodeId::from_static("nope"), NodePatch::new().with_name("x"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_node_rejects_foreign_config() {
        let (mut flow, _a, b) = pair();
        let err = flow
            .update_node(&b, NodePatch::new().with_config(NodeConfig::Logic))
            .unwrap_err();
        assert!(matches!(err, GraphError::ConfigTypeMismatch { .. }));
        assert_eq!(flow.node(&b).unwrap().node_type(), NodeType::EndCall);
    }

    #[test]
    fn add_edge_appends_exactly_one() {
        let (mut flow, a, b) = pair();
        let before = flow.node(&a).unwrap().edges().len();
        let edge_id = flow.add_edge(&a, &b).unwrap().id().clone();
        let node = flow.node(&a).unwrap();
        assert_eq!(node.edges().len(), before + 1);
        assert_eq!(node.edge(&edge_id).unwrap().destination(), Some(&b));
    }

    #[test]
    fn add_edge_to_unknown_target_is_a_no_op() {
        let (mut flow, a, _b) = pair();
        let snapshot = flow.clone();
        let err = flow.add_edge(&a, &NodeId::from_static("ghost")).unwrap_err();
        assert_eq!(
            err,
            GraphError::InvalidReference {
                missing: NodeId::from_static("ghost")
            }
        );
        assert_eq!(flow, snapshot);
    }

    #[test]
    fn add_edge_from_unknown_source_is_a_no_op() {
        let (mut flow, _a, b) = pair();
        let snapshot = flow.clone();
        let err = flow.add_edge(&NodeId::from_static("ghost"), &b).unwrap_err();
        assert!(matches!(err, GraphError::InvalidReference { .. }));
        assert_eq!(flow, snapshot);
    }

    #[test]
    fn delete_node_cascades_incoming_edges() {
        let (mut flow, a, b) = pair();
        let c = flow.add_node(NodeType::Logic, Position::default()).id().clone();
        flow.add_edge(&a, &b).unwrap();
        flow.add_edge(&a, &c).unwrap();
        flow.add_edge(&c, &b).unwrap();
        flow.add_edge(&b, &c).unwrap();

        let removed = flow.delete_node(&b).unwrap();

        assert_eq!(removed.node.id(), &b);
        assert_eq!(removed.node.edges().len(), 1);
        assert_eq!(removed.incoming.len(), 2);
        assert!(flow.incoming(&b).is_empty());
        assert_eq!(flow.edge_count(), 1);
        assert_no_dangling(&flow);
    }

    #[test]
    fn delete_then_check_leaves_source_without_edges() {
        let (mut flow, a, b) = pair();
        flow.add_edge(&a, &b).unwrap();
        flow.delete_node(&b).unwrap();
        assert!(flow.node(&a).unwrap().edges().is_empty());
    }

    #[test]
    fn delete_node_missing_is_not_found() {
        let mut flow = Flow::new("f");
        let err = flow.delete_node(&NodeId::from_static("x")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn start_node_cannot_be_deleted() {
        let (mut flow, a, b) = pair();
        let err = flow.delete_node(&a).unwrap_err();
        assert!(matches!(err, GraphError::StartNodeRemoval { .. }));

        flow.set_start_node(&b).unwrap();
        flow.delete_node(&a).unwrap();
        assert_eq!(flow.start_node_id(), &b);
    }

    #[test]
    fn set_start_node_requires_existing_node() {
        let mut flow = Flow::new("f");
        assert!(flow.set_start_node(&NodeId::from_static("x")).is_err());
        assert_eq!(flow.start_node_id().as_str(), START_NODE_ID);
    }

    #[test]
    fn update_and_delete_edge() {
        let (mut flow, a, b) = pair();
        let edge_id = flow.add_edge(&a, &b).unwrap().id().clone();

        let edge = flow
            .update_edge(
                &a,
                &edge_id,
                EdgePatch::new().with_condition(TransitionCondition::prompt("user done")),
            )
            .unwrap();
        assert_eq!(edge.condition.text(), "user done");

        let removed = flow.delete_edge(&a, &edge_id).unwrap();
        assert_eq!(removed.id(), &edge_id);
        assert_eq!(flow.edge_count(), 0);

        let err = flow.delete_edge(&a, &edge_id).unwrap_err();
        assert!(matches!(err, GraphError::EdgeNotFound { .. }));
    }

    #[test]
    fn update_edge_with_missing_owner_is_not_found() {
        let mut flow = Flow::new("f");
        let err = flow
            .update_edge(&NodeId::from_static("x"), &EdgeId::from_static("e"), EdgePatch::new())
            .unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound { .. }));
    }

    #[test]
    fn update_edge_rejects_unknown_destination() {
        let (mut flow, a, b) = pair();
        let edge_id = flow.add_edge(&a, &b).unwrap().id().clone();
        let err = flow
            .update_edge(
                &a,
                &edge_id,
                EdgePatch::new().with_destination(NodeId::from_static("ghost")),
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidReference { .. }));
        assert_eq!(
            flow.node(&a).unwrap().edge(&edge_id).unwrap().destination(),
            Some(&b)
        );
    }

    #[test]
    fn transitions_start_unresolved_and_block_save() {
        let (mut flow, a, b) = pair();
        let edge_id = flow.add_transition(&a).unwrap().id().clone();

        let errors = flow.validate_for_save().unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnresolvedTransition {
                node_id: a.clone(),
                edge_id: edge_id.clone()
            }]
        );

        flow.connect_edge(&a, &edge_id, &b).unwrap();
        assert!(flow.validate_for_save().is_ok());
    }

    #[test]
    fn empty_names_block_save() {
        let (mut flow, _a, b) = pair();
        flow.name = "  ".to_string();
        flow.update_node(&b, NodePatch::new().with_name("")).unwrap();
        let errors = flow.validate_for_save().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], ValidationError::EmptyName);
        assert_eq!(errors[1].node_id(), Some(&b));
    }
}
