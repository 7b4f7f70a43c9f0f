//! The canvas projection: what the visual layer draws.
//!
//! A [`Projection`] is always derivable from a [`Flow`] with
//! [`Projection::derive`]. The editor never re-derives on every change;
//! instead each mutation yields [`ProjectionPatch`]es that touch only the
//! entities that changed, and the host applies the same patches to its
//! rendered scene.

use callflow_core::{EdgeId, NodeId};
use callflow_graph::{Edge, Flow, Node, NodeType, Position};
use serde::Serialize;

/// Spacing of the snap grid, in canvas units.
pub const GRID_SIZE: f64 = 15.0;

/// Width of a node box.
pub const NODE_WIDTH: f64 = 180.0;

/// Height of a node box.
pub const NODE_HEIGHT: f64 = 60.0;

/// A node box on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasNode {
    pub id: NodeId,
    pub node_type: NodeType,
    pub label: String,
    /// Top-left corner of the box.
    pub position: Position,
    pub accent: &'static str,
    pub has_output_handle: bool,
    pub is_start: bool,
}

impl CanvasNode {
    pub(crate) fn from_node(node: &Node, start: &NodeId) -> Self {
        let info = node.node_type().info();
        Self {
            id: node.id().clone(),
            node_type: node.node_type(),
            label: node.name.clone(),
            position: node.position,
            accent: info.accent,
            has_output_handle: info.has_output_handle,
            is_start: node.id() == start,
        }
    }

    /// Returns whether a canvas point falls inside the box.
    #[must_use]
    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.position.x
            && point.x <= self.position.x + NODE_WIDTH
            && point.y >= self.position.y
            && point.y <= self.position.y + NODE_HEIGHT
    }
}

/// A connector line on the canvas.
///
/// A transition that isn't connected yet is drawn as a stub hanging off its
/// source (`target` is `None`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: Option<NodeId>,
    pub label: String,
}

impl CanvasEdge {
    pub(crate) fn from_edge(source: &NodeId, edge: &Edge) -> Self {
        Self {
            id: edge.id().clone(),
            source: source.clone(),
            target: edge.destination().cloned(),
            label: edge.condition.text().to_string(),
        }
    }
}

/// A localized change to the projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionPatch {
    NodeAdded { node: CanvasNode },
    NodeMoved { node_id: NodeId, position: Position },
    NodeRelabeled { node_id: NodeId, label: String },
    NodeRemoved { node_id: NodeId },
    StartChanged { node_id: NodeId },
    EdgeAdded { edge: CanvasEdge },
    EdgeRelabeled { edge_id: EdgeId, label: String },
    EdgeRetargeted { edge_id: EdgeId, target: Option<NodeId> },
    EdgeRemoved { edge_id: EdgeId },
}

/// Everything drawn on the canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Projection {
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
}

impl Projection {
    /// Derives the full projection of a flow.
    #[must_use]
    pub fn derive(flow: &Flow) -> Self {
        let start = flow.start_node_id();
        Self {
            nodes: flow
                .nodes()
                .map(|node| CanvasNode::from_node(node, start))
                .collect(),
            edges: flow
                .edges()
                .map(|(source, edge)| CanvasEdge::from_edge(source, edge))
                .collect(),
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[CanvasNode] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[CanvasEdge] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| &n.id == node_id)
    }

    #[must_use]
    pub fn edge(&self, edge_id: &EdgeId) -> Option<&CanvasEdge> {
        self.edges.iter().find(|e| &e.id == edge_id)
    }

    /// Returns the topmost node box under a canvas point.
    #[must_use]
    pub fn node_at(&self, point: Position) -> Option<&CanvasNode> {
        self.nodes.iter().rev().find(|n| n.contains(point))
    }

    /// Applies one patch. Patches naming unknown entities are ignored.
    pub fn apply(&mut self, patch: &ProjectionPatch) {
        match patch {
            ProjectionPatch::NodeAdded { node } => self.nodes.push(node.clone()),
            ProjectionPatch::NodeMoved { node_id, position } => {
                if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == node_id) {
                    node.position = *position;
                }
            }
            ProjectionPatch::NodeRelabeled { node_id, label } => {
                if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == node_id) {
                    node.label.clone_from(label);
                }
            }
            ProjectionPatch::NodeRemoved { node_id } => self.nodes.retain(|n| &n.id != node_id),
            ProjectionPatch::StartChanged { node_id } => {
                for node in &mut self.nodes {
                    node.is_start = &node.id == node_id;
                }
            }
            ProjectionPatch::EdgeAdded { edge } => self.edges.push(edge.clone()),
            ProjectionPatch::EdgeRelabeled { edge_id, label } => {
                if let Some(edge) = self.edges.iter_mut().find(|e| &e.id == edge_id) {
                    edge.label.clone_from(label);
                }
            }
            ProjectionPatch::EdgeRetargeted { edge_id, target } => {
                if let Some(edge) = self.edges.iter_mut().find(|e| &e.id == edge_id) {
                    edge.target.clone_from(target);
                }
            }
            ProjectionPatch::EdgeRemoved { edge_id } => self.edges.retain(|e| &e.id != edge_id),
        }
    }

    /// Returns whether this projection draws exactly what `flow` contains,
    /// ignoring draw order.
    #[must_use]
    pub fn matches(&self, flow: &Flow) -> bool {
        let derived = Self::derive(flow);
        if self.nodes.len() != derived.nodes.len() || self.edges.len() != derived.edges.len() {
            return false;
        }
        derived.nodes.iter().all(|n| self.node(&n.id) == Some(n))
            && derived.edges.iter().all(|e| self.edge(&e.id) == Some(e))
    }
}
