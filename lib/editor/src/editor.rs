//! Canvas gestures routed through the flow model.
//!
//! The editor owns the [`Flow`] and its canvas [`Projection`]. Every gesture
//! mutates the flow first; only when the model accepts the change does the
//! editor emit the matching [`ProjectionPatch`]es and apply them to its own
//! projection. A rejected gesture draws nothing.
//!
//! Ephemeral UI state (selection, hover, an in-progress drag or connection)
//! lives here and never touches the flow.

use crate::canvas::{
    CanvasEdge, CanvasNode, GRID_SIZE, NODE_HEIGHT, NODE_WIDTH, Projection, ProjectionPatch,
};
use crate::error::EditorError;
use crate::inspector::NodeInspector;
use callflow_core::{EdgeId, FlowId, NodeId};
use callflow_graph::{EdgePatch, Flow, FlowLint, GraphError, NodePatch, NodeType, Position};
use tracing::debug;

/// A node drag in progress.
#[derive(Debug, Clone, PartialEq)]
struct Drag {
    node_id: NodeId,
    /// Node position when the drag started.
    origin: Position,
    /// Pointer position when the drag started.
    grab: Position,
}

/// Editor state for one open flow.
#[derive(Debug, Clone)]
pub struct GraphEditor {
    flow: Flow,
    projection: Projection,
    selection: Option<NodeId>,
    hover: Option<NodeId>,
    drag: Option<Drag>,
    connecting_from: Option<NodeId>,
    revision: u64,
}

impl GraphEditor {
    /// Opens a flow for editing.
    #[must_use]
    pub fn new(flow: Flow) -> Self {
        let projection = Projection::derive(&flow);
        Self {
            flow,
            projection,
            selection: None,
            hover: None,
            drag: None,
            connecting_from: None,
            revision: 0,
        }
    }

    /// Returns the flow being edited.
    #[must_use]
    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    /// Returns the current canvas projection.
    #[must_use]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Returns a counter that increases with every accepted mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn selected(&self) -> Option<&NodeId> {
        self.selection.as_ref()
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&NodeId> {
        self.hover.as_ref()
    }

    #[must_use]
    pub fn connecting_from(&self) -> Option<&NodeId> {
        self.connecting_from.as_ref()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Returns structural lints for the flow.
    #[must_use]
    pub fn lints(&self) -> Vec<FlowLint> {
        callflow_graph::lint(&self.flow)
    }

    pub(crate) fn assign_flow_id(&mut self, flow_id: FlowId) {
        self.flow.assign_id(flow_id);
    }

    fn require_node(&self, node_id: &NodeId) -> Result<(), EditorError> {
        if self.flow.contains(node_id) {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound {
                node_id: node_id.clone(),
            }
            .into())
        }
    }

    /// Applies patches to the projection and records the mutation.
    fn commit(&mut self, patches: Vec<ProjectionPatch>) -> Vec<ProjectionPatch> {
        for patch in &patches {
            self.projection.apply(patch);
        }
        self.revision += 1;
        patches
    }

    // Palette

    /// Drops a node from the palette at a canvas point.
    ///
    /// The box is centred on the pointer and snapped to the grid. The model
    /// always accepts a new node.
    pub fn drop_node(&mut self, node_type: NodeType, point: Position) -> Vec<ProjectionPatch> {
        let position = point
            .offset(-NODE_WIDTH / 2.0, -NODE_HEIGHT / 2.0)
            .snapped(GRID_SIZE);
        let start = self.flow.start_node_id().clone();
        let node = self.flow.add_node(node_type, position);
        let canvas = CanvasNode::from_node(node, &start);
        debug!(node_id = %canvas.id, node_type = %node_type, "dropped node");
        self.commit(vec![ProjectionPatch::NodeAdded { node: canvas }])
    }

    // Selection and hover

    /// Selects a node, handing it to the inspector.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn click_node(&mut self, node_id: &NodeId) -> Result<(), EditorError> {
        self.require_node(node_id)?;
        self.selection = Some(node_id.clone());
        Ok(())
    }

    /// Clears the selection, e.g. on a click on empty canvas.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Records which node the pointer is over.
    pub fn hover(&mut self, node_id: Option<NodeId>) {
        self.hover = node_id.filter(|id| self.flow.contains(id));
    }

    // Dragging

    /// Starts dragging a node. The node becomes selected.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn begin_drag(&mut self, node_id: &NodeId, pointer: Position) -> Result<(), EditorError> {
        let origin = self
            .flow
            .node(node_id)
            .map(|n| n.position)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })?;
        self.selection = Some(node_id.clone());
        self.drag = Some(Drag {
            node_id: node_id.clone(),
            origin,
            grab: pointer,
        });
        Ok(())
    }

    /// Moves the dragged node with the pointer, snapped to the grid.
    ///
    /// Returns no patches when nothing is being dragged or the snapped
    /// position didn't change.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the dragged node has gone away.
    pub fn drag_to(&mut self, pointer: Position) -> Result<Vec<ProjectionPatch>, EditorError> {
        let Some(drag) = &self.drag else {
            return Ok(Vec::new());
        };
        let position = drag
            .origin
            .offset(pointer.x - drag.grab.x, pointer.y - drag.grab.y)
            .snapped(GRID_SIZE);
        let node_id = drag.node_id.clone();
        if self.flow.node(&node_id).map(|n| n.position) == Some(position) {
            return Ok(Vec::new());
        }
        self.move_node(&node_id, position)
    }

    /// Ends the current drag.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Moves a node to an exact position.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn move_node(
        &mut self,
        node_id: &NodeId,
        position: Position,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.update_node(node_id, NodePatch::new().with_position(position))
    }

    // Connecting

    /// Starts drawing a transition from a node's output handle.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist, or `NoOutputHandle`
    /// if its type can't have outgoing transitions.
    pub fn begin_connection(&mut self, source: &NodeId) -> Result<(), EditorError> {
        self.require_output_handle(source)?;
        self.connecting_from = Some(source.clone());
        Ok(())
    }

    /// Abandons the connection being drawn.
    pub fn cancel_connection(&mut self) {
        self.connecting_from = None;
    }

    /// Finishes the connection being drawn on `target`.
    ///
    /// The connection state is cleared whether or not the edge is accepted.
    ///
    /// # Errors
    ///
    /// Returns `NoConnectionInProgress` if no connection was started, or
    /// any error from [`GraphEditor::connect`].
    pub fn complete_connection(
        &mut self,
        target: &NodeId,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        let source = self
            .connecting_from
            .take()
            .ok_or(EditorError::NoConnectionInProgress)?;
        self.connect(&source, target)
    }

    /// Connects two nodes with a new transition.
    ///
    /// The edge is added to the model first; the connector is only drawn
    /// once the model has accepted it.
    ///
    /// # Errors
    ///
    /// Returns `NoOutputHandle` if the source can't have transitions, or
    /// `InvalidReference` if either node doesn't exist.
    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        if self.flow.contains(source) {
            self.require_output_handle(source)?;
        }
        let edge = self.flow.add_edge(source, target)?;
        let canvas = CanvasEdge::from_edge(source, edge);
        debug!(source = %source, target = %target, edge_id = %canvas.id, "connected nodes");
        Ok(self.commit(vec![ProjectionPatch::EdgeAdded { edge: canvas }]))
    }

    fn require_output_handle(&self, node_id: &NodeId) -> Result<(), EditorError> {
        let node = self
            .flow
            .node(node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })?;
        if node.node_type().info().has_output_handle {
            Ok(())
        } else {
            Err(EditorError::NoOutputHandle {
                node_id: node_id.clone(),
                node_type: node.node_type(),
            })
        }
    }

    // Deleting

    /// Deletes a node together with every transition into or out of it.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist, or
    /// `StartNodeRemoval` if it is the start node.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Result<Vec<ProjectionPatch>, EditorError> {
        let removed = self.flow.delete_node(node_id)?;

        let mut patches: Vec<ProjectionPatch> = removed
            .node
            .edges()
            .iter()
            .map(|e| e.id().clone())
            .chain(removed.incoming.iter().map(|(_, e)| e.id().clone()))
            .map(|edge_id| ProjectionPatch::EdgeRemoved { edge_id })
            .collect();
        patches.push(ProjectionPatch::NodeRemoved {
            node_id: node_id.clone(),
        });

        if self.selection.as_ref() == Some(node_id) {
            self.selection = None;
        }
        if self.hover.as_ref() == Some(node_id) {
            self.hover = None;
        }
        if self.connecting_from.as_ref() == Some(node_id) {
            self.connecting_from = None;
        }
        if self.drag.as_ref().is_some_and(|d| &d.node_id == node_id) {
            self.drag = None;
        }

        Ok(self.commit(patches))
    }

    /// Deletes the selected node.
    ///
    /// # Errors
    ///
    /// Returns `NothingSelected` if no node is selected, or any error from
    /// [`GraphEditor::delete_node`].
    pub fn delete_selected(&mut self) -> Result<Vec<ProjectionPatch>, EditorError> {
        let node_id = self.selection.clone().ok_or(EditorError::NothingSelected)?;
        self.delete_node(&node_id)
    }

    /// Deletes one transition.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound`/`EdgeNotFound` if the owning node or edge is missing.
    pub fn delete_edge(
        &mut self,
        source: &NodeId,
        edge_id: &EdgeId,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.flow.delete_edge(source, edge_id)?;
        Ok(self.commit(vec![ProjectionPatch::EdgeRemoved {
            edge_id: edge_id.clone(),
        }]))
    }

    /// Makes a node the start node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn set_start_node(
        &mut self,
        node_id: &NodeId,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.flow.set_start_node(node_id)?;
        Ok(self.commit(vec![ProjectionPatch::StartChanged {
            node_id: node_id.clone(),
        }]))
    }

    // Inspector

    /// Returns an inspector for the selected node.
    #[must_use]
    pub fn inspector(&mut self) -> Option<NodeInspector<'_>> {
        let node_id = self.selection.clone()?;
        self.inspect(&node_id).ok()
    }

    /// Returns an inspector for any node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn inspect(&mut self, node_id: &NodeId) -> Result<NodeInspector<'_>, EditorError> {
        let node_type = self
            .flow
            .node(node_id)
            .map(|n| n.node_type())
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })?;
        Ok(NodeInspector::new(self, node_id.clone(), node_type))
    }

    /// Edits a node's fields. Emits patches only for what the canvas shows.
    pub(crate) fn update_node(
        &mut self,
        node_id: &NodeId,
        patch: NodePatch,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        let moves = patch.moves();
        let relabels = patch.relabels();
        let node = self.flow.update_node(node_id, patch)?;

        let mut patches = Vec::new();
        if moves {
            patches.push(ProjectionPatch::NodeMoved {
                node_id: node_id.clone(),
                position: node.position,
            });
        }
        if relabels {
            patches.push(ProjectionPatch::NodeRelabeled {
                node_id: node_id.clone(),
                label: node.name.clone(),
            });
        }
        Ok(self.commit(patches))
    }

    pub(crate) fn add_transition(
        &mut self,
        source: &NodeId,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        let edge = self.flow.add_transition(source)?;
        let canvas = CanvasEdge::from_edge(source, edge);
        Ok(self.commit(vec![ProjectionPatch::EdgeAdded { edge: canvas }]))
    }

    pub(crate) fn update_edge(
        &mut self,
        source: &NodeId,
        edge_id: &EdgeId,
        patch: EdgePatch,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        let relabels = patch.condition.is_some();
        let retargets = patch.destination.is_some();
        let edge = self.flow.update_edge(source, edge_id, patch)?;

        let mut patches = Vec::new();
        if relabels {
            patches.push(ProjectionPatch::EdgeRelabeled {
                edge_id: edge_id.clone(),
                label: edge.condition.text().to_string(),
            });
        }
        if retargets {
            patches.push(ProjectionPatch::EdgeRetargeted {
                edge_id: edge_id.clone(),
                target: edge.destination().cloned(),
            });
        }
        Ok(self.commit(patches))
    }
}
