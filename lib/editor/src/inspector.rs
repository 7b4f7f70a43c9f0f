//! Property editing for a single node.
//!
//! The inspector shows the fields the node type's registry entry lists and
//! refuses edits to anything else. Every edit goes through the editor, so
//! the canvas is patched exactly like it is for canvas gestures.

use crate::canvas::ProjectionPatch;
use crate::editor::GraphEditor;
use crate::error::EditorError;
use callflow_core::{EdgeId, NodeId};
use callflow_graph::{
    EdgePatch, FieldKind, Instruction, Node, NodeConfig, NodePatch, NodeType, TransitionCondition,
};

/// Editor for one node's properties.
///
/// Borrows the editor mutably, so the node can't disappear while the
/// inspector is open.
#[derive(Debug)]
pub struct NodeInspector<'a> {
    editor: &'a mut GraphEditor,
    node_id: NodeId,
    node_type: NodeType,
}

impl<'a> NodeInspector<'a> {
    pub(crate) fn new(editor: &'a mut GraphEditor, node_id: NodeId, node_type: NodeType) -> Self {
        Self {
            editor,
            node_id,
            node_type,
        }
    }

    #[must_use]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the inspected node.
    #[must_use]
    pub fn node(&self) -> Option<&Node> {
        self.editor.flow().node(&self.node_id)
    }

    /// Returns the fields to render, in display order.
    #[must_use]
    pub fn fields(&self) -> &'static [FieldKind] {
        self.node_type.info().fields
    }

    fn require(&self, field: FieldKind) -> Result<(), EditorError> {
        if self.node_type.info().exposes(field) {
            Ok(())
        } else {
            Err(EditorError::FieldNotEditable {
                node_id: self.node_id.clone(),
                node_type: self.node_type,
                field,
            })
        }
    }

    fn update(&mut self, patch: NodePatch) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.editor.update_node(&self.node_id, patch)
    }

    /// Renames the node.
    ///
    /// # Errors
    ///
    /// Propagates model errors.
    pub fn set_name(
        &mut self,
        name: impl Into<String>,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.require(FieldKind::Name)?;
        self.update(NodePatch::new().with_name(name))
    }

    /// Replaces the prompt instruction.
    ///
    /// # Errors
    ///
    /// Returns `FieldNotEditable` if the type has no instruction.
    pub fn set_instruction(
        &mut self,
        text: impl Into<String>,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.require(FieldKind::Instruction)?;
        self.update(NodePatch::new().with_instruction(Some(Instruction::prompt(text))))
    }

    /// Selects the tool a function node calls.
    ///
    /// # Errors
    ///
    /// Returns `FieldNotEditable` unless this is a function node.
    pub fn set_tool(
        &mut self,
        tool_id: Option<String>,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.require(FieldKind::Tool)?;
        self.update(NodePatch::new().with_config(NodeConfig::Function { tool_id }))
    }

    /// Sets the number a transfer node dials.
    ///
    /// # Errors
    ///
    /// Returns `FieldNotEditable` unless this is a transfer node.
    pub fn set_transfer_number(
        &mut self,
        number: Option<String>,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.require(FieldKind::TransferNumber)?;
        let transfer_number = number.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.update(NodePatch::new().with_config(NodeConfig::TransferCall { transfer_number }))
    }

    /// Replaces the node's knowledge bases.
    ///
    /// # Errors
    ///
    /// Returns `FieldNotEditable` if the type doesn't use knowledge bases.
    pub fn set_knowledge_bases(
        &mut self,
        ids: Vec<String>,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.require(FieldKind::KnowledgeBases)?;
        self.update(NodePatch::new().with_knowledge_base_ids(ids))
    }

    /// Adds a transition that isn't connected yet; it is drawn as a stub.
    ///
    /// # Errors
    ///
    /// Returns `FieldNotEditable` if the type has no transitions.
    pub fn add_transition(&mut self) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.require(FieldKind::Transitions)?;
        self.editor.add_transition(&self.node_id)
    }

    /// Changes when a transition is taken.
    ///
    /// # Errors
    ///
    /// Returns `EdgeNotFound` if the transition isn't on this node.
    pub fn set_condition(
        &mut self,
        edge_id: &EdgeId,
        text: impl Into<String>,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.require(FieldKind::Transitions)?;
        self.editor.update_edge(
            &self.node_id,
            edge_id,
            EdgePatch::new().with_condition(TransitionCondition::prompt(text)),
        )
    }

    /// Points a transition at another node.
    ///
    /// # Errors
    ///
    /// Returns `EdgeNotFound` if the transition isn't on this node, or
    /// `InvalidReference` if the target doesn't exist.
    pub fn set_destination(
        &mut self,
        edge_id: &EdgeId,
        target: &NodeId,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.require(FieldKind::Transitions)?;
        self.editor.update_edge(
            &self.node_id,
            edge_id,
            EdgePatch::new().with_destination(target.clone()),
        )
    }

    /// Removes a transition.
    ///
    /// # Errors
    ///
    /// Returns `EdgeNotFound` if the transition isn't on this node.
    pub fn remove_transition(
        &mut self,
        edge_id: &EdgeId,
    ) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.editor.delete_edge(&self.node_id, edge_id)
    }

    /// Makes this node the start node.
    ///
    /// # Errors
    ///
    /// Propagates model errors.
    pub fn make_start(&mut self) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.editor.set_start_node(&self.node_id)
    }

    /// Deletes the node, closing the inspector.
    ///
    /// # Errors
    ///
    /// Returns `StartNodeRemoval` if this is the start node.
    pub fn delete(self) -> Result<Vec<ProjectionPatch>, EditorError> {
        self.editor.delete_node(&self.node_id)
    }
}
