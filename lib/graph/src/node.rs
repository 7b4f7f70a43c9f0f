//! Flow node types.
//!
//! A node is one step of a call-handling flow. Each node has:
//! - An id unique within its flow
//! - A type-specific configuration (`NodeConfig`), which also determines its type
//! - An optional prompt instruction
//! - A canvas position
//! - Its ordered list of outgoing edges, owned by the node

use crate::edge::Edge;
use crate::registry::NodeType;
use callflow_core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};

/// Canvas coordinates of a node box's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this position moved by a delta.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Returns this position rounded to the nearest grid intersection.
    #[must_use]
    pub fn snapped(self, grid: f64) -> Self {
        if grid <= 0.0 {
            return self;
        }
        Self::new((self.x / grid).round() * grid, (self.y / grid).round() * grid)
    }
}

/// What the agent is told to do while a node is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Free-text prompt for the language model.
    Prompt { text: String },
}

impl Instruction {
    /// Creates a prompt instruction.
    #[must_use]
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::Prompt { text: text.into() }
    }

    /// Returns the instruction text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Prompt { text } => text,
        }
    }
}

/// Type-specific node configuration.
///
/// The variant is the node's type; settings that only make sense for one
/// type live inside its variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeConfig {
    Conversation,
    Function {
        /// The tool to invoke.
        tool_id: Option<String>,
    },
    Logic,
    TransferCall {
        /// Phone number the caller is transferred to.
        transfer_number: Option<String>,
    },
    EndCall,
    PressDigit,
}

impl NodeConfig {
    /// Returns the empty configuration for a node type.
    #[must_use]
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Conversation => Self::Conversation,
            NodeType::Function => Self::Function { tool_id: None },
            NodeType::Logic => Self::Logic,
            NodeType::TransferCall => Self::TransferCall {
                transfer_number: None,
            },
            NodeType::EndCall => Self::EndCall,
            NodeType::PressDigit => Self::PressDigit,
        }
    }

    /// Returns the node type this configuration belongs to.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Conversation => NodeType::Conversation,
            Self::Function { .. } => NodeType::Function,
            Self::Logic => NodeType::Logic,
            Self::TransferCall { .. } => NodeType::TransferCall,
            Self::EndCall => NodeType::EndCall,
            Self::PressDigit => NodeType::PressDigit,
        }
    }
}

/// A step in a conversation flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    /// Display name.
    pub name: String,
    /// Type-specific settings.
    pub config: NodeConfig,
    /// Prompt instruction, if any.
    pub instruction: Option<Instruction>,
    /// Canvas position.
    pub position: Position,
    /// Knowledge bases consulted while this node is active.
    pub knowledge_base_ids: Vec<String>,
    edges: Vec<Edge>,
}

impl Node {
    /// Creates a node of the given type seeded with its registry defaults.
    #[must_use]
    pub fn from_defaults(id: NodeId, node_type: NodeType, position: Position) -> Self {
        let info = node_type.info();
        Self {
            id,
            name: info.default_name.to_string(),
            config: NodeConfig::default_for(node_type),
            instruction: info.default_instruction.map(Instruction::prompt),
            position,
            knowledge_base_ids: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Creates a node with explicit fields and no edges.
    #[must_use]
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        config: NodeConfig,
        position: Position,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            config,
            instruction: None,
            position,
            knowledge_base_ids: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Returns the node id.
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Returns the node type.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.config.node_type()
    }

    /// Returns the outgoing edges in order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns an outgoing edge by id.
    #[must_use]
    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id() == edge_id)
    }

    pub(crate) fn edge_mut(&mut self, edge_id: &EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id() == edge_id)
    }

    pub(crate) fn push_edge(&mut self, edge: Edge) -> &Edge {
        self.edges.push(edge);
        let last = self.edges.len() - 1;
        &self.edges[last]
    }

    pub(crate) fn remove_edge(&mut self, edge_id: &EdgeId) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id() == edge_id)?;
        Some(self.edges.remove(index))
    }

    /// Removes every edge pointing at `target`, returning them.
    pub(crate) fn remove_edges_to(&mut self, target: &NodeId) -> Vec<Edge> {
        let (removed, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.destination() == Some(target));
        self.edges = kept;
        removed
    }

    /// Applies a patch to the node's mutable fields. Edges are never touched.
    pub(crate) fn apply(&mut self, patch: NodePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(instruction) = patch.instruction {
            self.instruction = instruction;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(config) = patch.config {
            self.config = config;
        }
        if let Some(knowledge_base_ids) = patch.knowledge_base_ids {
            self.knowledge_base_ids = knowledge_base_ids;
        }
    }
}

/// A partial update to a node's mutable fields.
///
/// Unset fields are left as they are. A config patch must keep the node's type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub instruction: Option<Option<Instruction>>,
    pub position: Option<Position>,
    pub config: Option<NodeConfig>,
    pub knowledge_base_ids: Option<Vec<String>>,
}

impl NodePatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets or clears the instruction.
    #[must_use]
    pub fn with_instruction(mut self, instruction: Option<Instruction>) -> Self {
        self.instruction = Some(instruction);
        self
    }

    /// Sets the position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the type-specific configuration.
    #[must_use]
    pub fn with_config(mut self, config: NodeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the knowledge base ids.
    #[must_use]
    pub fn with_knowledge_base_ids(mut self, ids: Vec<String>) -> Self {
        self.knowledge_base_ids = Some(ids);
        self
    }

    /// Returns whether applying this patch moves the node.
    #[must_use]
    pub fn moves(&self) -> bool {
        self.position.is_some()
    }

    /// Returns whether applying this patch changes what the node box displays.
    #[must_use]
    pub fn relabels(&self) -> bool {
        self.name.is_some()
    }
}
