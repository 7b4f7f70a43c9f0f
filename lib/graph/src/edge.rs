//! Edge types for flow graphs.
//!
//! Edges are owned by their source node and describe a conditioned
//! transition to a destination node. The destination is `None` only while a
//! transition has been added but not yet connected.

use callflow_core::{EdgeId, NodeId};

/// Condition text shown on freshly created transitions.
pub const DEFAULT_TRANSITION_PROMPT: &str = "Describe when to take this transition";

/// When a transition is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionCondition {
    /// The language model decides, based on a natural-language condition.
    Prompt { text: String },
}

impl TransitionCondition {
    /// Creates a prompt condition.
    #[must_use]
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::Prompt { text: text.into() }
    }

    /// Returns the condition text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Prompt { text } => text,
        }
    }
}

impl Default for TransitionCondition {
    fn default() -> Self {
        Self::prompt(DEFAULT_TRANSITION_PROMPT)
    }
}

/// An outgoing transition of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    id: EdgeId,
    destination: Option<NodeId>,
    /// When the transition is taken.
    pub condition: TransitionCondition,
}

impl Edge {
    /// Creates an edge with a fresh id.
    #[must_use]
    pub fn new(destination: Option<NodeId>, condition: TransitionCondition) -> Self {
        Self::with_id(EdgeId::new(), destination, condition)
    }

    /// Creates an edge with a known id.
    #[must_use]
    pub fn with_id(
        id: EdgeId,
        destination: Option<NodeId>,
        condition: TransitionCondition,
    ) -> Self {
        Self {
            id,
            destination,
            condition,
        }
    }

    /// Returns the edge id.
    #[must_use]
    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    /// Returns the destination node, if connected.
    #[must_use]
    pub fn destination(&self) -> Option<&NodeId> {
        self.destination.as_ref()
    }

    /// Returns whether the edge points at a node.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.destination.is_some()
    }

    pub(crate) fn set_destination(&mut self, destination: Option<NodeId>) {
        self.destination = destination;
    }
}

/// A partial update to an edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgePatch {
    pub condition: Option<TransitionCondition>,
    pub destination: Option<NodeId>,
}

impl EdgePatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the condition.
    #[must_use]
    pub fn with_condition(mut self, condition: TransitionCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Points the edge at a new destination.
    #[must_use]
    pub fn with_destination(mut self, destination: NodeId) -> Self {
        self.destination = Some(destination);
        self
    }
}
