//! Error types for the graph crate.
//!
//! - `GraphError`: a model operation addressed something that isn't there
//! - `ValidationError`: the flow can't be saved in its current state
//! - `WireError`: a wire document couldn't be turned into a flow

use crate::registry::NodeType;
use callflow_core::{EdgeId, NodeId};
use std::fmt;

/// Errors from flow model operations.
///
/// These are local contract violations; callers handle them synchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node with the given ID was not found in the flow.
    NodeNotFound { node_id: NodeId },
    /// Edge with the given ID was not found on its source node.
    EdgeNotFound { node_id: NodeId, edge_id: EdgeId },
    /// An edge endpoint names a node that doesn't exist.
    InvalidReference { missing: NodeId },
    /// The start node can't be deleted while it is the start node.
    StartNodeRemoval { node_id: NodeId },
    /// A config patch would change the node's type.
    ConfigTypeMismatch {
        node_id: NodeId,
        expected: NodeType,
        found: NodeType,
    },
}

impl GraphError {
    /// Returns whether the error reports a missing node or edge.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NodeNotFound { .. } | Self::EdgeNotFound { .. })
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => write!(f, "node not found: {node_id}"),
            Self::EdgeNotFound { node_id, edge_id } => {
                write!(f, "edge {edge_id} not found on node {node_id}")
            }
            Self::InvalidReference { missing } => {
                write!(f, "edge references unknown node {missing}")
            }
            Self::StartNodeRemoval { node_id } => {
                write!(
                    f,
                    "node {node_id} is the start node; choose another start node first"
                )
            }
            Self::ConfigTypeMismatch {
                node_id,
                expected,
                found,
            } => {
                write!(
                    f,
                    "config for node {node_id} must be {expected}, got {found}"
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Reasons a flow can't be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The flow has no name.
    EmptyName,
    /// A node has no name.
    EmptyNodeName { node_id: NodeId },
    /// A transition was added but never connected to a destination.
    UnresolvedTransition { node_id: NodeId, edge_id: EdgeId },
}

impl ValidationError {
    /// Returns the node the problem should be shown next to, if any.
    #[must_use]
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::EmptyName => None,
            Self::EmptyNodeName { node_id } | Self::UnresolvedTransition { node_id, .. } => {
                Some(node_id)
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "flow name must not be empty"),
            Self::EmptyNodeName { node_id } => write!(f, "node {node_id} needs a name"),
            Self::UnresolvedTransition { node_id, edge_id } => {
                write!(
                    f,
                    "transition {edge_id} on node {node_id} is not connected to a destination"
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors converting a wire document into a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The document can't produce a usable flow.
    MalformedDocument { reason: String },
    /// The document isn't valid JSON for the wire schema.
    Json { reason: String },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDocument { reason } => write!(f, "malformed flow document: {reason}"),
            Self::Json { reason } => write!(f, "invalid flow JSON: {reason}"),
        }
    }
}

impl std::error::Error for WireError {}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            reason: err.to_string(),
        }
    }
}
