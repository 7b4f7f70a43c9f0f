//! Error and notice types for the editing layer.

use callflow_core::NodeId;
use callflow_graph::{FieldKind, GraphError, NodeType, ValidationError, WireError};
use callflow_persistence::PersistenceError;
use std::fmt;

/// Errors from canvas gestures and inspector edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// The flow model refused the operation.
    Graph(GraphError),
    /// The node type has no output handle to draw a transition from.
    NoOutputHandle { node_id: NodeId, node_type: NodeType },
    /// A connection was completed without being started.
    NoConnectionInProgress,
    /// The inspector doesn't expose this field for the node's type.
    FieldNotEditable {
        node_id: NodeId,
        node_type: NodeType,
        field: FieldKind,
    },
    /// The operation needs a selected node.
    NothingSelected,
}

impl EditorError {
    /// Returns the message to show the user.
    #[must_use]
    pub fn notice(&self) -> Notice {
        Notice::error(self.to_string())
    }
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "{err}"),
            Self::NoOutputHandle { node_id, node_type } => write!(
                f,
                "{} nodes can't have outgoing transitions (node {node_id})",
                node_type.info().label
            ),
            Self::NoConnectionInProgress => write!(f, "no connection in progress"),
            Self::FieldNotEditable {
                node_id,
                node_type,
                field,
            } => write!(
                f,
                "{field:?} is not editable on {} node {node_id}",
                node_type.info().label
            ),
            Self::NothingSelected => write!(f, "no node selected"),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for EditorError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

/// Errors from loading and saving a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The flow has problems that block saving. Nothing was sent.
    Validation(Vec<ValidationError>),
    /// A save is already waiting for the backend.
    SaveInFlight,
    /// The backend request failed. The flow is unchanged.
    Persistence(PersistenceError),
    /// The stored document couldn't be read.
    Wire(WireError),
    /// The flow has never been saved, so there is nothing to delete.
    NotPersisted,
}

impl SessionError {
    /// Returns whether the user can retry the same action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Persistence(err) => err.is_retryable(),
            Self::SaveInFlight => true,
            Self::Validation(_) | Self::Wire(_) | Self::NotPersisted => false,
        }
    }

    /// Returns the message to show the user.
    #[must_use]
    pub fn notice(&self) -> Notice {
        Notice::error(self.to_string())
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(errors) => {
                write!(f, "flow can't be saved: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            Self::SaveInFlight => write!(f, "a save is already in progress"),
            Self::Persistence(err) => write!(f, "flow storage request failed: {err}"),
            Self::Wire(err) => write!(f, "failed to read flow: {err}"),
            Self::NotPersisted => write!(f, "flow has not been saved yet"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<PersistenceError> for SessionError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

impl From<WireError> for SessionError {
    fn from(err: WireError) -> Self {
        Self::Wire(err)
    }
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A short message for the host to show as a toast.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
