//! Persistence error types.

use callflow_core::FlowId;
use std::fmt;

/// Errors from flow persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// No flow with this id exists.
    NotFound { flow_id: FlowId },
    /// The request never got a response.
    Transport { reason: String },
    /// The request timed out.
    Timeout { endpoint: String },
    /// The backend answered with a non-success status.
    Status { status: u16, body: String },
    /// The backend's response couldn't be decoded.
    Decode { reason: String },
    /// The client is misconfigured.
    InvalidConfig { reason: String },
}

impl PersistenceError {
    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::NotFound { .. } | Self::Decode { .. } | Self::InvalidConfig { .. } => false,
        }
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { flow_id } => write!(f, "flow not found: {flow_id}"),
            Self::Transport { reason } => write!(f, "could not reach the flow service: {reason}"),
            Self::Timeout { endpoint } => write!(f, "request to {endpoint} timed out"),
            Self::Status { status, body } => {
                write!(f, "flow service returned HTTP {status}: {body}")
            }
            Self::Decode { reason } => {
                write!(f, "unexpected response from flow service: {reason}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid persistence configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for PersistenceError {}
