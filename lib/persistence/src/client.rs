//! The persistence boundary used by the editor.

use crate::error::PersistenceError;
use async_trait::async_trait;
use callflow_core::FlowId;
use callflow_graph::WireFlow;

/// Loads and stores flow documents.
///
/// Implementations own transport concerns such as timeouts and retries; the
/// editor issues at most one write at a time.
#[async_trait]
pub trait FlowPersistenceClient: Send + Sync {
    /// Loads a flow document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the flow doesn't exist.
    async fn load_flow(&self, flow_id: &FlowId) -> Result<WireFlow, PersistenceError>;

    /// Stores a new flow and returns the id assigned to it.
    async fn create_flow(&self, flow: &WireFlow) -> Result<FlowId, PersistenceError>;

    /// Replaces a stored flow.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the flow doesn't exist.
    async fn update_flow(&self, flow_id: &FlowId, flow: &WireFlow) -> Result<(), PersistenceError>;

    /// Deletes a stored flow.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the flow doesn't exist.
    async fn delete_flow(&self, flow_id: &FlowId) -> Result<(), PersistenceError>;
}
