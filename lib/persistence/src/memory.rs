//! In-process flow store.

use crate::client::FlowPersistenceClient;
use crate::error::PersistenceError;
use async_trait::async_trait;
use callflow_core::FlowId;
use callflow_graph::WireFlow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A [`FlowPersistenceClient`] that keeps documents in memory.
///
/// Counts write calls (create, update, delete) and can be told to fail the
/// next request, which makes it usable as a test double.
#[derive(Debug, Default)]
pub struct InMemoryFlowStore {
    flows: Mutex<HashMap<FlowId, WireFlow>>,
    fail_next: Mutex<Option<PersistenceError>>,
    writes: AtomicUsize,
}

impl InMemoryFlowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document under a known id, bypassing the write counter.
    pub fn insert(&self, flow_id: FlowId, mut flow: WireFlow) {
        flow.id = Some(flow_id.to_string());
        lock(&self.flows).insert(flow_id, flow);
    }

    /// Returns a stored document.
    #[must_use]
    pub fn get(&self, flow_id: &FlowId) -> Option<WireFlow> {
        lock(&self.flows).get(flow_id).cloned()
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.flows).len()
    }

    /// Returns whether the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many write calls have been made.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes the next request fail with `error`.
    pub fn fail_next(&self, error: PersistenceError) {
        *lock(&self.fail_next) = Some(error);
    }

    fn take_failure(&self) -> Result<(), PersistenceError> {
        match lock(&self.fail_next).take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl FlowPersistenceClient for InMemoryFlowStore {
    async fn load_flow(&self, flow_id: &FlowId) -> Result<WireFlow, PersistenceError> {
        self.take_failure()?;
        self.get(flow_id).ok_or_else(|| PersistenceError::NotFound {
            flow_id: flow_id.clone(),
        })
    }

    async fn create_flow(&self, flow: &WireFlow) -> Result<FlowId, PersistenceError> {
        self.record_write();
        self.take_failure()?;
        let flow_id = FlowId::new();
        let mut stored = flow.clone();
        stored.id = Some(flow_id.to_string());
        lock(&self.flows).insert(flow_id.clone(), stored);
        debug!(flow_id = %flow_id, "stored new flow");
        Ok(flow_id)
    }

    async fn update_flow(&self, flow_id: &FlowId, flow: &WireFlow) -> Result<(), PersistenceError> {
        self.record_write();
        self.take_failure()?;
        let mut flows = lock(&self.flows);
        let slot = flows
            .get_mut(flow_id)
            .ok_or_else(|| PersistenceError::NotFound {
                flow_id: flow_id.clone(),
            })?;
        let mut stored = flow.clone();
        stored.id = Some(flow_id.to_string());
        *slot = stored;
        Ok(())
    }

    async fn delete_flow(&self, flow_id: &FlowId) -> Result<(), PersistenceError> {
        self.record_write();
        self.take_failure()?;
        lock(&self.flows)
            .remove(flow_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound {
                flow_id: flow_id.clone(),
            })
    }
}
