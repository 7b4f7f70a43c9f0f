//! An editing session: one flow, its editor, and its persistence.
//!
//! Saving is single-flight and split into three steps so a UI event loop
//! can drive it without holding the session across an `await`:
//!
//! 1. [`EditorSession::begin_save`] validates, snapshots the wire document
//!    and marks a save as in flight. A second call while one is in flight is
//!    rejected, not queued.
//! 2. [`PendingSave::send`] performs the one network call.
//! 3. [`EditorSession::finish_save`] applies the outcome and clears the flag.
//!
//! [`EditorSession::save`] runs all three for hosts that can simply await.
//!
//! The in-flight flag is held by a ticket that travels from the
//! [`PendingSave`] into its [`SaveOutcome`]. Dropping either one (or a
//! cancelled `send`/`save` future) releases the flag, so an abandoned save
//! never locks the session.

use crate::editor::GraphEditor;
use crate::error::{Notice, SessionError};
use callflow_core::FlowId;
use callflow_graph::{Flow, LoadWarning, WireFlow, from_wire, to_wire};
use callflow_persistence::{FlowPersistenceClient, PersistenceError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// UI-facing status of a session, kept apart from the flow itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    saved_revision: Option<u64>,
    last_saved_at: Option<DateTime<Utc>>,
    last_error: Option<PersistenceError>,
    load_warnings: Vec<LoadWarning>,
}

impl SessionState {
    /// Returns when the flow was last saved by this session.
    #[must_use]
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// Returns the error from the last failed save, until the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&PersistenceError> {
        self.last_error.as_ref()
    }

    /// Returns the repairs made when the flow was loaded.
    #[must_use]
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.load_warnings
    }
}

/// Marks a save as in flight for as long as it is alive.
#[derive(Debug)]
struct SaveTicket(Arc<AtomicBool>);

impl SaveTicket {
    /// Takes the session's save slot, or returns `None` if it is taken.
    fn acquire(slot: &Arc<AtomicBool>) -> Option<Self> {
        if slot.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(Arc::clone(slot)))
        }
    }
}

impl Drop for SaveTicket {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The result of sending a save, to be handed back to
/// [`EditorSession::finish_save`].
#[derive(Debug)]
pub struct SaveOutcome {
    revision: u64,
    result: Result<FlowId, PersistenceError>,
    ticket: SaveTicket,
}

/// A save that has been validated and snapshotted but not yet sent.
#[must_use = "a pending save does nothing until it is sent"]
pub struct PendingSave {
    client: Arc<dyn FlowPersistenceClient>,
    flow_id: Option<FlowId>,
    document: WireFlow,
    revision: u64,
    ticket: SaveTicket,
}

impl PendingSave {
    /// Returns the document that will be sent.
    #[must_use]
    pub fn document(&self) -> &WireFlow {
        &self.document
    }

    /// Sends the snapshot: an update if the flow has an id, otherwise a create.
    pub async fn send(self) -> SaveOutcome {
        let result = match &self.flow_id {
            Some(flow_id) => self
                .client
                .update_flow(flow_id, &self.document)
                .await
                .map(|()| flow_id.clone()),
            None => self.client.create_flow(&self.document).await,
        };
        SaveOutcome {
            revision: self.revision,
            result,
            ticket: self.ticket,
        }
    }
}

/// One open flow with its editor and persistence client.
pub struct EditorSession {
    editor: GraphEditor,
    client: Arc<dyn FlowPersistenceClient>,
    state: SessionState,
    save_slot: Arc<AtomicBool>,
}

impl EditorSession {
    /// Starts a session on an in-memory flow.
    ///
    /// A flow that already has an id is treated as saved.
    #[must_use]
    pub fn new(flow: Flow, client: Arc<dyn FlowPersistenceClient>) -> Self {
        let saved_revision = flow.id().map(|_| 0);
        Self {
            editor: GraphEditor::new(flow),
            client,
            state: SessionState {
                saved_revision,
                ..SessionState::default()
            },
            save_slot: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Loads a stored flow and starts a session on it.
    ///
    /// A document that needed repairs opens dirty, so the repaired flow is
    /// saved back on the next save.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the flow can't be fetched, or `Wire` if the
    /// document has no usable nodes.
    pub async fn open(
        client: Arc<dyn FlowPersistenceClient>,
        flow_id: &FlowId,
    ) -> callflow_core::Result<Self, SessionError> {
        let document = client.load_flow(flow_id).await.map_err(SessionError::from)?;
        let loaded = from_wire(document).map_err(SessionError::from)?;
        let mut flow = loaded.value;
        if flow.id() != Some(flow_id) {
            flow.assign_id(flow_id.clone());
        }
        info!(
            flow_id = %flow_id,
            node_count = flow.node_count(),
            warning_count = loaded.warnings.len(),
            "opened flow"
        );

        let mut session = Self::new(flow, client);
        if !loaded.warnings.is_empty() {
            session.state.saved_revision = None;
        }
        session.state.load_warnings = loaded.warnings;
        Ok(session)
    }

    #[must_use]
    pub fn editor(&self) -> &GraphEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut GraphEditor {
        &mut self.editor
    }

    #[must_use]
    pub fn flow(&self) -> &Flow {
        self.editor.flow()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns whether a save is waiting for the backend.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.save_slot.load(Ordering::SeqCst)
    }

    /// Returns whether there are changes the backend hasn't seen.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.saved_revision != Some(self.editor.revision())
    }

    /// Validates the flow and snapshots it for saving.
    ///
    /// # Errors
    ///
    /// Returns `SaveInFlight` if a save hasn't finished yet, or `Validation`
    /// if the flow can't be saved. Nothing is sent in either case.
    pub fn begin_save(&mut self) -> callflow_core::Result<PendingSave, SessionError> {
        if self.is_saving() {
            return Err(SessionError::SaveInFlight.into());
        }
        let flow = self.editor.flow();
        flow.validate_for_save().map_err(SessionError::Validation)?;

        let ticket = SaveTicket::acquire(&self.save_slot).ok_or(SessionError::SaveInFlight)?;
        Ok(PendingSave {
            client: Arc::clone(&self.client),
            flow_id: flow.id().cloned(),
            document: to_wire(flow),
            revision: self.editor.revision(),
            ticket,
        })
    }

    /// Applies the outcome of a sent save and clears the in-flight flag.
    ///
    /// On success the flow takes the server id (first save) and the session
    /// becomes clean, unless edits were made after `begin_save`. On failure
    /// the flow is left untouched and the error is kept for a retry notice.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the backend request failed.
    pub fn finish_save(
        &mut self,
        outcome: SaveOutcome,
    ) -> callflow_core::Result<FlowId, SessionError> {
        let SaveOutcome {
            revision,
            result,
            ticket,
        } = outcome;
        drop(ticket);
        match result {
            Ok(flow_id) => {
                if self.editor.flow().id().is_none() {
                    self.editor.assign_flow_id(flow_id.clone());
                }
                self.state.saved_revision = Some(revision);
                self.state.last_saved_at = Some(Utc::now());
                self.state.last_error = None;
                info!(flow_id = %flow_id, revision, "saved flow");
                Ok(flow_id)
            }
            Err(err) => {
                warn!(
                    flow_id = ?self.editor.flow().id(),
                    error = %err,
                    retryable = err.is_retryable(),
                    "failed to save flow"
                );
                self.state.last_error = Some(err.clone());
                Err(SessionError::Persistence(err).into())
            }
        }
    }

    /// Validates, sends and applies a save.
    ///
    /// # Errors
    ///
    /// See [`EditorSession::begin_save`] and [`EditorSession::finish_save`].
    pub async fn save(&mut self) -> callflow_core::Result<FlowId, SessionError> {
        let pending = self.begin_save()?;
        let outcome = pending.send().await;
        self.finish_save(outcome)
    }

    /// Returns the notice to show for the current save state, if any.
    #[must_use]
    pub fn save_notice(&self) -> Option<Notice> {
        if let Some(err) = &self.state.last_error {
            return Some(Notice::error(format!("Failed to save flow: {err}")));
        }
        self.state
            .last_saved_at
            .map(|_| Notice::success("Flow saved successfully!"))
    }

    /// Returns the notice to show after opening a flow that needed repairs.
    #[must_use]
    pub fn load_notice(&self) -> Option<Notice> {
        match self.state.load_warnings.len() {
            0 => None,
            1 => Some(Notice::info(format!(
                "Flow was repaired while loading: {}",
                self.state.load_warnings[0]
            ))),
            n => Some(Notice::info(format!(
                "Flow was repaired while loading ({n} fixes); save to keep them"
            ))),
        }
    }

    /// Deletes the stored flow, ending the session.
    ///
    /// # Errors
    ///
    /// Returns `NotPersisted` if the flow was never saved, `SaveInFlight`
    /// while a save is pending, or `Persistence` if the request fails. The
    /// session is handed back on error.
    pub async fn delete(self) -> Result<(), (Self, rootcause::Report<SessionError>)> {
        if self.is_saving() {
            return Err((self, SessionError::SaveInFlight.into()));
        }
        let Some(flow_id) = self.editor.flow().id().cloned() else {
            return Err((self, SessionError::NotPersisted.into()));
        };
        match self.client.delete_flow(&flow_id).await {
            Ok(()) => {
                info!(flow_id = %flow_id, "deleted flow");
                Ok(())
            }
            Err(err) => Err((self, SessionError::Persistence(err).into())),
        }
    }
}
