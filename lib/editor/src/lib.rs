//! Editing layer for conversation flows.
//!
//! The [`Flow`](callflow_graph::Flow) is the single source of truth. This
//! crate keeps a canvas projection in step with it:
//!
//! - **Canvas**: the derived visual model and the patches that update it
//! - **Editor**: canvas gestures (drop, drag, connect, delete, select)
//!   routed through the flow model before anything is drawn
//! - **Inspector**: per-node property editing driven by the node registry
//! - **Session**: load and single-flight save against a persistence client

pub mod canvas;
pub mod editor;
pub mod error;
pub mod inspector;
pub mod session;

pub use canvas::{CanvasEdge, CanvasNode, GRID_SIZE, Projection, ProjectionPatch};
pub use editor::GraphEditor;
pub use error::{EditorError, Notice, NoticeLevel, SessionError};
pub use inspector::NodeInspector;
pub use session::{EditorSession, PendingSave, SaveOutcome, SessionState};
