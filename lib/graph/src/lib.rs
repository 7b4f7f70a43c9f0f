//! Conversation-flow graph model for the callflow editor.
//!
//! This crate provides the semantic half of the editor:
//!
//! - **Registry**: the closed set of node types with their defaults and display metadata
//! - **Graph Model**: `Flow`, its nodes and their embedded outgoing edges, with
//!   cascade-safe mutation
//! - **Analysis**: reachability and dead-end lints over the flow graph
//! - **Wire Format**: the JSON document exchanged with the voice platform
//! - **Serializer**: lossless conversion between `Flow` and the wire format

pub mod analysis;
pub mod edge;
pub mod error;
pub mod flow;
pub mod node;
pub mod registry;
pub mod serializer;
pub mod wire;

pub use analysis::{FlowLint, lint};
pub use edge::{DEFAULT_TRANSITION_PROMPT, Edge, EdgePatch, TransitionCondition};
pub use error::{GraphError, ValidationError, WireError};
pub use flow::{
    Flow, FlowSettings, FlowTool, ModelChoice, RemovedNode, START_NODE_ID, StartSpeaker,
};
pub use node::{Instruction, Node, NodeConfig, NodePatch, Position};
pub use registry::{FieldKind, NodeCategory, NodeType, NodeTypeInfo, UnknownNodeType, palette};
pub use serializer::{LoadWarning, Loaded, from_json, from_wire, to_json, to_wire};
pub use wire::{
    WireEdge, WireFlow, WireInstruction, WireNode, WireTransferDestination, WireTransitionCondition,
};
