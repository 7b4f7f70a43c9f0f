//! Core types shared by the callflow editor crates.
//!
//! This crate holds the strongly-typed identifiers used across the flow
//! model, the persistence layer and the editor, plus the rootcause-based
//! `Result` alias used at the session boundary.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{EdgeId, FlowId, NodeId, ParseIdError};
