//! Persistence for conversation flows.
//!
//! The editor talks to storage only through [`FlowPersistenceClient`]:
//!
//! - [`HttpFlowClient`]: the backend's REST API, over reqwest
//! - [`InMemoryFlowStore`]: an in-process store for hosts without a backend,
//!   and for tests

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;

pub use client::FlowPersistenceClient;
pub use config::PersistenceConfig;
pub use error::PersistenceError;
pub use http::HttpFlowClient;
pub use memory::InMemoryFlowStore;
