//! Strongly-typed ID types for flow entities.
//!
//! Ids are string-backed because flow documents authored elsewhere (or by
//! hand) may carry arbitrary node ids such as `"start"`. Freshly created
//! entities get a `<prefix>_<ULID>` id, which keeps them unique and sortable
//! by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed, string-backed ID wrapper.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID with a freshly generated ULID.
            #[must_use]
            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Ulid::new()))
            }

            /// Wraps a fixed, known-good identifier.
            #[must_use]
            pub fn from_static(id: &'static str) -> Self {
                debug_assert!(!id.trim().is_empty(), "static ids must not be blank");
                Self(id.to_string())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        reason: "id must not be blank".to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a flow document. Assigned by the server on first save.
    FlowId,
    "flow"
);

define_id!(
    /// Identifier of a node, unique within its flow.
    NodeId,
    "node"
);

define_id!(
    /// Identifier of an edge (transition) owned by a node.
    EdgeId,
    "edge"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix() {
        assert!(NodeId::new().as_str().starts_with("node_"));
        assert!(EdgeId::new().as_str().starts_with("edge_"));
        assert!(FlowId::new().as_str().starts_with("flow_"));
    }

    #[test]
    fn generated_ids_are_unique() {
        use std::collections::HashSet;

        let ids: HashSet<NodeId> = (0..64).map(|_| NodeId::new()).collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn parse_accepts_foreign_ids() {
        let id: NodeId = "start".parse().expect("should parse");
        assert_eq!(id.as_str(), "start");
        assert_eq!(id, NodeId::from_static("start"));
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: EdgeId = "  e1 ".parse().expect("should parse");
        assert_eq!(id.to_string(), "e1");
    }

    #[test]
    fn parse_rejects_blank() {
        let result: Result<NodeId, _> = "   ".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "NodeId");
        assert!(err.to_string().contains("blank"));
    }

    #[test]
    fn id_serde_is_transparent() {
        let id = NodeId::from_static("greet");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"greet\"");
        let parsed: NodeId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, id);
    }
}
