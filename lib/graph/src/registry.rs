//! Node type registry.
//!
//! The set of node kinds is closed and known at compile time. Each kind maps
//! to a static [`NodeTypeInfo`] holding its creation defaults and the display
//! metadata the canvas palette and the node inspector render from. Adding a
//! kind means adding a variant, a registry entry and a rendering branch; the
//! flow model's operations never look at the type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a flow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Speak to the caller and listen for a reply.
    Conversation,
    /// Invoke a custom tool.
    Function,
    /// Branch on conditions without speaking.
    Logic,
    /// Hand the call over to a phone number.
    TransferCall,
    /// Hang up.
    EndCall,
    /// Send DTMF digits, e.g. to navigate an IVR menu.
    PressDigit,
}

impl NodeType {
    /// Every node type, in palette order.
    pub const ALL: [NodeType; 6] = [
        Self::Conversation,
        Self::Function,
        Self::Logic,
        Self::TransferCall,
        Self::EndCall,
        Self::PressDigit,
    ];

    /// Returns the wire tag for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Function => "function",
            Self::Logic => "logic",
            Self::TransferCall => "transfer_call",
            Self::EndCall => "end_call",
            Self::PressDigit => "press_digit",
        }
    }

    /// Returns the registry entry for this type.
    #[must_use]
    pub fn info(self) -> &'static NodeTypeInfo {
        match self {
            Self::Conversation => &CONVERSATION,
            Self::Function => &FUNCTION,
            Self::Logic => &LOGIC,
            Self::TransferCall => &TRANSFER_CALL,
            Self::EndCall => &END_CALL,
            Self::PressDigit => &PRESS_DIGIT,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a type tag does not name a known node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNodeType {
    /// The tag that failed to parse.
    pub value: String,
}

impl fmt::Display for UnknownNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node type '{}'", self.value)
    }
}

impl std::error::Error for UnknownNodeType {}

impl FromStr for NodeType {
    type Err = UnknownNodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownNodeType {
                value: s.to_string(),
            })
    }
}

/// Palette grouping for node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Nodes that talk to the caller.
    Dialogue,
    /// Nodes that act on external systems.
    Action,
    /// Graph structure control.
    Logic,
    /// Call control (transfer, hang up, keypad).
    Telephony,
}

impl NodeCategory {
    /// Human-readable category name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dialogue => "Dialogue",
            Self::Action => "Actions",
            Self::Logic => "Logic",
            Self::Telephony => "Telephony",
        }
    }
}

/// An editable field the node inspector renders for a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Display name.
    Name,
    /// Free-text prompt instruction.
    Instruction,
    /// Tool to invoke (function nodes).
    Tool,
    /// Phone number to transfer to.
    TransferNumber,
    /// Knowledge bases available while the node is active.
    KnowledgeBases,
    /// Outgoing transitions and their conditions.
    Transitions,
}

/// Static description of a node type.
#[derive(Debug)]
pub struct NodeTypeInfo {
    /// The type this entry describes.
    pub node_type: NodeType,
    /// Palette label.
    pub label: &'static str,
    /// One-line palette description.
    pub description: &'static str,
    /// Palette category.
    pub category: NodeCategory,
    /// Accent colour for the node box.
    pub accent: &'static str,
    /// Name given to freshly dropped nodes.
    pub default_name: &'static str,
    /// Prompt text seeded into freshly dropped nodes, if the type carries one.
    pub default_instruction: Option<&'static str>,
    /// Fields the inspector exposes, in display order.
    pub fields: &'static [FieldKind],
    /// Whether the node box has an output handle to draw transitions from.
    pub has_output_handle: bool,
    /// Whether a node of this type may legitimately end a path.
    pub terminal: bool,
}

impl NodeTypeInfo {
    /// Returns whether the inspector exposes `field` for this type.
    #[must_use]
    pub fn exposes(&self, field: FieldKind) -> bool {
        self.fields.contains(&field)
    }

    /// Returns whether this entry matches a palette search.
    ///
    /// The query matches case-insensitively against the label, the
    /// description and the category name; an empty query matches everything.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.label.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.category.label().to_lowercase().contains(&query)
    }
}

static CONVERSATION: NodeTypeInfo = NodeTypeInfo {
    node_type: NodeType::Conversation,
    label: "Conversation",
    description: "Speak with the caller and wait for a reply",
    category: NodeCategory::Dialogue,
    accent: "#8b5cf6",
    default_name: "Conversation",
    default_instruction: Some("Greet the caller and ask how you can help."),
    fields: &[
        FieldKind::Name,
        FieldKind::Instruction,
        FieldKind::KnowledgeBases,
        FieldKind::Transitions,
    ],
    has_output_handle: true,
    terminal: false,
};

static FUNCTION: NodeTypeInfo = NodeTypeInfo {
    node_type: NodeType::Function,
    label: "Function",
    description: "Call a custom tool and continue with its result",
    category: NodeCategory::Action,
    accent: "#06b6d4",
    default_name: "Function",
    default_instruction: None,
    fields: &[FieldKind::Name, FieldKind::Tool, FieldKind::Transitions],
    has_output_handle: true,
    terminal: false,
};

static LOGIC: NodeTypeInfo = NodeTypeInfo {
    node_type: NodeType::Logic,
    label: "Logic Split",
    description: "Branch to another node based on conditions",
    category: NodeCategory::Logic,
    accent: "#3b82f6",
    default_name: "Logic Split",
    default_instruction: None,
    fields: &[FieldKind::Name, FieldKind::Transitions],
    has_output_handle: true,
    terminal: false,
};

static TRANSFER_CALL: NodeTypeInfo = NodeTypeInfo {
    node_type: NodeType::TransferCall,
    label: "Transfer Call",
    description: "Transfer the caller to a phone number",
    category: NodeCategory::Telephony,
    accent: "#f59e0b",
    default_name: "Transfer Call",
    default_instruction: Some("Tell the caller you are transferring them now."),
    fields: &[
        FieldKind::Name,
        FieldKind::Instruction,
        FieldKind::TransferNumber,
        FieldKind::Transitions,
    ],
    has_output_handle: true,
    terminal: true,
};

static END_CALL: NodeTypeInfo = NodeTypeInfo {
    node_type: NodeType::EndCall,
    label: "End Call",
    description: "Say goodbye and hang up",
    category: NodeCategory::Telephony,
    accent: "#6b7280",
    default_name: "End Call",
    default_instruction: Some("Thank the caller and end the call politely."),
    fields: &[FieldKind::Name, FieldKind::Instruction],
    has_output_handle: false,
    terminal: true,
};

static PRESS_DIGIT: NodeTypeInfo = NodeTypeInfo {
    node_type: NodeType::PressDigit,
    label: "Press Digit",
    description: "Navigate a phone menu by pressing keys",
    category: NodeCategory::Telephony,
    accent: "#ec4899",
    default_name: "Press Digit",
    default_instruction: Some("Press the digit that reaches a human operator."),
    fields: &[
        FieldKind::Name,
        FieldKind::Instruction,
        FieldKind::Transitions,
    ],
    has_output_handle: true,
    terminal: false,
};

/// Returns the palette entries matching a search query and optional category.
pub fn palette(query: &str, category: Option<NodeCategory>) -> Vec<&'static NodeTypeInfo> {
    NodeType::ALL
        .into_iter()
        .map(NodeType::info)
        .filter(|info| category.is_none_or(|c| info.category == c))
        .filter(|info| info.matches(query))
        .collect()
}
