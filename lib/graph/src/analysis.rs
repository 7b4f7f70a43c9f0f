//! Structural lints over a flow, using petgraph.
//!
//! Lints never block saving; they are hints for the canvas to surface.

use crate::flow::Flow;
use callflow_core::NodeId;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use std::collections::HashSet;
use std::fmt;

/// A structural problem that doesn't prevent saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowLint {
    /// No path leads from the start node to this node.
    Unreachable { node_id: NodeId },
    /// A non-terminal node with no way out; calls stall here.
    DeadEnd { node_id: NodeId },
}

impl FlowLint {
    /// Returns the node the lint is about.
    #[must_use]
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Unreachable { node_id } | Self::DeadEnd { node_id } => node_id,
        }
    }
}

impl fmt::Display for FlowLint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable { node_id } => {
                write!(f, "node {node_id} can't be reached from the start node")
            }
            Self::DeadEnd { node_id } => write!(f, "node {node_id} has no outgoing transition"),
        }
    }
}

/// Builds the connectivity graph of a flow. Unresolved transitions are skipped.
fn connectivity(flow: &Flow) -> DiGraphMap<&str, ()> {
    let mut graph = DiGraphMap::new();
    for node in flow.nodes() {
        graph.add_node(node.id().as_str());
    }
    for (source, edge) in flow.edges() {
        if let Some(target) = edge.destination() {
            graph.add_edge(source.as_str(), target.as_str(), ());
        }
    }
    graph
}

/// Returns the lints for a flow, in node order.
#[must_use]
pub fn lint(flow: &Flow) -> Vec<FlowLint> {
    let graph = connectivity(flow);

    let mut reachable = HashSet::new();
    let mut dfs = Dfs::new(&graph, flow.start_node_id().as_str());
    while let Some(id) = dfs.next(&graph) {
        reachable.insert(id);
    }

    let mut lints = Vec::new();
    for node in flow.nodes() {
        let id = node.id().as_str();
        if !reachable.contains(id) {
            lints.push(FlowLint::Unreachable {
                node_id: node.id().clone(),
            });
        }
        let has_exit = graph.neighbors(id).next().is_some();
        if !has_exit && !node.node_type().info().terminal {
            lints.push(FlowLint::DeadEnd {
                node_id: node.id().clone(),
            });
        }
    }
    lints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Position;
    use crate::registry::NodeType;

    #[test]
    fn connected_flow_is_clean() {
        let mut flow = Flow::new("clean");
        let start = flow.start_node_id().clone();
        let end = flow
            .add_node(NodeType::EndCall, Position::default())
            .id()
            .clone();
        flow.add_edge(&start, &end).unwrap();
        assert!(lint(&flow).is_empty());
    }

    #[test]
    fn lone_start_node_is_a_dead_end() {
        let flow = Flow::new("lonely");
        assert_eq!(
            lint(&flow),
            vec![FlowLint::DeadEnd {
                node_id: flow.start_node_id().clone()
            }]
        );
    }

    #[test]
    fn orphan_nodes_are_unreachable() {
        let mut flow = Flow::new("orphan");
        let start = flow.start_node_id().clone();
        let end = flow
            .add_node(NodeType::EndCall, Position::default())
            .id()
            .clone();
        let orphan = flow
            .add_node(NodeType::TransferCall, Position::default())
            .id()
            .clone();
        flow.add_edge(&start, &end).unwrap();
        flow.add_edge(&orphan, &end).unwrap();

        let lints = lint(&flow);
        assert_eq!(lints, vec![FlowLint::Unreachable { node_id: orphan }]);
    }

    #[test]
    fn unresolved_transitions_are_not_exits() {
        let mut flow = Flow::new("pending");
        let start = flow.start_node_id().clone();
        flow.add_transition(&start).unwrap();
        let lints = lint(&flow);
        assert_eq!(lints.len(), 1);
        assert!(matches!(lints[0], FlowLint::DeadEnd { .. }));
        assert!(lints[0].to_string().contains("no outgoing transition"));
    }

    #[test]
    fn cycles_are_allowed() {
        let mut flow = Flow::new("loop");
        let start = flow.start_node_id().clone();
        let other = flow
            .add_node(NodeType::Conversation, Position::default())
            .id()
            .clone();
        flow.add_edge(&start, &other).unwrap();
        flow.add_edge(&other, &start).unwrap();
        assert!(lint(&flow).is_empty());
    }
}
