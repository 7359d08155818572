//! Error types for graph operations

use super::NodeId;
use thiserror::Error;

/// Result type for graph operations
pub type GraphResult<T, N> = Result<T, GraphError<N>>;

/// Errors that can occur during graph operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError<N: NodeId> {
    /// An operation referenced a node that was never added
    #[error("Unknown node: {node}")]
    UnknownNode {
        /// The node that was not found
        node: N,
    },

    /// No valid ordering exists because of a cycle
    #[error("Cycle detected: {}", render_path(.cycle))]
    CycleDetected {
        /// The offending cycle as an ordered node sequence
        cycle: Vec<N>,
    },
}

impl<N: NodeId> GraphError<N> {
    /// Creates an unknown node error
    pub fn unknown_node(node: N) -> Self {
        Self::UnknownNode { node }
    }

    /// Creates a cycle detected error
    pub fn cycle(cycle: Vec<N>) -> Self {
        Self::CycleDetected { cycle }
    }
}

/// Renders a cycle as `a -> b -> c -> a`
pub fn render_path<N: NodeId>(cycle: &[N]) -> String {
    let mut parts: Vec<String> = cycle.iter().map(|n| n.to_string()).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.to_string());
    }
    parts.join(" -> ")
}
