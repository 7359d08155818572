//! Generic directed graph
//!
//! [`DirectedGraph`] is a plain adjacency structure over an opaque node
//! identifier. It knows nothing about tools: the application layer builds a
//! `DirectedGraph<ToolId>` from registry records and asks it for closures,
//! orderings and cycles.
//!
//! # Edge direction
//!
//! An edge `a -> b` means "`a` must be available before `b` can run".
//!
//! # Algorithms
//!
//! | Operation | Algorithm |
//! |-----------|-----------|
//! | [`DirectedGraph::detect_cycles`] | Tarjan SCC, one elementary cycle per non-trivial component |
//! | [`DirectedGraph::topological_sort`] | Kahn, ties broken by ascending node id |
//! | [`DirectedGraph::reachable_from`] | BFS over forward or reverse adjacency |

mod directed_graph;
mod error;

pub use directed_graph::{Direction, DirectedGraph};
pub use error::{GraphError, GraphResult, render_path};

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Bound for graph node identifiers.
///
/// `Ord` drives deterministic tie-breaking; `Display` is used in error messages.
pub trait NodeId: Clone + Eq + Hash + Ord + Debug + Display {}

impl<T> NodeId for T where T: Clone + Eq + Hash + Ord + Debug + Display {}
