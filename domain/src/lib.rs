//! Domain layer for toolplan
//!
//! This crate contains the core types and pure algorithms of the planner.
//! It has no dependencies on infrastructure or I/O concerns.
//!
//! # Core Concepts
//!
//! ## Dependency graph
//!
//! Tools declare prerequisites. An edge `a -> b` in a [`DirectedGraph`] means
//! "`a` must be available before `b` can run". The graph is generic and
//! rebuilt per query from the tool store.
//!
//! ## Execution plan
//!
//! - **Order**: the dependency closure of a request, topologically sorted
//! - **Groups**: levels of tools that may run concurrently
//! - **Affinity lanes**: tools in one group that share a downstream resource
//! - **Version**: plans are versioned per [`RequestSignature`]

pub mod config;
pub mod graph;
pub mod plan;
pub mod tool;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use graph::{DirectedGraph, Direction, GraphError, GraphResult, NodeId};
pub use plan::{
    AffinityLane, AffinityPolicy, ExecutionGroup, ExecutionPlan, MissingParameters,
    ParameterBinding, ParameterRequirement, ProvidedParameters, RequestSignature,
    apply_affinity, parallel_groups,
};
pub use tool::{
    AffinityKey, DependencyEdge, DependencyType, ParameterMapping, ParameterSpec, ToolId,
    ToolNode,
};
