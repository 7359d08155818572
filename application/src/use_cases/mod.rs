//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dependency_graph;
pub mod execution_plan;
