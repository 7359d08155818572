//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod api_affinity;
pub mod parameter_requirements;
pub mod plan_version_store;
pub mod tool_store;
