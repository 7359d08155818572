//! Application layer for toolplan
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod error;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::PlanningParams;
pub use error::PlanningError;
pub use ports::{
    api_affinity::{AffinityError, ApiAffinityPort, NoAffinity},
    parameter_requirements::{ParameterRequirementError, ParameterRequirementPort},
    plan_version_store::{InMemoryPlanVersionStore, PlanVersionStore},
    tool_store::{ToolStoreError, ToolStorePort},
};
pub use use_cases::dependency_graph::{DependencySnapshot, ToolDependencyGraphService};
pub use use_cases::execution_plan::ExecutionPlanService;
