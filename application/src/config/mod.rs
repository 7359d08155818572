//! Application-level configuration.
//!
//! - [`PlanningParams`] — plan generation control (affinity policy, empty requests)

pub mod planning_params;

pub use planning_params::PlanningParams;
