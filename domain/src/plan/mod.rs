//! Execution plan domain module
//!
//! An [`ExecutionPlan`] answers two questions about a requested set of tools:
//! in which order they can run, and which of them can run at the same time.
//!
//! ```text
//! requested ──▶ closure ──▶ order ──▶ levels ──▶ affinity lanes ──▶ ExecutionPlan
//!                                       │
//!                                       └─ group i runs after groups < i
//! ```
//!
//! The pure passes live here ([`parallel_groups`], [`apply_affinity`]); the
//! orchestration that feeds them from the tool store lives in the
//! application layer.

pub mod affinity;
pub mod entities;
pub mod layering;
pub mod signature;

pub use affinity::{AffinityPolicy, apply_affinity};
pub use entities::{
    AffinityLane, ExecutionGroup, ExecutionPlan, MissingParameters, ParameterBinding,
    ParameterRequirement, ProvidedParameters,
};
pub use layering::parallel_groups;
pub use signature::RequestSignature;
