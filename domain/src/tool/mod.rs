//! Tool domain module
//!
//! Tools are units of work with declared parameters and prerequisite
//! relationships. The planner only reads them: it never calls a tool.
//!
//! ```text
//! ┌──────────────┐  prerequisite   ┌──────────────┐
//! │ ToolNode     │────────────────▶│ ToolNode     │
//! │ (tool1)      │ DependencyEdge  │ (tool2)      │
//! └──────────────┘  id → user_id   └──────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ToolId`] — opaque, lexically ordered identifier
//! - [`ToolNode`] — active flag, declared [`ParameterSpec`]s, optional [`AffinityKey`]
//! - [`DependencyEdge`] — `prerequisite → dependent`, [`DependencyType`] and parameter mappings

pub mod dependency;
pub mod entities;

pub use dependency::{DependencyEdge, DependencyType, ParameterMapping};
pub use entities::{AffinityKey, ParameterSpec, ToolId, ToolNode};
