//! Errors surfaced by the planning services

use crate::ports::api_affinity::AffinityError;
use crate::ports::parameter_requirements::ParameterRequirementError;
use crate::ports::tool_store::ToolStoreError;
use thiserror::Error;
use toolplan_domain::{GraphError, RequestSignature, ToolId, graph::render_path};

/// Errors from dependency graph queries and plan generation
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("No tools requested")]
    EmptyRequest,

    #[error("Unknown tools: {}", join_ids(.0))]
    UnknownTools(Vec<ToolId>),

    #[error("Cycle detected: {}", render_path(.cycle))]
    CycleDetected { cycle: Vec<ToolId> },

    #[error("Version {version} not found for {signature}")]
    VersionNotFound {
        signature: RequestSignature,
        version: u32,
    },

    #[error("Tool store error: {0}")]
    Store(#[from] ToolStoreError),

    #[error("Parameter requirement error: {0}")]
    Parameters(#[from] ParameterRequirementError),

    #[error("Affinity error: {0}")]
    Affinity(#[from] AffinityError),
}

impl PlanningError {
    /// Builds an `UnknownTools` error with sorted, distinct ids
    pub fn unknown_tools(ids: impl IntoIterator<Item = ToolId>) -> Self {
        let mut ids: Vec<ToolId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        PlanningError::UnknownTools(ids)
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, PlanningError::CycleDetected { .. })
    }

    pub fn is_unknown_tool(&self) -> bool {
        matches!(self, PlanningError::UnknownTools(_))
    }
}

impl From<GraphError<ToolId>> for PlanningError {
    fn from(err: GraphError<ToolId>) -> Self {
        match err {
            GraphError::UnknownNode { node } => PlanningError::UnknownTools(vec![node]),
            GraphError::CycleDetected { cycle } => PlanningError::CycleDetected { cycle },
        }
    }
}

fn join_ids(ids: &[ToolId]) -> String {
    ids.iter().map(ToolId::as_str).collect::<Vec<_>>().join(", ")
}
