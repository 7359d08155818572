//! Parameter Requirement port
//!
//! The planner does not interpret parameter values. It hands the ordered
//! tool list and whatever the caller supplied to this port and copies the
//! answer into the plan.

use super::tool_store::ToolStoreError;
use async_trait::async_trait;
use thiserror::Error;
use toolplan_domain::{MissingParameters, ProvidedParameters, ToolId};

/// Errors raised by parameter requirement adapters
#[derive(Error, Debug)]
pub enum ParameterRequirementError {
    #[error("Unknown tool: {0}")]
    UnknownTool(ToolId),

    #[error("Tool store error: {0}")]
    Store(#[from] ToolStoreError),

    #[error("Parameter analysis failed: {0}")]
    Failed(String),
}

/// Port for parameter gap analysis
#[async_trait]
pub trait ParameterRequirementPort: Send + Sync {
    /// Unmet requirements per tool, for tools in `ordered_tools`
    async fn identify_missing_parameters(
        &self,
        ordered_tools: &[ToolId],
        provided: &ProvidedParameters,
    ) -> Result<MissingParameters, ParameterRequirementError>;

    /// Whether any of the reported requirements is required
    fn has_required_parameters_missing(&self, missing: &MissingParameters) -> bool {
        missing.values().flatten().any(|r| r.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolplan_domain::{ParameterRequirement, ParameterSpec};

    struct NothingMissing;

    #[async_trait]
    impl ParameterRequirementPort for NothingMissing {
        async fn identify_missing_parameters(
            &self,
            _ordered_tools: &[ToolId],
            _provided: &ProvidedParameters,
        ) -> Result<MissingParameters, ParameterRequirementError> {
            Ok(MissingParameters::new())
        }
    }

    #[test]
    fn test_default_has_required_check() {
        let port = NothingMissing;
        let mut missing = MissingParameters::new();
        assert!(!port.has_required_parameters_missing(&missing));

        missing.insert(
            ToolId::new("a"),
            vec![ParameterRequirement::from(&ParameterSpec::new("limit", false))],
        );
        assert!(!port.has_required_parameters_missing(&missing));

        missing.insert(
            ToolId::new("b"),
            vec![ParameterRequirement::from(&ParameterSpec::new("token", true))],
        );
        assert!(port.has_required_parameters_missing(&missing));
    }
}
