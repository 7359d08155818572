//! Planning parameters — plan generation control.
//!
//! [`PlanningParams`] groups the static knobs read by
//! [`ExecutionPlanService`](crate::use_cases::execution_plan::ExecutionPlanService).

use serde::{Deserialize, Serialize};
use toolplan_domain::AffinityPolicy;

/// Plan generation control parameters.
///
/// | Field | Default | Effect |
/// |-------|---------|--------|
/// | `affinity_policy` | `annotate` | Whether groups get affinity lanes |
/// | `allow_empty_request` | `false` | Accept an empty request as an empty plan |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningParams {
    pub affinity_policy: AffinityPolicy,
    pub allow_empty_request: bool,
}

impl PlanningParams {
    // ==================== Builder Methods ====================

    pub fn with_affinity_policy(mut self, policy: AffinityPolicy) -> Self {
        self.affinity_policy = policy;
        self
    }

    pub fn with_allow_empty_request(mut self, allow: bool) -> Self {
        self.allow_empty_request = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PlanningParams::default();
        assert_eq!(params.affinity_policy, AffinityPolicy::Annotate);
        assert!(!params.allow_empty_request);
    }

    #[test]
    fn test_builder() {
        let params = PlanningParams::default()
            .with_affinity_policy(AffinityPolicy::Off)
            .with_allow_empty_request(true);
        assert_eq!(params.affinity_policy, AffinityPolicy::Off);
        assert!(params.allow_empty_request);
    }
}
