//! Planner configuration from TOML (`[planner]` section)

use serde::{Deserialize, Serialize};
use toolplan_application::PlanningParams;
use toolplan_domain::{AffinityPolicy, ConfigIssue, ConfigIssueCode};

/// Raw planner configuration from TOML
///
/// # Example
///
/// ```toml
/// [planner]
/// affinity_policy = "annotate"    # "annotate" or "off"
/// allow_empty_request = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePlannerConfig {
    /// Affinity pass policy
    pub affinity_policy: String,
    /// Accept an empty request as an empty plan
    pub allow_empty_request: bool,
}

impl Default for FilePlannerConfig {
    fn default() -> Self {
        Self {
            affinity_policy: AffinityPolicy::default().as_str().to_string(),
            allow_empty_request: false,
        }
    }
}

impl FilePlannerConfig {
    /// Parse affinity_policy into AffinityPolicy, returning warnings on failure.
    pub fn parse_affinity_policy(&self) -> (AffinityPolicy, Vec<ConfigIssue>) {
        match self.affinity_policy.parse::<AffinityPolicy>() {
            Ok(policy) => (policy, vec![]),
            Err(_) => {
                let fallback = AffinityPolicy::default();
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "planner.affinity_policy".to_string(),
                        value: self.affinity_policy.clone(),
                        valid_values: AffinityPolicy::valid_values()
                            .iter()
                            .map(|v| v.to_string())
                            .collect(),
                    },
                    format!(
                        "planner.affinity_policy: unknown value '{}', falling back to '{}'",
                        self.affinity_policy, fallback
                    ),
                );
                (fallback, vec![issue])
            }
        }
    }

    /// Converts to application parameters
    pub fn to_planning_params(&self) -> (PlanningParams, Vec<ConfigIssue>) {
        let (policy, issues) = self.parse_affinity_policy();
        let params = PlanningParams::default()
            .with_affinity_policy(policy)
            .with_allow_empty_request(self.allow_empty_request);
        (params, issues)
    }
}
