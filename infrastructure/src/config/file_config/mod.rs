//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Enum-like fields stay strings here and are parsed with warnings, so a
//! typo degrades to a default instead of refusing to start.

mod planner;
mod registry;

pub use planner::FilePlannerConfig;
pub use registry::FileRegistryConfig;

use serde::{Deserialize, Serialize};
use toolplan_domain::ConfigIssue;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Plan generation settings
    pub planner: FilePlannerConfig,
    /// Tool registry settings
    pub registry: FileRegistryConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.planner.parse_affinity_policy().1);
        issues.extend(self.registry.validate());
        issues
    }
}
