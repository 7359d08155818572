//! Registry configuration from TOML (`[registry]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toolplan_domain::{ConfigIssue, ConfigIssueCode};

/// Raw registry configuration from TOML
///
/// ```toml
/// [registry]
/// path = "tools.toml"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegistryConfig {
    /// Tool registry file
    pub path: Option<PathBuf>,
}

impl FileRegistryConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let Some(path) = &self.path else {
            return vec![];
        };

        if path.as_os_str().is_empty() {
            return vec![ConfigIssue::warning(
                ConfigIssueCode::EmptyPath {
                    field: "registry.path".to_string(),
                },
                "registry.path is empty and will be ignored",
            )];
        }

        if !path.exists() {
            return vec![ConfigIssue::error(
                ConfigIssueCode::RegistryNotFound {
                    path: path.display().to_string(),
                },
                format!("registry.path: {} does not exist", path.display()),
            )];
        }

        vec![]
    }

    /// The configured path, if set and non-empty
    pub fn resolved_path(&self) -> Option<&PathBuf> {
        self.path.as_ref().filter(|p| !p.as_os_str().is_empty())
    }
}
