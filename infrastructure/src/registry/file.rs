//! Registry file format (TOML)
//!
//! ```toml
//! [[tools]]
//! id = "fetch_user"
//! description = "Loads a user profile"
//! endpoint = "https://api.example.com/v1/users"
//!
//! [[tools.parameters]]
//! name = "user_id"
//! required = true
//! priority = 1
//! example = "42"
//!
//! [[dependencies]]
//! prerequisite = "authenticate"
//! dependent = "fetch_user"
//! type = "required"                # "required" or "optional"
//!
//! [[dependencies.mappings]]
//! source = "token"
//! target = "auth_token"
//! ```
//!
//! `affinity_key` may be given instead of (or to override) `endpoint`.

use super::RegistryError;
use crate::affinity::normalize_endpoint;
use serde::{Deserialize, Serialize};
use toolplan_domain::{AffinityKey, DependencyEdge, ParameterSpec, ToolId, ToolNode};

/// Raw registry file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryFile {
    pub tools: Vec<FileTool>,
    pub dependencies: Vec<DependencyEdge>,
}

/// Raw `[[tools]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTool {
    pub id: ToolId,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub description: String,
    /// Base URL the tool calls; the affinity key is derived from it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Explicit affinity key, taken as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity_key: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

fn default_active() -> bool {
    true
}

impl FileTool {
    /// Converts to the planner's view of the tool
    pub fn into_node(self) -> Result<ToolNode, RegistryError> {
        let affinity_key = match (self.affinity_key, self.endpoint) {
            (Some(key), _) => Some(AffinityKey::new(key)),
            (None, Some(endpoint)) => Some(normalize_endpoint(&endpoint).ok_or_else(|| {
                RegistryError::InvalidEndpoint {
                    tool: self.id.clone(),
                    endpoint,
                }
            })?),
            (None, None) => None,
        };

        Ok(ToolNode {
            id: self.id,
            active: self.active,
            description: self.description,
            parameters: self.parameters,
            affinity_key,
        })
    }
}

impl RegistryFile {
    pub fn parse(content: &str) -> Result<Self, RegistryError> {
        Ok(toml::from_str(content)?)
    }

    /// Tool nodes and dependency records, in file order
    pub fn into_records(self) -> Result<(Vec<ToolNode>, Vec<DependencyEdge>), RegistryError> {
        let tools = self
            .tools
            .into_iter()
            .map(FileTool::into_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((tools, self.dependencies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolplan_domain::DependencyType;

    const SAMPLE: &str = r#"
[[tools]]
id = "authenticate"
endpoint = "https://Auth.Example.com/oauth/token"

[[tools.parameters]]
name = "client_secret"
required = true

[[tools]]
id = "fetch_user"
active = false
affinity_key = "users-api"

[[tools.parameters]]
name = "page_size"
default = 50

[[dependencies]]
prerequisite = "authenticate"
dependent = "fetch_user"

[[dependencies.mappings]]
source = "token"
target = "auth_token"

[[dependencies]]
prerequisite = "fetch_user"
dependent = "authenticate"
type = "optional"
"#;

    #[test]
    fn test_parse_sample() {
        let (tools, edges) = RegistryFile::parse(SAMPLE).unwrap().into_records().unwrap();

        assert_eq!(tools.len(), 2);
        assert!(tools[0].active);
        assert_eq!(
            tools[0].affinity_key,
            Some(AffinityKey::new("https://auth.example.com"))
        );
        assert!(tools[0].parameters[0].required);

        assert!(!tools[1].active);
        assert_eq!(tools[1].affinity_key, Some(AffinityKey::new("users-api")));
        assert_eq!(tools[1].parameters[0].default, Some(serde_json::json!(50)));

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].dependency_type, DependencyType::Required);
        assert_eq!(edges[0].mappings[0].target, "auth_token");
        assert_eq!(edges[1].dependency_type, DependencyType::Optional);
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let content = r#"
[[tools]]
id = "socket_tool"
endpoint = "file:///var/run/tool.sock"
"#;
        let err = RegistryFile::parse(content).unwrap().into_records().unwrap_err();
        assert!(matches!(err, RegistryError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_unknown_dependency_type_fails_to_parse() {
        let content = r#"
[[dependencies]]
prerequisite = "a"
dependent = "b"
type = "sometimes"
"#;
        assert!(matches!(RegistryFile::parse(content), Err(RegistryError::Parse(_))));
    }
}
