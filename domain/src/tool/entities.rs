//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered tool
///
/// Ordered lexically; that order is the tie-break used by topological sorting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(String);

impl ToolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ToolId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ToolId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ToolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity of a downstream resource shared by several tools
///
/// Typically a normalized base endpoint such as `https://api.example.com`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AffinityKey(String);

impl AffinityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AffinityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parameter declared by a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name
    pub name: String,
    /// Whether the tool cannot run without it
    #[serde(default)]
    pub required: bool,
    /// Lower values are asked for first
    #[serde(default)]
    pub priority: i32,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Example value shown when the parameter is requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Value used when nothing is provided
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            required,
            priority: 0,
            description: String::new(),
            example: None,
            default: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_default(mut self, default: impl Into<serde_json::Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// A tool as seen by the planner
///
/// This is a read-only view of the registry record: the planner never
/// invokes a tool, it only needs to know whether it is active, what it
/// asks for, and which downstream resource it talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolNode {
    pub id: ToolId,
    pub active: bool,
    #[serde(default)]
    pub description: String,
    /// Declared parameters
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Shared-resource identity, used only to annotate parallel groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity_key: Option<AffinityKey>,
}

impl ToolNode {
    pub fn new(id: impl Into<ToolId>) -> Self {
        Self {
            id: id.into(),
            active: true,
            description: String::new(),
            parameters: Vec::new(),
            affinity_key: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_affinity_key(mut self, key: impl Into<String>) -> Self {
        self.affinity_key = Some(AffinityKey::new(key));
        self
    }

    /// Names of the parameters the tool cannot run without
    pub fn required_parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_id_orders_lexically() {
        let mut ids = vec![ToolId::new("tool3"), ToolId::new("tool1"), ToolId::new("tool10")];
        ids.sort();
        assert_eq!(ids, vec![ToolId::new("tool1"), ToolId::new("tool10"), ToolId::new("tool3")]);
    }

    #[test]
    fn test_tool_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&ToolId::new("fetch_user")).unwrap();
        assert_eq!(json, "\"fetch_user\"");
    }

    #[test]
    fn test_tool_node_builder() {
        let tool = ToolNode::new("create_invoice")
            .with_parameter(ParameterSpec::new("customer_id", true).with_priority(1))
            .with_parameter(ParameterSpec::new("currency", false).with_default("EUR"))
            .with_affinity_key("https://billing.example.com");

        assert!(tool.active);
        assert_eq!(tool.required_parameter_names().collect::<Vec<_>>(), vec!["customer_id"]);
        assert!(tool.parameters[1].has_default());
        assert_eq!(
            tool.affinity_key.as_ref().map(AffinityKey::as_str),
            Some("https://billing.example.com")
        );
        assert!(!tool.inactive().active);
    }
}
