//! Dependency records between tools
//!
//! A [`DependencyEdge`] says that `dependent` needs `prerequisite`. In the
//! dependency graph it becomes the edge `prerequisite -> dependent`.

use super::entities::ToolId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strength of a dependency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// The dependent cannot run before the prerequisite has completed
    #[default]
    Required,
    /// Ordering preference only; never makes planning fail
    Optional,
}

impl DependencyType {
    pub fn as_str(&self) -> &str {
        match self {
            DependencyType::Required => "required",
            DependencyType::Optional => "optional",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, DependencyType::Required)
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "required" => Ok(DependencyType::Required),
            "optional" => Ok(DependencyType::Optional),
            other => Err(format!("unknown dependency type '{}'", other)),
        }
    }
}

/// Feeds an output of the prerequisite into a parameter of the dependent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterMapping {
    /// Output name on the prerequisite
    pub source: String,
    /// Parameter name on the dependent
    pub target: String,
}

impl ParameterMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A dependency record as kept by the tool store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub prerequisite: ToolId,
    pub dependent: ToolId,
    #[serde(rename = "type", default)]
    pub dependency_type: DependencyType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<ParameterMapping>,
}

impl DependencyEdge {
    pub fn new(prerequisite: impl Into<ToolId>, dependent: impl Into<ToolId>) -> Self {
        Self {
            prerequisite: prerequisite.into(),
            dependent: dependent.into(),
            dependency_type: DependencyType::Required,
            mappings: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.dependency_type = DependencyType::Optional;
        self
    }

    pub fn with_mapping(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.mappings.push(ParameterMapping::new(source, target));
        self
    }

    pub fn is_required(&self) -> bool {
        self.dependency_type.is_required()
    }
}
