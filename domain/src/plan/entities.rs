//! Execution plan entities

use super::signature::RequestSignature;
use crate::tool::{AffinityKey, ParameterSpec, ToolId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Parameter values supplied by the caller, keyed by name or `tool.name`
pub type ProvidedParameters = HashMap<String, serde_json::Value>;

/// Unmet requirements per tool
pub type MissingParameters = BTreeMap<ToolId, Vec<ParameterRequirement>>;

/// A parameter the caller still has to supply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRequirement {
    pub name: String,
    pub required: bool,
    pub priority: i32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl From<&ParameterSpec> for ParameterRequirement {
    fn from(spec: &ParameterSpec) -> Self {
        Self {
            name: spec.name.clone(),
            required: spec.required,
            priority: spec.priority,
            description: spec.description.clone(),
            example: spec.example.clone(),
            default: spec.default.clone(),
        }
    }
}

/// A source → target binding inherited from a dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBinding {
    /// Prerequisite producing the value
    pub from_tool: ToolId,
    /// Output name on the prerequisite
    pub source: String,
    /// Parameter name on the dependent
    pub target: String,
}

/// Tools inside one group that share a downstream resource.
///
/// Lane members should be started one after another in the listed order;
/// tools outside the lane stay free to run alongside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityLane {
    pub key: AffinityKey,
    pub tools: Vec<ToolId>,
}

/// A set of tools that may run concurrently once every earlier group finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionGroup {
    /// Zero-based level; equals the group's index in the plan
    pub level: usize,
    /// Members, sorted by id
    pub tools: Vec<ToolId>,
    /// Ordering preferences among members with a shared affinity key
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affinity_lanes: Vec<AffinityLane>,
}

impl ExecutionGroup {
    pub fn new(level: usize, mut tools: Vec<ToolId>) -> Self {
        tools.sort();
        Self {
            level,
            tools,
            affinity_lanes: Vec::new(),
        }
    }

    pub fn contains(&self, tool: &ToolId) -> bool {
        self.tools.binary_search(tool).is_ok()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// An ordered, parallelizable plan for a requested set of tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub request_id: Uuid,
    pub signature: RequestSignature,
    /// Dependency closure of the request in a valid topological order
    pub tools_in_order: Vec<ToolId>,
    pub missing_parameters: MissingParameters,
    pub parameter_mappings: BTreeMap<ToolId, Vec<ParameterBinding>>,
    pub has_missing_required_parameters: bool,
    pub parallel_execution_groups: Vec<ExecutionGroup>,
    /// Assigned on publish; starts at 1 for each signature
    pub version: u32,
    /// Whether the affinity pass ran
    pub optimized: bool,
    pub generated_at: DateTime<Utc>,
}

impl ExecutionPlan {
    /// Creates an unpublished plan (version 0)
    pub fn new(signature: RequestSignature, tools_in_order: Vec<ToolId>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            signature,
            tools_in_order,
            missing_parameters: BTreeMap::new(),
            parameter_mappings: BTreeMap::new(),
            has_missing_required_parameters: false,
            parallel_execution_groups: Vec::new(),
            version: 0,
            optimized: false,
            generated_at: Utc::now(),
        }
    }

    pub fn with_missing_parameters(mut self, missing: MissingParameters, has_required: bool) -> Self {
        self.missing_parameters = missing;
        self.has_missing_required_parameters = has_required;
        self
    }

    pub fn with_parameter_mappings(mut self, mappings: BTreeMap<ToolId, Vec<ParameterBinding>>) -> Self {
        self.parameter_mappings = mappings;
        self
    }

    pub fn with_groups(mut self, groups: Vec<ExecutionGroup>, optimized: bool) -> Self {
        self.parallel_execution_groups = groups;
        self.optimized = optimized;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn is_published(&self) -> bool {
        self.version > 0
    }

    /// Required parameters still missing, as `(tool, requirement)` pairs
    pub fn missing_required(&self) -> impl Iterator<Item = (&ToolId, &ParameterRequirement)> {
        self.missing_parameters
            .iter()
            .flat_map(|(tool, reqs)| reqs.iter().map(move |r| (tool, r)))
            .filter(|(_, r)| r.required)
    }
}
