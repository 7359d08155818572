//! Declared parameter requirements
//!
//! Default [`ParameterRequirementPort`] adapter. It compares each tool's
//! declared parameters against what the caller supplied. A parameter is
//! satisfied when any of these hold:
//!
//! | Source | Example |
//! |--------|---------|
//! | Provided globally | `"user_id": 42` |
//! | Provided for the tool | `"fetch_user.user_id": 42` |
//! | Declared default | `default = 50` |
//! | Mapped from a prerequisite in the plan | `token -> auth_token` |
//!
//! A provided `null` counts as not provided. Unsatisfied parameters are
//! reported whether required or optional, ordered by priority then name.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use toolplan_application::ports::parameter_requirements::{
    ParameterRequirementError, ParameterRequirementPort,
};
use toolplan_application::ports::tool_store::ToolStorePort;
use toolplan_domain::{
    MissingParameters, ParameterRequirement, ParameterSpec, ProvidedParameters, ToolId, ToolNode,
};

/// Checks declared parameters from the tool store
pub struct DeclaredParameterRequirements {
    store: Arc<dyn ToolStorePort>,
}

impl DeclaredParameterRequirements {
    pub fn new(store: Arc<dyn ToolStorePort>) -> Self {
        Self { store }
    }

    fn is_provided(tool: &ToolId, name: &str, provided: &ProvidedParameters) -> bool {
        let present = |key: &str| provided.get(key).is_some_and(|v| !v.is_null());
        present(name) || present(&format!("{tool}.{name}"))
    }

    fn unmet(
        tool: &ToolNode,
        mapped: &HashSet<&str>,
        provided: &ProvidedParameters,
    ) -> Vec<ParameterRequirement> {
        let mut seen = HashSet::new();
        let mut unmet: Vec<&ParameterSpec> = tool
            .parameters
            .iter()
            .filter(|spec| seen.insert(spec.name.as_str()))
            .filter(|spec| {
                !spec.has_default()
                    && !mapped.contains(spec.name.as_str())
                    && !Self::is_provided(&tool.id, &spec.name, provided)
            })
            .collect();
        unmet.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        unmet.into_iter().map(ParameterRequirement::from).collect()
    }
}

#[async_trait]
impl ParameterRequirementPort for DeclaredParameterRequirements {
    async fn identify_missing_parameters(
        &self,
        ordered_tools: &[ToolId],
        provided: &ProvidedParameters,
    ) -> Result<MissingParameters, ParameterRequirementError> {
        let (tools, edges) = futures::try_join!(
            self.store.list_tools(true),
            self.store.list_dependency_edges()
        )?;
        let tools: HashMap<ToolId, ToolNode> = tools.into_iter().map(|t| (t.id.clone(), t)).collect();
        let members: BTreeSet<&ToolId> = ordered_tools.iter().collect();

        let mut mapped: HashMap<&ToolId, HashSet<&str>> = HashMap::new();
        for edge in edges.iter().filter(|e| members.contains(&e.prerequisite)) {
            mapped
                .entry(&edge.dependent)
                .or_default()
                .extend(edge.mappings.iter().map(|m| m.target.as_str()));
        }

        let no_mappings = HashSet::new();
        let mut missing = MissingParameters::new();
        for id in ordered_tools {
            let tool = tools
                .get(id)
                .ok_or_else(|| ParameterRequirementError::UnknownTool(id.clone()))?;
            let unmet = Self::unmet(tool, mapped.get(id).unwrap_or(&no_mappings), provided);
            if !unmet.is_empty() {
                tracing::debug!(tool = %id, missing = unmet.len(), "Unmet parameters");
                missing.insert(id.clone(), unmet);
            }
        }

        Ok(missing)
    }
}
