//! Execution plan use case
//!
//! Generates, versions and retrieves [`ExecutionPlan`]s.
//!
//! # Flow
//!
//! ```text
//! generate_execution_plan(requested, provided)
//!   │
//!   ├─ Closure     requested + transitive prerequisites    (UnknownTools)
//!   ├─ Order       topological, lexical tie-break          (CycleDetected)
//!   ├─ Parameters  ParameterRequirementPort pass-through
//!   ├─ Layering    level = 1 + max(required prerequisite levels)
//!   ├─ Affinity    lanes per shared AffinityKey (policy dependent)
//!   └─ Publish     next version for the request signature
//! ```
//!
//! Every stage before publish is a pure function of one store snapshot.
//! A call that fails anywhere before publish leaves the version store
//! untouched.

use super::dependency_graph::{DependencySnapshot, ToolDependencyGraphService};
use crate::config::PlanningParams;
use crate::error::PlanningError;
use crate::ports::api_affinity::ApiAffinityPort;
use crate::ports::parameter_requirements::ParameterRequirementPort;
use crate::ports::plan_version_store::{InMemoryPlanVersionStore, PlanVersionStore};
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use toolplan_domain::{
    AffinityKey, ExecutionGroup, ExecutionPlan, ProvidedParameters, RequestSignature, ToolId,
    apply_affinity,
};
use tracing::{debug, info};

/// Use case for building and versioning execution plans
pub struct ExecutionPlanService {
    graph: ToolDependencyGraphService,
    parameters: Arc<dyn ParameterRequirementPort>,
    affinity: Arc<dyn ApiAffinityPort>,
    versions: Arc<dyn PlanVersionStore>,
    params: PlanningParams,
}

impl ExecutionPlanService {
    /// Creates a service with a private in-memory version store
    pub fn new(
        graph: ToolDependencyGraphService,
        parameters: Arc<dyn ParameterRequirementPort>,
        affinity: Arc<dyn ApiAffinityPort>,
    ) -> Self {
        Self {
            graph,
            parameters,
            affinity,
            versions: Arc::new(InMemoryPlanVersionStore::new()),
            params: PlanningParams::default(),
        }
    }

    /// Shares a version store, e.g. one process-wide instance
    pub fn with_version_store(mut self, versions: Arc<dyn PlanVersionStore>) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_params(mut self, params: PlanningParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &PlanningParams {
        &self.params
    }

    pub fn version_store(&self) -> &Arc<dyn PlanVersionStore> {
        &self.versions
    }

    /// Builds a plan for `requested` and publishes it as the next version
    /// of the request's signature.
    pub async fn generate_execution_plan(
        &self,
        requested: &[ToolId],
        provided: &ProvidedParameters,
    ) -> Result<ExecutionPlan, PlanningError> {
        let signature = RequestSignature::new(requested.iter().cloned());
        if signature.is_empty() && !self.params.allow_empty_request {
            return Err(PlanningError::EmptyRequest);
        }

        let snapshot = self.graph.load_snapshot(false).await?;
        let closure = snapshot.closure(signature.tool_ids())?;
        let order = snapshot.order(&closure)?;
        debug!(
            signature = %signature,
            closure = closure.len(),
            "Ordered dependency closure"
        );

        let missing = self
            .parameters
            .identify_missing_parameters(&order, provided)
            .await?;
        let has_missing_required = self.parameters.has_required_parameters_missing(&missing);

        let mut groups = snapshot.parallel_groups(&order)?;
        let optimized = self.optimize(&mut groups, &order).await?;
        let mappings = snapshot.parameter_bindings(&order);

        let plan = ExecutionPlan::new(signature, order)
            .with_missing_parameters(missing, has_missing_required)
            .with_parameter_mappings(mappings)
            .with_groups(groups, optimized);

        let plan = self.versions.publish(plan);
        info!(
            signature = %plan.signature,
            version = plan.version,
            tools = plan.tools_in_order.len(),
            groups = plan.parallel_execution_groups.len(),
            missing_required = plan.has_missing_required_parameters,
            "Published execution plan"
        );
        Ok(plan)
    }

    /// Levels `order` into parallel groups against the current registry.
    ///
    /// Only REQUIRED edges between members of `order` are considered. No
    /// affinity lanes are attached.
    pub async fn identify_parallel_execution_groups(
        &self,
        order: &[ToolId],
    ) -> Result<Vec<ExecutionGroup>, PlanningError> {
        let snapshot: DependencySnapshot = self.graph.load_snapshot(false).await?;
        snapshot.ensure_known(order)?;
        snapshot.parallel_groups(order)
    }

    /// A specific published version for the requested set
    pub fn get_execution_plan_version(
        &self,
        requested: &[ToolId],
        version: u32,
    ) -> Result<ExecutionPlan, PlanningError> {
        let signature = RequestSignature::new(requested.iter().cloned());
        self.versions
            .version(&signature, version)
            .ok_or(PlanningError::VersionNotFound { signature, version })
    }

    /// Every published version for the requested set, keyed by version
    pub fn get_all_execution_plan_versions(&self, requested: &[ToolId]) -> BTreeMap<u32, ExecutionPlan> {
        self.versions
            .versions(&RequestSignature::new(requested.iter().cloned()))
    }

    /// The most recent version for the requested set
    pub fn latest_execution_plan(&self, requested: &[ToolId]) -> Option<ExecutionPlan> {
        self.versions
            .latest(&RequestSignature::new(requested.iter().cloned()))
    }

    /// Runs the affinity pass. Returns whether it ran.
    async fn optimize(&self, groups: &mut [ExecutionGroup], order: &[ToolId]) -> Result<bool, PlanningError> {
        let policy = self.params.affinity_policy;
        if !policy.is_enabled() {
            return Ok(apply_affinity(policy, groups, order, &HashMap::new()));
        }

        let lookups = order.iter().map(|id| async move {
            self.affinity
                .affinity_key(id)
                .await
                .map(|key| key.map(|k| (id.clone(), k)))
        });
        let keys: HashMap<ToolId, AffinityKey> = try_join_all(lookups)
            .await?
            .into_iter()
            .flatten()
            .collect();

        debug!(keyed = keys.len(), policy = %policy, "Resolved affinity keys");
        Ok(apply_affinity(policy, groups, order, &keys))
    }
}
