//! Tool dependency graph use case
//!
//! Translates the tool store's records into a [`DirectedGraph<ToolId>`] and
//! answers closure and ordering questions over it. Nothing is cached: each
//! call reads the store again, so results always reflect the latest records.
//! Callers that need several answers from one consistent view load a
//! [`DependencySnapshot`] once and query it.

use crate::error::PlanningError;
use crate::ports::tool_store::ToolStorePort;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use toolplan_domain::{
    DependencyEdge, DirectedGraph, Direction, ExecutionGroup, ParameterBinding, ToolId,
    parallel_groups,
};
use tracing::{debug, warn};

/// A graph built from one read of the tool store, plus the dependency
/// records that became its edges.
#[derive(Debug, Clone, Default)]
pub struct DependencySnapshot {
    graph: DirectedGraph<ToolId>,
    edges: Vec<DependencyEdge>,
}

impl DependencySnapshot {
    /// Builds a snapshot from raw records.
    ///
    /// Records referencing a tool that is not in `tools` (inactive or never
    /// registered) are skipped.
    pub fn from_records(
        tools: impl IntoIterator<Item = ToolId>,
        records: impl IntoIterator<Item = DependencyEdge>,
    ) -> Self {
        let mut graph = DirectedGraph::new();
        for tool in tools {
            graph.add_node(tool);
        }

        let mut edges = Vec::new();
        for record in records {
            match graph.add_edge(&record.prerequisite, &record.dependent) {
                Ok(_) => edges.push(record),
                Err(_) => debug!(
                    prerequisite = %record.prerequisite,
                    dependent = %record.dependent,
                    "Skipping dependency with an absent endpoint"
                ),
            }
        }

        Self { graph, edges }
    }

    pub fn graph(&self) -> &DirectedGraph<ToolId> {
        &self.graph
    }

    /// Dependency records whose endpoints are both in the graph
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn into_graph(self) -> DirectedGraph<ToolId> {
        self.graph
    }

    /// Fails with every id that is not a node of the graph
    pub fn ensure_known(&self, ids: &[ToolId]) -> Result<(), PlanningError> {
        let unknown: Vec<ToolId> = ids
            .iter()
            .filter(|id| !self.graph.contains(id))
            .cloned()
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(PlanningError::unknown_tools(unknown))
        }
    }

    /// The requested tools plus every transitive prerequisite
    pub fn closure(&self, requested: &[ToolId]) -> Result<BTreeSet<ToolId>, PlanningError> {
        self.ensure_known(requested)?;
        Ok(self.graph.reachable_from(requested, Direction::Reverse)?)
    }

    /// Orders `ids` so every prerequisite comes before its dependents.
    ///
    /// All edges among `ids` are honoured when they are acyclic. When only
    /// OPTIONAL edges close a cycle, those edges are dropped for ordering.
    /// A cycle made of REQUIRED edges is an error.
    pub fn order<'a, I>(&self, ids: I) -> Result<Vec<ToolId>, PlanningError>
    where
        I: IntoIterator<Item = &'a ToolId>,
    {
        let ids: Vec<ToolId> = ids.into_iter().cloned().collect();
        self.ensure_known(&ids)?;

        let induced = self.graph.induced_subgraph(&ids)?;
        let cycles = induced.detect_cycles();
        if cycles.is_empty() {
            return Ok(induced.topological_sort(&ids)?);
        }

        let required = self.required_subgraph(&ids)?;
        if let Some(cycle) = required.detect_cycles().into_iter().next() {
            warn!(cycle = ?cycle, "Cycle detected among required dependencies");
            return Err(PlanningError::CycleDetected { cycle });
        }

        warn!(
            cycles = cycles.len(),
            "Optional dependencies form a cycle; ordering by required dependencies only"
        );
        Ok(required.topological_sort(&ids)?)
    }

    /// Levels `order` into groups using the REQUIRED edges among its members
    pub fn parallel_groups(&self, order: &[ToolId]) -> Result<Vec<ExecutionGroup>, PlanningError> {
        Ok(parallel_groups(order, &self.edges)?)
    }

    /// Parameter bindings each tool in `order` inherits from prerequisites
    /// that are also in `order`.
    pub fn parameter_bindings(&self, order: &[ToolId]) -> BTreeMap<ToolId, Vec<ParameterBinding>> {
        let members: BTreeSet<&ToolId> = order.iter().collect();
        let mut bindings: BTreeMap<ToolId, Vec<ParameterBinding>> = BTreeMap::new();

        for edge in &self.edges {
            if edge.mappings.is_empty()
                || !members.contains(&edge.prerequisite)
                || !members.contains(&edge.dependent)
            {
                continue;
            }
            bindings
                .entry(edge.dependent.clone())
                .or_default()
                .extend(edge.mappings.iter().map(|m| ParameterBinding {
                    from_tool: edge.prerequisite.clone(),
                    source: m.source.clone(),
                    target: m.target.clone(),
                }));
        }

        bindings
    }

    fn required_subgraph(&self, ids: &[ToolId]) -> Result<DirectedGraph<ToolId>, PlanningError> {
        let members: BTreeSet<&ToolId> = ids.iter().collect();
        let mut graph = DirectedGraph::new();
        for id in ids {
            graph.add_node(id.clone());
        }
        for edge in self.edges.iter().filter(|e| e.is_required()) {
            if members.contains(&edge.prerequisite) && members.contains(&edge.dependent) {
                graph.add_edge(&edge.prerequisite, &edge.dependent)?;
            }
        }
        Ok(graph)
    }
}

/// Builds dependency graphs from the tool store
#[derive(Clone)]
pub struct ToolDependencyGraphService {
    store: Arc<dyn ToolStorePort>,
}

impl ToolDependencyGraphService {
    pub fn new(store: Arc<dyn ToolStorePort>) -> Self {
        Self { store }
    }

    /// Reads the store once and builds a snapshot
    pub async fn load_snapshot(&self, include_inactive: bool) -> Result<DependencySnapshot, PlanningError> {
        let (tools, records) = futures::try_join!(
            self.store.list_tools(include_inactive),
            self.store.list_dependency_edges()
        )?;

        let snapshot = DependencySnapshot::from_records(
            tools
                .into_iter()
                .filter(|t| include_inactive || t.active)
                .map(|t| t.id),
            records,
        );
        debug!(
            nodes = snapshot.graph.len(),
            edges = snapshot.graph.edge_count(),
            include_inactive,
            "Built dependency graph"
        );
        Ok(snapshot)
    }

    /// Graph of the current records; inactive tools are left out unless asked for
    pub async fn build_dependency_graph(
        &self,
        include_inactive: bool,
    ) -> Result<DirectedGraph<ToolId>, PlanningError> {
        Ok(self.load_snapshot(include_inactive).await?.into_graph())
    }

    /// Requested tools plus all transitive prerequisites among active tools
    pub async fn get_dependency_closure(
        &self,
        requested: &[ToolId],
    ) -> Result<BTreeSet<ToolId>, PlanningError> {
        let closure = self.load_snapshot(false).await?.closure(requested)?;
        debug!(requested = requested.len(), closure = closure.len(), "Computed dependency closure");
        Ok(closure)
    }

    /// Orders `ids` so every prerequisite comes first
    pub async fn topological_sort(&self, ids: &[ToolId]) -> Result<Vec<ToolId>, PlanningError> {
        self.load_snapshot(false).await?.order(ids)
    }

    /// One representative cycle per cyclic component of the whole registry
    pub async fn detect_cycles(&self, include_inactive: bool) -> Result<Vec<Vec<ToolId>>, PlanningError> {
        Ok(self.load_snapshot(include_inactive).await?.graph.detect_cycles())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ports::tool_store::ToolStoreError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use toolplan_domain::ToolNode;

    /// Fixed-content tool store that counts reads
    pub(crate) struct MockToolStore {
        tools: Mutex<Vec<ToolNode>>,
        edges: Mutex<Vec<DependencyEdge>>,
        reads: Mutex<usize>,
    }

    impl MockToolStore {
        pub(crate) fn new(tools: Vec<ToolNode>, edges: Vec<DependencyEdge>) -> Self {
            Self {
                tools: Mutex::new(tools),
                edges: Mutex::new(edges),
                reads: Mutex::new(0),
            }
        }

        /// tool1 -> tool2 -> tool3, tool1 -> tool4
        pub(crate) fn sample() -> Self {
            Self::new(
                ["tool1", "tool2", "tool3", "tool4"].into_iter().map(ToolNode::new).collect(),
                vec![
                    DependencyEdge::new("tool1", "tool2"),
                    DependencyEdge::new("tool2", "tool3"),
                    DependencyEdge::new("tool1", "tool4"),
                ],
            )
        }

        pub(crate) fn add_edge(&self, edge: DependencyEdge) {
            self.edges.lock().unwrap().push(edge);
        }

        pub(crate) fn reads(&self) -> usize {
            *self.reads.lock().unwrap()
        }
    }

    #[async_trait]
    impl ToolStorePort for MockToolStore {
        async fn list_tools(&self, include_inactive: bool) -> Result<Vec<ToolNode>, ToolStoreError> {
            *self.reads.lock().unwrap() += 1;
            Ok(self
                .tools
                .lock()
                .unwrap()
                .iter()
                .filter(|t| include_inactive || t.active)
                .cloned()
                .collect())
        }

        async fn list_dependency_edges(&self) -> Result<Vec<DependencyEdge>, ToolStoreError> {
            Ok(self.edges.lock().unwrap().clone())
        }

        async fn get_tool(&self, id: &ToolId) -> Result<ToolNode, ToolStoreError> {
            self.tools
                .lock()
                .unwrap()
                .iter()
                .find(|t| &t.id == id)
                .cloned()
                .ok_or_else(|| ToolStoreError::NotFound(id.clone()))
        }
    }

    pub(crate) fn ids(names: &[&str]) -> Vec<ToolId> {
        names.iter().map(|n| ToolId::new(*n)).collect()
    }

    fn service(store: MockToolStore) -> ToolDependencyGraphService {
        ToolDependencyGraphService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_closure_contains_only_ancestors() {
        let service = service(MockToolStore::sample());
        let closure = service.get_dependency_closure(&ids(&["tool3"])).await.unwrap();
        assert_eq!(closure, ids(&["tool1", "tool2", "tool3"]).into_iter().collect());
    }

    #[tokio::test]
    async fn test_closure_is_idempotent() {
        let store = Arc::new(MockToolStore::sample());
        let service = ToolDependencyGraphService::new(store.clone());
        let first = service.get_dependency_closure(&ids(&["tool3", "tool4"])).await.unwrap();
        let second = service.get_dependency_closure(&ids(&["tool3", "tool4"])).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_unknown_tools_reported_together() {
        let service = service(MockToolStore::sample());
        let err = service
            .get_dependency_closure(&ids(&["zeta", "tool1", "alpha"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::UnknownTools(ref u) if *u == ids(&["alpha", "zeta"])));
    }

    #[tokio::test]
    async fn test_inactive_tools_are_excluded() {
        let store = MockToolStore::new(
            vec![ToolNode::new("a"), ToolNode::new("b").inactive(), ToolNode::new("c")],
            vec![DependencyEdge::new("a", "b"), DependencyEdge::new("b", "c")],
        );
        let service = service(store);

        let active = service.build_dependency_graph(false).await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active.edge_count(), 0);

        let all = service.build_dependency_graph(true).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.edge_count(), 2);

        let err = service.get_dependency_closure(&ids(&["b"])).await.unwrap_err();
        assert!(err.is_unknown_tool());
    }

    #[tokio::test]
    async fn test_topological_sort_breaks_ties_lexically() {
        let service = service(MockToolStore::sample());
        let order = service
            .topological_sort(&ids(&["tool4", "tool3", "tool2", "tool1"]))
            .await
            .unwrap();
        assert_eq!(order, ids(&["tool1", "tool2", "tool3", "tool4"]));
    }

    #[tokio::test]
    async fn test_required_cycle_is_an_error() {
        let store = MockToolStore::sample();
        store.add_edge(DependencyEdge::new("tool3", "tool1"));
        let service = service(store);

        let err = service
            .topological_sort(&ids(&["tool1", "tool2", "tool3"]))
            .await
            .unwrap_err();
        match err {
            PlanningError::CycleDetected { cycle } => {
                assert_eq!(cycle, ids(&["tool1", "tool2", "tool3"]));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cycle_outside_subset_is_ignored() {
        let store = MockToolStore::sample();
        store.add_edge(DependencyEdge::new("tool3", "tool1"));
        let service = service(store);

        let order = service.topological_sort(&ids(&["tool1", "tool4"])).await.unwrap();
        assert_eq!(order, ids(&["tool1", "tool4"]));
        assert_eq!(service.detect_cycles(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_optional_cycle_falls_back_to_required_edges() {
        let store = MockToolStore::sample();
        store.add_edge(DependencyEdge::new("tool3", "tool1").optional());
        let service = service(store);

        let order = service
            .topological_sort(&ids(&["tool1", "tool2", "tool3"]))
            .await
            .unwrap();
        assert_eq!(order, ids(&["tool1", "tool2", "tool3"]));
    }

    #[tokio::test]
    async fn test_optional_edges_order_when_acyclic() {
        let store = MockToolStore::new(
            vec![ToolNode::new("a"), ToolNode::new("b")],
            vec![DependencyEdge::new("b", "a").optional()],
        );
        let service = service(store);
        assert_eq!(service.topological_sort(&ids(&["a", "b"])).await.unwrap(), ids(&["b", "a"]));
    }

    #[test]
    fn test_parameter_bindings_need_prerequisite_in_order() {
        let snapshot = DependencySnapshot::from_records(
            ids(&["auth", "fetch", "report"]),
            vec![
                DependencyEdge::new("auth", "fetch").with_mapping("token", "auth_token"),
                DependencyEdge::new("fetch", "report").with_mapping("rows", "input"),
            ],
        );

        let bindings = snapshot.parameter_bindings(&ids(&["fetch", "report"]));
        assert_eq!(bindings.len(), 1);
        assert_eq!(
            bindings[&ToolId::new("report")],
            vec![ParameterBinding {
                from_tool: ToolId::new("fetch"),
                source: "rows".to_string(),
                target: "input".to_string(),
            }]
        );
    }

    #[test]
    fn test_snapshot_skips_dangling_records() {
        let snapshot = DependencySnapshot::from_records(
            ids(&["a", "b"]),
            vec![DependencyEdge::new("a", "b"), DependencyEdge::new("ghost", "b")],
        );
        assert_eq!(snapshot.edges().len(), 1);
        assert_eq!(snapshot.graph().edge_count(), 1);
    }
}
