//! Layering of an ordered tool list into parallel execution groups
//!
//! Each tool gets `level = 1 + max(level of its REQUIRED prerequisites in the
//! list)`, or 0 when it has none. Tools sharing a level form a group.
//!
//! This places every tool at its earliest feasible level, and every tool in
//! group `i` has all of its required prerequisites in groups `< i`. Optional
//! edges never delay a tool.

use super::entities::ExecutionGroup;
use crate::graph::{DirectedGraph, GraphResult};
use crate::tool::{DependencyEdge, ToolId};
use std::collections::{BTreeMap, HashMap};

/// Groups `order` into levels using the REQUIRED edges among its members.
///
/// `order` does not have to be topologically sorted; levels are computed
/// from the edges. Fails with a cycle error if the required edges among
/// the members are cyclic.
pub fn parallel_groups<'a, I>(order: &[ToolId], edges: I) -> GraphResult<Vec<ExecutionGroup>, ToolId>
where
    I: IntoIterator<Item = &'a DependencyEdge>,
{
    let mut graph = DirectedGraph::new();
    for tool in order {
        graph.add_node(tool.clone());
    }
    for edge in edges {
        if edge.is_required() && graph.contains(&edge.prerequisite) && graph.contains(&edge.dependent) {
            graph.add_edge(&edge.prerequisite, &edge.dependent)?;
        }
    }

    let sorted = graph.topological_sort(order)?;

    let mut levels: HashMap<&ToolId, usize> = HashMap::with_capacity(sorted.len());
    let mut by_level: BTreeMap<usize, Vec<ToolId>> = BTreeMap::new();
    for tool in &sorted {
        let level = graph
            .predecessors(tool)?
            .iter()
            .filter_map(|p| levels.get(p))
            .map(|l| l + 1)
            .max()
            .unwrap_or(0);
        levels.insert(tool, level);
        by_level.entry(level).or_default().push(tool.clone());
    }

    Ok(by_level
        .into_iter()
        .map(|(level, tools)| ExecutionGroup::new(level, tools))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphError;

    fn ids(names: &[&str]) -> Vec<ToolId> {
        names.iter().map(|n| ToolId::new(*n)).collect()
    }

    fn tools_per_group(groups: &[ExecutionGroup]) -> Vec<Vec<&str>> {
        groups
            .iter()
            .map(|g| g.tools.iter().map(ToolId::as_str).collect())
            .collect()
    }

    #[test]
    fn test_siblings_share_a_level() {
        let edges = vec![
            DependencyEdge::new("tool1", "tool2"),
            DependencyEdge::new("tool2", "tool3"),
            DependencyEdge::new("tool1", "tool4"),
        ];
        let groups = parallel_groups(&ids(&["tool1", "tool2", "tool3", "tool4"]), &edges).unwrap();

        assert_eq!(
            tools_per_group(&groups),
            vec![vec!["tool1"], vec!["tool2", "tool4"], vec!["tool3"]]
        );
        assert_eq!(groups.iter().map(|g| g.level).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_level_follows_longest_required_chain() {
        // a -> b -> c and a -> c: c must wait for b
        let edges = vec![
            DependencyEdge::new("a", "b"),
            DependencyEdge::new("b", "c"),
            DependencyEdge::new("a", "c"),
        ];
        let groups = parallel_groups(&ids(&["a", "b", "c"]), &edges).unwrap();
        assert_eq!(tools_per_group(&groups), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_optional_edges_do_not_delay() {
        let edges = vec![DependencyEdge::new("a", "b").optional()];
        let groups = parallel_groups(&ids(&["a", "b"]), &edges).unwrap();
        assert_eq!(tools_per_group(&groups), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_prerequisites_outside_the_order_are_ignored() {
        let edges = vec![DependencyEdge::new("outside", "b"), DependencyEdge::new("b", "c")];
        let groups = parallel_groups(&ids(&["b", "c"]), &edges).unwrap();
        assert_eq!(tools_per_group(&groups), vec![vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_required_cycle_is_reported() {
        let edges = vec![DependencyEdge::new("a", "b"), DependencyEdge::new("b", "a")];
        let result = parallel_groups(&ids(&["a", "b"]), &edges);
        assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
    }

    #[test]
    fn test_empty_order_has_no_groups() {
        let groups = parallel_groups(&[], &Vec::<DependencyEdge>::new()).unwrap();
        assert!(groups.is_empty());
    }
}
