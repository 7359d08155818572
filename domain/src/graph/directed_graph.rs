//! Directed graph with mirrored forward/reverse adjacency
//!
//! Both adjacency maps are updated together on every mutation, so
//! `successors(a)` contains `b` exactly when `predecessors(b)` contains `a`.
//! Adjacency sets are `BTreeSet`s: duplicates are impossible and neighbour
//! iteration follows node order, which keeps every algorithm deterministic.

use super::error::{GraphError, GraphResult};
use super::NodeId;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Traversal direction for reachability queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow edges `a -> b` from `a` to `b` (towards dependents)
    Forward,
    /// Follow edges `a -> b` from `b` back to `a` (towards prerequisites)
    Reverse,
}

/// A directed graph over opaque node identifiers
///
/// # Example
///
/// ```
/// use toolplan_domain::graph::DirectedGraph;
///
/// let mut graph = DirectedGraph::new();
/// graph.add_node("fetch");
/// graph.add_node("transform");
/// graph.add_node("store");
/// graph.add_edge(&"fetch", &"transform").unwrap();
/// graph.add_edge(&"transform", &"store").unwrap();
///
/// let order = graph.topological_sort(&["store", "fetch", "transform"]).unwrap();
/// assert_eq!(order, vec!["fetch", "transform", "store"]);
/// assert!(graph.detect_cycles().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct DirectedGraph<T: NodeId> {
    nodes: BTreeSet<T>,
    successors: HashMap<T, BTreeSet<T>>,
    predecessors: HashMap<T, BTreeSet<T>>,
}

impl<T: NodeId> Default for DirectedGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeId> DirectedGraph<T> {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self {
            nodes: BTreeSet::new(),
            successors: HashMap::new(),
            predecessors: HashMap::new(),
        }
    }

    /// Returns the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges
    pub fn edge_count(&self) -> usize {
        self.successors.values().map(BTreeSet::len).sum()
    }

    /// Returns true if the node was added
    pub fn contains(&self, id: &T) -> bool {
        self.nodes.contains(id)
    }

    /// Returns true if the edge `from -> to` exists
    pub fn has_edge(&self, from: &T, to: &T) -> bool {
        self.successors
            .get(from)
            .is_some_and(|succ| succ.contains(to))
    }

    /// Iterates over all nodes in ascending order
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter()
    }

    /// Iterates over all edges as `(from, to)` pairs, grouped by `from` in ascending order
    pub fn edges(&self) -> impl Iterator<Item = (&T, &T)> {
        self.nodes.iter().flat_map(move |from| {
            self.successors
                .get(from)
                .into_iter()
                .flatten()
                .map(move |to| (from, to))
        })
    }

    /// Adds a node. Returns `false` if it was already present.
    pub fn add_node(&mut self, id: T) -> bool {
        if self.nodes.contains(&id) {
            return false;
        }
        self.successors.insert(id.clone(), BTreeSet::new());
        self.predecessors.insert(id.clone(), BTreeSet::new());
        self.nodes.insert(id)
    }

    /// Adds the edge `from -> to`.
    ///
    /// Returns `Ok(false)` if the edge already existed. Both endpoints must
    /// have been added first.
    pub fn add_edge(&mut self, from: &T, to: &T) -> GraphResult<bool, T> {
        self.ensure_known(from)?;
        self.ensure_known(to)?;

        let inserted = self
            .successors
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        if inserted {
            self.predecessors
                .entry(to.clone())
                .or_default()
                .insert(from.clone());
        }
        Ok(inserted)
    }

    /// Immediate successors of a node (nodes that need it first)
    pub fn successors(&self, id: &T) -> GraphResult<&BTreeSet<T>, T> {
        self.successors
            .get(id)
            .ok_or_else(|| GraphError::unknown_node(id.clone()))
    }

    /// Immediate predecessors of a node (its prerequisites)
    pub fn predecessors(&self, id: &T) -> GraphResult<&BTreeSet<T>, T> {
        self.predecessors
            .get(id)
            .ok_or_else(|| GraphError::unknown_node(id.clone()))
    }

    /// All nodes reachable from `seeds` in the given direction, seeds included
    pub fn reachable_from<'a, I>(&self, seeds: I, direction: Direction) -> GraphResult<BTreeSet<T>, T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let adjacency = match direction {
            Direction::Forward => &self.successors,
            Direction::Reverse => &self.predecessors,
        };

        let mut reached = BTreeSet::new();
        let mut queue = VecDeque::new();
        for seed in seeds {
            self.ensure_known(seed)?;
            if reached.insert(seed.clone()) {
                queue.push_back(seed);
            }
        }

        while let Some(node) = queue.pop_front() {
            for next in adjacency.get(node).into_iter().flatten() {
                if reached.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }

        Ok(reached)
    }

    /// The subgraph on `subset` with every edge whose endpoints both lie in it
    pub fn induced_subgraph<'a, I>(&self, subset: I) -> GraphResult<DirectedGraph<T>, T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let members = self.collect_subset(subset)?;

        let mut sub = DirectedGraph::new();
        for node in &members {
            sub.add_node(node.clone());
        }
        for from in &members {
            for to in self.successors.get(from).into_iter().flatten() {
                if members.contains(to) {
                    sub.add_edge(from, to)?;
                }
            }
        }
        Ok(sub)
    }

    /// Returns one elementary cycle per strongly connected component that contains a cycle.
    ///
    /// Components are found with Tarjan's algorithm. Within each non-trivial
    /// component (or a single node with a self-edge) a cycle is traced from the
    /// component's smallest node back to itself. Cycles are ordered by their
    /// first node; an acyclic graph yields an empty list.
    pub fn detect_cycles(&self) -> Vec<Vec<T>> {
        let mut cycles: Vec<Vec<T>> = self
            .strongly_connected_components()
            .into_iter()
            .filter_map(|component| {
                let start = component.first()?.clone();
                let cyclic = component.len() > 1 || self.has_edge(&start, &start);
                cyclic.then(|| self.cycle_through(&start, &component))
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Orders `subset` so that every edge inside it points forward.
    ///
    /// Kahn's algorithm restricted to `subset`: in-degrees only count
    /// predecessors that are themselves in the subset. Among simultaneously
    /// available nodes the smallest id goes first, so the result is
    /// deterministic. Fails with [`GraphError::CycleDetected`] carrying the
    /// offending cycle when no order exists.
    pub fn topological_sort<'a, I>(&self, subset: I) -> GraphResult<Vec<T>, T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let members = self.collect_subset(subset)?;

        let mut in_degrees: HashMap<&T, usize> = members
            .iter()
            .map(|node| {
                let degree = self
                    .predecessors
                    .get(node)
                    .into_iter()
                    .flatten()
                    .filter(|p| members.contains(*p))
                    .count();
                (node, degree)
            })
            .collect();

        let mut ready: BTreeSet<&T> = in_degrees
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();

        let mut order = Vec::with_capacity(members.len());
        while let Some(node) = ready.pop_first() {
            order.push(node.clone());
            for next in self.successors.get(node).into_iter().flatten() {
                if let Some(degree) = in_degrees.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(next);
                    }
                }
            }
        }

        if order.len() == members.len() {
            return Ok(order);
        }

        // Whatever was never released sits on or behind a cycle.
        let placed: HashSet<&T> = order.iter().collect();
        let blocked: Vec<&T> = members.iter().filter(|n| !placed.contains(n)).collect();
        let cycle = self
            .induced_subgraph(blocked.iter().copied())?
            .detect_cycles()
            .into_iter()
            .next()
            .unwrap_or_else(|| blocked.into_iter().cloned().collect());
        Err(GraphError::cycle(cycle))
    }

    fn ensure_known(&self, id: &T) -> GraphResult<(), T> {
        if self.nodes.contains(id) {
            Ok(())
        } else {
            Err(GraphError::unknown_node(id.clone()))
        }
    }

    fn collect_subset<'a, I>(&self, subset: I) -> GraphResult<BTreeSet<T>, T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut members = BTreeSet::new();
        for node in subset {
            self.ensure_known(node)?;
            members.insert(node.clone());
        }
        Ok(members)
    }

    /// Tarjan's strongly connected components. Each component is sorted.
    fn strongly_connected_components(&self) -> Vec<Vec<T>> {
        let mut tarjan = Tarjan {
            graph: self,
            index_counter: 0,
            indices: HashMap::new(),
            lowlinks: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            components: Vec::new(),
        };

        for node in &self.nodes {
            if !tarjan.indices.contains_key(node) {
                tarjan.strong_connect(node);
            }
        }

        tarjan.components
    }

    /// Traces an elementary cycle from `start` back to itself inside `component`.
    ///
    /// Depth-first, smallest successor first.
    fn cycle_through(&self, start: &T, component: &[T]) -> Vec<T> {
        let members: HashSet<&T> = component.iter().collect();
        let mut path = vec![start.clone()];
        let mut visited: HashSet<&T> = HashSet::from([start]);
        let mut frontier = match self.successors.get(start) {
            Some(succ) => vec![succ.iter()],
            None => return path,
        };

        while !frontier.is_empty() {
            let next = frontier.last_mut().and_then(|succ| succ.next());
            match next {
                Some(node) if node == start => return path,
                Some(node) => {
                    if members.contains(node)
                        && visited.insert(node)
                        && let Some(succ) = self.successors.get(node)
                    {
                        path.push(node.clone());
                        frontier.push(succ.iter());
                    }
                }
                None => {
                    frontier.pop();
                    path.pop();
                }
            }
        }

        // Unreachable for a genuine component; fall back to its members.
        component.to_vec()
    }
}

struct Tarjan<'g, T: NodeId> {
    graph: &'g DirectedGraph<T>,
    index_counter: usize,
    indices: HashMap<&'g T, usize>,
    lowlinks: HashMap<&'g T, usize>,
    stack: Vec<&'g T>,
    on_stack: HashSet<&'g T>,
    components: Vec<Vec<T>>,
}

impl<'g, T: NodeId> Tarjan<'g, T> {
    /// Visits everything reachable from `root`.
    ///
    /// Iterative: each frame holds a node and the successors still to be
    /// examined, so the depth of the graph never reaches the call stack.
    fn strong_connect(&mut self, root: &'g T) {
        let graph = self.graph;
        let successors_of = move |node: &'g T| graph.successors.get(node).into_iter().flatten();

        self.visit(root);
        let mut frames = vec![(root, successors_of(root))];

        loop {
            let Some((node, pending)) = frames.last_mut() else {
                break;
            };
            let node = *node;
            match pending.next() {
                Some(next) => match self.indices.get(next) {
                    Some(&next_index) => {
                        if self.on_stack.contains(next) {
                            self.lower(node, next_index);
                        }
                    }
                    None => {
                        self.visit(next);
                        frames.push((next, successors_of(next)));
                    }
                },
                None => {
                    frames.pop();
                    let low = self.lowlinks.get(node).copied().unwrap_or(usize::MAX);
                    if let Some((parent, _)) = frames.last() {
                        self.lower(*parent, low);
                    }
                    if Some(&low) == self.indices.get(node) {
                        self.emit_component(node);
                    }
                }
            }
        }
    }

    fn visit(&mut self, node: &'g T) {
        self.indices.insert(node, self.index_counter);
        self.lowlinks.insert(node, self.index_counter);
        self.index_counter += 1;
        self.stack.push(node);
        self.on_stack.insert(node);
    }

    fn emit_component(&mut self, root: &'g T) {
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack.remove(member);
            component.push(member.clone());
            if member == root {
                break;
            }
        }
        component.sort();
        self.components.push(component);
    }

    fn lower(&mut self, node: &'g T, candidate: usize) {
        if let Some(low) = self.lowlinks.get_mut(node) {
            *low = (*low).min(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_of(nodes: &[&'static str], edges: &[(&'static str, &'static str)]) -> DirectedGraph<&'static str> {
        let mut graph = DirectedGraph::new();
        for node in nodes {
            graph.add_node(*node);
        }
        for (from, to) in edges {
            graph.add_edge(from, to).unwrap();
        }
        graph
    }

    /// tool1 -> tool2 -> tool3, tool1 -> tool4
    fn sample() -> DirectedGraph<&'static str> {
        graph_of(
            &["tool1", "tool2", "tool3", "tool4"],
            &[("tool1", "tool2"), ("tool2", "tool3"), ("tool1", "tool4")],
        )
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut graph = DirectedGraph::new();
        assert!(graph.add_node("a"));
        assert!(!graph.add_node("a"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_add_edge_requires_known_endpoints() {
        let mut graph = graph_of(&["a"], &[]);
        assert_eq!(
            graph.add_edge(&"a", &"b"),
            Err(GraphError::UnknownNode { node: "b" })
        );
        assert_eq!(
            graph.add_edge(&"z", &"a"),
            Err(GraphError::UnknownNode { node: "z" })
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_edge_is_noop() {
        let mut graph = graph_of(&["a", "b"], &[("a", "b")]);
        assert_eq!(graph.add_edge(&"a", &"b"), Ok(false));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.successors(&"a").unwrap().len(), 1);
        assert_eq!(graph.predecessors(&"b").unwrap().len(), 1);
    }

    #[test]
    fn test_adjacency_is_mirrored() {
        let graph = sample();
        for (from, to) in graph.edges() {
            assert!(graph.predecessors(to).unwrap().contains(from));
        }
        for node in graph.nodes() {
            for pred in graph.predecessors(node).unwrap() {
                assert!(graph.successors(pred).unwrap().contains(node));
            }
        }
    }

    #[test]
    fn test_neighbours_of_leaf_and_root_are_empty() {
        let graph = sample();
        assert!(graph.successors(&"tool3").unwrap().is_empty());
        assert!(graph.predecessors(&"tool1").unwrap().is_empty());
    }

    #[test]
    fn test_neighbours_of_unknown_node_fail() {
        let graph = sample();
        assert!(matches!(
            graph.successors(&"nope"),
            Err(GraphError::UnknownNode { node: "nope" })
        ));
        assert!(graph.predecessors(&"nope").is_err());
    }

    #[test]
    fn test_reverse_reachability_is_prerequisite_closure() {
        let graph = sample();
        let closure = graph.reachable_from(&["tool3"], Direction::Reverse).unwrap();
        assert_eq!(
            closure.into_iter().collect::<Vec<_>>(),
            vec!["tool1", "tool2", "tool3"]
        );
    }

    #[test]
    fn test_forward_reachability_includes_seeds() {
        let graph = sample();
        let reached = graph.reachable_from(&["tool2"], Direction::Forward).unwrap();
        assert_eq!(reached.into_iter().collect::<Vec<_>>(), vec!["tool2", "tool3"]);
    }

    #[test]
    fn test_reachability_with_unknown_seed_fails() {
        let graph = sample();
        assert!(graph.reachable_from(&["ghost"], Direction::Forward).is_err());
    }

    #[test]
    fn test_detect_cycles_on_acyclic_graph() {
        assert!(sample().detect_cycles().is_empty());
        assert!(DirectedGraph::<String>::new().detect_cycles().is_empty());
    }

    #[test]
    fn test_detect_three_node_cycle() {
        let graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let cycles = graph.detect_cycles();
        assert_eq!(cycles, vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_detect_self_loop() {
        let graph = graph_of(&["a", "b"], &[("a", "a"), ("a", "b")]);
        assert_eq!(graph.detect_cycles(), vec![vec!["a"]]);
    }

    #[test]
    fn test_long_chain_does_not_exhaust_the_stack() {
        let ids: Vec<String> = (0..100_000).map(|i| format!("t{i:06}")).collect();
        let mut graph = DirectedGraph::new();
        for id in &ids {
            graph.add_node(id.clone());
        }
        for pair in ids.windows(2) {
            graph.add_edge(&pair[0], &pair[1]).unwrap();
        }
        assert!(graph.detect_cycles().is_empty());
        assert_eq!(graph.topological_sort(&ids).unwrap(), ids);

        let (first, last) = (&ids[0], &ids[ids.len() - 1]);
        graph.add_edge(last, first).unwrap();
        let cycles = graph.detect_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], ids);
    }

    #[test]
    fn test_detect_one_cycle_per_component() {
        // Two disjoint cycles plus an acyclic tail hanging off one of them
        let graph = graph_of(
            &["a", "b", "c", "x", "y", "z"],
            &[("a", "b"), ("b", "a"), ("b", "c"), ("x", "y"), ("y", "z"), ("z", "x")],
        );
        let cycles = graph.detect_cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0], vec!["a", "b"]);
        assert_eq!(cycles[1], vec!["x", "y", "z"]);
    }

    #[test]
    fn test_extracted_cycle_is_elementary() {
        // a <-> b and b <-> c form one component; the traced cycle must still be simple
        let graph = graph_of(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")],
        );
        let cycles = graph.detect_cycles();
        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        let unique: HashSet<_> = cycle.iter().collect();
        assert_eq!(unique.len(), cycle.len());
        for pair in cycle.windows(2) {
            assert!(graph.has_edge(&pair[0], &pair[1]));
        }
        assert!(graph.has_edge(cycle.last().unwrap(), &cycle[0]));
    }

    #[test]
    fn test_topological_sort_respects_edges() {
        let graph = sample();
        let order = graph
            .topological_sort(&["tool4", "tool3", "tool2", "tool1"])
            .unwrap();
        let position = |n: &str| order.iter().position(|x| *x == n).unwrap();
        for (from, to) in graph.edges() {
            assert!(position(from) < position(to));
        }
    }

    #[test]
    fn test_topological_sort_breaks_ties_lexically() {
        let graph = sample();
        let order = graph
            .topological_sort(&["tool1", "tool2", "tool3", "tool4"])
            .unwrap();
        assert_eq!(order, vec!["tool1", "tool2", "tool3", "tool4"]);

        let again = graph
            .topological_sort(&["tool4", "tool2", "tool3", "tool1"])
            .unwrap();
        assert_eq!(order, again);
    }

    #[test]
    fn test_topological_sort_ignores_edges_leaving_the_subset() {
        let graph = sample();
        // tool1 is excluded, so tool2 and tool4 are both free to start
        let order = graph.topological_sort(&["tool4", "tool3", "tool2"]).unwrap();
        assert_eq!(order, vec!["tool2", "tool3", "tool4"]);
    }

    #[test]
    fn test_topological_sort_reports_cycle() {
        let graph = graph_of(
            &["a", "b", "c", "d"],
            &[("d", "a"), ("a", "b"), ("b", "c"), ("c", "b")],
        );
        let result = graph.topological_sort(&["a", "b", "c", "d"]);
        assert_eq!(
            result,
            Err(GraphError::CycleDetected {
                cycle: vec!["b", "c"]
            })
        );
    }

    #[test]
    fn test_topological_sort_with_unknown_member_fails() {
        let graph = sample();
        assert!(matches!(
            graph.topological_sort(&["tool1", "ghost"]),
            Err(GraphError::UnknownNode { node: "ghost" })
        ));
    }

    #[test]
    fn test_induced_subgraph_keeps_inner_edges_only() {
        let graph = sample();
        let sub = graph.induced_subgraph(&["tool2", "tool3", "tool4"]).unwrap();
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.edge_count(), 1);
        assert!(sub.has_edge(&"tool2", &"tool3"));
        assert!(!sub.contains(&"tool1"));
    }
}
