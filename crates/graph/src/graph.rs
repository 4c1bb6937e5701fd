use crate::error::{GraphError, Result};
use crate::types::{EdgeKind, Reach, ReferenceEdge, TraversalDirection};
use docctx_units::UnitId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Reference graph over unit ids.
///
/// Nodes live in a petgraph arena and are addressed through an id map;
/// traversal is iterative with a visited set, so cycles and deep chains are
/// both safe.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<UnitId, EdgeKind>,
    nodes: HashMap<UnitId, NodeIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit as a node (idempotent)
    pub fn add_unit(&mut self, id: UnitId) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.nodes.insert(id, idx);
        idx
    }

    /// Add a directed edge between two registered units.
    ///
    /// Returns `false` when the identical (source, target, kind) edge already
    /// exists; the same pair may carry several kinds.
    pub fn add_edge(&mut self, src: &UnitId, dst: &UnitId, kind: EdgeKind) -> Result<bool> {
        let from = self.node(src)?;
        let to = self.node(dst)?;

        let exists = self
            .graph
            .edges_connecting(from, to)
            .any(|edge| *edge.weight() == kind);
        if exists {
            return Ok(false);
        }
        self.graph.add_edge(from, to, kind);
        Ok(true)
    }

    #[must_use]
    pub fn contains(&self, id: &UnitId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Units one hop away in `direction`, restricted to `kinds` (empty = all).
    ///
    /// Unknown ids have no neighbours.
    #[must_use]
    pub fn neighbors(
        &self,
        id: &UnitId,
        direction: TraversalDirection,
        kinds: &[EdgeKind],
    ) -> BTreeSet<UnitId> {
        let Some(&idx) = self.nodes.get(id) else {
            return BTreeSet::new();
        };
        self.adjacent(idx, direction, kinds)
            .into_iter()
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Everything within `max_hops` of `id` in both directions, over all kinds
    #[must_use]
    pub fn expand(&self, id: &UnitId, max_hops: usize) -> Vec<Reach> {
        self.expand_with(id, max_hops, TraversalDirection::Both, &[])
    }

    /// Breadth-first expansion.
    ///
    /// Each unit is yielded once with its minimum hop distance; the origin is
    /// never yielded. Output is sorted by (hops, id).
    #[must_use]
    pub fn expand_with(
        &self,
        id: &UnitId,
        max_hops: usize,
        direction: TraversalDirection,
        kinds: &[EdgeKind],
    ) -> Vec<Reach> {
        let Some(&origin) = self.nodes.get(id) else {
            return Vec::new();
        };
        if max_hops == 0 {
            return Vec::new();
        }

        let mut visited: HashMap<NodeIndex, usize> = HashMap::new();
        visited.insert(origin, 0);
        let mut queue = VecDeque::from([(origin, 0usize)]);

        while let Some((current, hops)) = queue.pop_front() {
            if hops == max_hops {
                continue;
            }
            for next in self.adjacent(current, direction, kinds) {
                if visited.contains_key(&next) {
                    continue;
                }
                visited.insert(next, hops + 1);
                queue.push_back((next, hops + 1));
            }
        }

        let mut reached: Vec<Reach> = visited
            .into_iter()
            .filter(|&(idx, _)| idx != origin)
            .map(|(idx, hops)| Reach {
                id: self.graph[idx].clone(),
                hops,
            })
            .collect();
        reached.sort_by(|a, b| a.hops.cmp(&b.hops).then_with(|| a.id.cmp(&b.id)));
        reached
    }

    /// Outgoing and incoming edges of one unit, sorted
    #[must_use]
    pub fn edges_of(&self, id: &UnitId) -> Vec<ReferenceEdge> {
        let Some(&idx) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<ReferenceEdge> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|edge| ReferenceEdge {
                source: self.graph[edge.source()].clone(),
                target: self.graph[edge.target()].clone(),
                kind: *edge.weight(),
            })
            .collect();
        edges.sort();
        edges.dedup();
        edges
    }

    /// All edges, sorted
    #[must_use]
    pub fn edges(&self) -> Vec<ReferenceEdge> {
        let mut edges: Vec<ReferenceEdge> = self
            .graph
            .edge_references()
            .map(|edge| ReferenceEdge {
                source: self.graph[edge.source()].clone(),
                target: self.graph[edge.target()].clone(),
                kind: *edge.weight(),
            })
            .collect();
        edges.sort();
        edges
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
        }
    }

    fn node(&self, id: &UnitId) -> Result<NodeIndex> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownUnit(id.clone()))
    }

    fn adjacent(
        &self,
        idx: NodeIndex,
        direction: TraversalDirection,
        kinds: &[EdgeKind],
    ) -> Vec<NodeIndex> {
        let wanted = |kind: &EdgeKind| kinds.is_empty() || kinds.contains(kind);
        let mut out = Vec::new();

        if matches!(
            direction,
            TraversalDirection::Outgoing | TraversalDirection::Both
        ) {
            out.extend(
                self.graph
                    .edges_directed(idx, Direction::Outgoing)
                    .filter(|e| wanted(e.weight()))
                    .map(|e| e.target()),
            );
        }
        if matches!(
            direction,
            TraversalDirection::Incoming | TraversalDirection::Both
        ) {
            out.extend(
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .filter(|e| wanted(e.weight()))
                    .map(|e| e.source()),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> UnitId {
        UnitId::from(s)
    }

    #[test]
    fn test_duplicate_edges_are_ignored_but_kinds_coexist() {
        let mut graph = DependencyGraph::new();
        graph.add_unit(id("a"));
        graph.add_unit(id("b"));

        assert!(graph.add_edge(&id("a"), &id("b"), EdgeKind::Calls).unwrap());
        assert!(!graph.add_edge(&id("a"), &id("b"), EdgeKind::Calls).unwrap());
        assert!(graph.add_edge(&id("a"), &id("b"), EdgeKind::Instantiates).unwrap());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_edge_to_unknown_unit_is_rejected() {
        let mut graph = DependencyGraph::new();
        graph.add_unit(id("a"));
        assert_eq!(
            graph.add_edge(&id("a"), &id("ext"), EdgeKind::Imports),
            Err(GraphError::UnknownUnit(id("ext")))
        );
    }

    #[test]
    fn test_expand_keeps_minimum_hops() {
        // a -> b -> c, a -> c
        let mut graph = DependencyGraph::new();
        for n in ["a", "b", "c"] {
            graph.add_unit(id(n));
        }
        graph.add_edge(&id("a"), &id("b"), EdgeKind::Calls).unwrap();
        graph.add_edge(&id("b"), &id("c"), EdgeKind::Calls).unwrap();
        graph.add_edge(&id("a"), &id("c"), EdgeKind::Imports).unwrap();

        assert_eq!(
            graph.expand(&id("a"), 3),
            vec![
                Reach { id: id("b"), hops: 1 },
                Reach { id: id("c"), hops: 1 },
            ]
        );
    }
}
