//! Tests for DependencyGraph operations

use docctx_graph::{
    DependencyGraph, EdgeKind, GraphBuilder, RawReference, Reach, TraversalDirection,
};
use docctx_units::{SourceSpan, StructuralUnit, UnitId, UnitKind, UnitStore};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn id(name: &str) -> UnitId {
    UnitId::from(name)
}

fn make_graph(nodes: &[&str], edges: &[(&str, &str, EdgeKind)]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for node in nodes {
        graph.add_unit(id(node));
    }
    for (src, dst, kind) in edges {
        graph.add_edge(&id(src), &id(dst), *kind).unwrap();
    }
    graph
}

fn make_unit(file: &str, name: &str) -> StructuralUnit {
    StructuralUnit::new(
        file,
        name,
        UnitKind::Function,
        SourceSpan::new(1, 3, format!("def {name}(): pass")),
    )
}

fn ids(reach: &[Reach]) -> Vec<(&str, usize)> {
    reach.iter().map(|r| (r.id.as_str(), r.hops)).collect()
}

#[test]
fn test_neighbors_by_direction() {
    let graph = make_graph(
        &["a", "b", "c"],
        &[("a", "b", EdgeKind::Calls), ("c", "a", EdgeKind::Imports)],
    );

    let out = graph.neighbors(&id("a"), TraversalDirection::Outgoing, &[]);
    let inc = graph.neighbors(&id("a"), TraversalDirection::Incoming, &[]);
    let both = graph.neighbors(&id("a"), TraversalDirection::Both, &[]);

    assert_eq!(out, BTreeSet::from([id("b")]));
    assert_eq!(inc, BTreeSet::from([id("c")]));
    assert_eq!(both, BTreeSet::from([id("b"), id("c")]));
}

#[test]
fn test_neighbors_by_kind() {
    let graph = make_graph(
        &["a", "b", "c"],
        &[("a", "b", EdgeKind::Calls), ("a", "c", EdgeKind::Inherits)],
    );

    let inherits = graph.neighbors(&id("a"), TraversalDirection::Outgoing, &[EdgeKind::Inherits]);
    assert_eq!(inherits, BTreeSet::from([id("c")]));

    let none = graph.neighbors(&id("a"), TraversalDirection::Incoming, &[EdgeKind::Calls]);
    assert!(none.is_empty());
}

#[test]
fn test_neighbors_of_unknown_unit_is_empty() {
    let graph = make_graph(&["a"], &[]);
    assert!(graph
        .neighbors(&id("missing"), TraversalDirection::Both, &[])
        .is_empty());
    assert!(graph.expand(&id("missing"), 3).is_empty());
}

#[test]
fn test_expand_depth_1() {
    let graph = make_graph(
        &["a", "b", "c", "d"],
        &[
            ("a", "b", EdgeKind::Calls),
            ("b", "c", EdgeKind::Calls),
            ("d", "a", EdgeKind::Imports),
        ],
    );

    assert_eq!(ids(&graph.expand(&id("a"), 1)), vec![("b", 1), ("d", 1)]);
}

#[test]
fn test_expand_depth_2() {
    let graph = make_graph(
        &["a", "b", "c", "d"],
        &[
            ("a", "b", EdgeKind::Calls),
            ("b", "c", EdgeKind::Calls),
            ("d", "a", EdgeKind::Imports),
        ],
    );

    assert_eq!(
        ids(&graph.expand(&id("a"), 2)),
        vec![("b", 1), ("d", 1), ("c", 2)]
    );
}

#[test]
fn test_expand_zero_hops_is_empty() {
    let graph = make_graph(&["a", "b"], &[("a", "b", EdgeKind::Calls)]);
    assert!(graph.expand(&id("a"), 0).is_empty());
}

#[test]
fn test_expand_terminates_on_cycles() {
    let graph = make_graph(
        &["a", "b", "c"],
        &[
            ("a", "b", EdgeKind::Calls),
            ("b", "c", EdgeKind::Calls),
            ("c", "a", EdgeKind::Calls),
            ("b", "b", EdgeKind::Calls),
        ],
    );

    let reached = graph.expand(&id("a"), 50);
    assert_eq!(ids(&reached), vec![("b", 1), ("c", 1)]);
    assert!(reached.iter().all(|r| r.id != id("a")));
}

#[test]
fn test_expand_is_monotonic_in_hops() {
    let mut edges = Vec::new();
    let names: Vec<String> = (0..8).map(|i| format!("n{i}")).collect();
    for pair in names.windows(2) {
        edges.push((pair[0].as_str(), pair[1].as_str(), EdgeKind::Calls));
    }
    edges.push(("n2", "n6", EdgeKind::Imports));
    let nodes: Vec<&str> = names.iter().map(String::as_str).collect();
    let graph = make_graph(&nodes, &edges);

    let mut previous: BTreeSet<UnitId> = BTreeSet::new();
    for hops in 0..8 {
        let current: BTreeSet<UnitId> = graph
            .expand(&id("n0"), hops)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert!(previous.is_subset(&current), "hops={hops}");
        previous = current;
    }
    assert_eq!(previous.len(), 7);
}

#[test]
fn test_expand_outgoing_only() {
    let graph = make_graph(
        &["a", "b", "c"],
        &[("a", "b", EdgeKind::Calls), ("c", "a", EdgeKind::Calls)],
    );

    let reached = graph.expand_with(&id("a"), 2, TraversalDirection::Outgoing, &[]);
    assert_eq!(ids(&reached), vec![("b", 1)]);
}

#[test]
fn test_edges_of_lists_both_directions() {
    let graph = make_graph(
        &["a", "b", "c"],
        &[("a", "b", EdgeKind::Calls), ("c", "a", EdgeKind::Inherits)],
    );

    let edges = graph.edges_of(&id("a"));
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].source, id("a"));
    assert_eq!(edges[1].kind, EdgeKind::Inherits);
    assert_eq!(graph.stats().edges, 2);
}

#[test]
fn test_builder_drops_dangling_references() {
    let store = UnitStore::from_units([
        make_unit("shop/cart.py", "Cart.total"),
        make_unit("shop/cart.py", "apply_discount"),
        make_unit("shop/views.py", "checkout"),
    ]);
    let references = vec![
        RawReference::new(id("shop/views.py::checkout"), "Cart.total", EdgeKind::Calls),
        RawReference::new(id("shop/cart.py::Cart.total"), "apply_discount", EdgeKind::Calls),
        RawReference::new(id("shop/views.py::checkout"), "json.dumps", EdgeKind::Calls),
    ];

    let (graph, report) = GraphBuilder::new(&store).build(references);

    assert_eq!(report.nodes, 3);
    assert_eq!(report.edges, 2);
    assert_eq!(report.dangling, 1);
    assert_eq!(
        ids(&graph.expand(&id("shop/views.py::checkout"), 2)),
        vec![
            ("shop/cart.py::Cart.total", 1),
            ("shop/cart.py::apply_discount", 2),
        ]
    );
}

#[test]
fn test_builder_registers_isolated_units() {
    let store = UnitStore::from_units([make_unit("a.py", "lonely")]);
    let (graph, report) = GraphBuilder::new(&store).build(Vec::new());

    assert!(graph.contains(&id("a.py::lonely")));
    assert_eq!(report.edges, 0);
    assert!(graph.expand(&id("a.py::lonely"), 2).is_empty());
}
