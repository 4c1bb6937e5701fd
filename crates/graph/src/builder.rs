use crate::graph::DependencyGraph;
use crate::types::{EdgeKind, ReferenceEdge};
use docctx_units::{StructuralUnit, UnitId, UnitStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference as emitted by the parser: the target is either a unit id or a
/// symbol name that still has to be resolved against the unit store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReference {
    pub source: UnitId,
    pub target: String,
    pub kind: EdgeKind,
}

impl RawReference {
    pub fn new(source: UnitId, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source,
            target: target.into(),
            kind,
        }
    }
}

impl From<ReferenceEdge> for RawReference {
    fn from(edge: ReferenceEdge) -> Self {
        Self {
            source: edge.source,
            target: edge.target.to_string(),
            kind: edge.kind,
        }
    }
}

/// Diagnostic tally of one graph build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphBuildReport {
    pub nodes: usize,
    pub edges: usize,
    /// References whose source or target did not resolve to a known unit
    pub dangling: usize,
    /// Identical references seen more than once
    pub duplicates: usize,
}

/// Builds a [`DependencyGraph`] from the unit store and parser references
pub struct GraphBuilder<'a> {
    units: &'a UnitStore,
    by_qualified: HashMap<&'a str, Vec<&'a StructuralUnit>>,
    by_name: HashMap<&'a str, Vec<&'a StructuralUnit>>,
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub fn new(units: &'a UnitStore) -> Self {
        let mut by_qualified: HashMap<&str, Vec<&StructuralUnit>> = HashMap::new();
        let mut by_name: HashMap<&str, Vec<&StructuralUnit>> = HashMap::new();
        for unit in units.iter() {
            by_qualified
                .entry(unit.qualified_name.as_str())
                .or_default()
                .push(unit);
            by_name.entry(unit.name()).or_default().push(unit);
        }
        for candidates in by_qualified.values_mut().chain(by_name.values_mut()) {
            candidates.sort_by(|a, b| a.id.cmp(&b.id));
        }

        Self {
            units,
            by_qualified,
            by_name,
        }
    }

    /// Register every unit, then add every reference that resolves.
    ///
    /// Dangling references (external library symbols, deleted units) are
    /// dropped and counted rather than stored as partial edges.
    pub fn build<I>(&self, references: I) -> (DependencyGraph, GraphBuildReport)
    where
        I: IntoIterator<Item = RawReference>,
    {
        let mut graph = DependencyGraph::new();
        for id in self.units.ids() {
            graph.add_unit(id);
        }

        let mut report = GraphBuildReport::default();
        for reference in references {
            let Some(target) = self.resolve(&reference.source, &reference.target) else {
                log::debug!(
                    "Dropping dangling {} reference {} -> {}",
                    reference.kind,
                    reference.source,
                    reference.target
                );
                report.dangling += 1;
                continue;
            };

            match graph.add_edge(&reference.source, &target, reference.kind) {
                Ok(true) => {}
                Ok(false) => report.duplicates += 1,
                Err(err) => {
                    log::debug!("Dropping reference: {err}");
                    report.dangling += 1;
                }
            }
        }

        report.nodes = graph.node_count();
        report.edges = graph.edge_count();
        if report.dangling > 0 {
            log::info!(
                "Built dependency graph: {} nodes, {} edges ({} dangling references dropped)",
                report.nodes,
                report.edges,
                report.dangling
            );
        } else {
            log::info!(
                "Built dependency graph: {} nodes, {} edges",
                report.nodes,
                report.edges
            );
        }

        (graph, report)
    }

    /// Resolve a reference target: exact id, then qualified name, then short
    /// name. Among several candidates, one in the source's own file wins;
    /// otherwise the name must be unambiguous.
    #[must_use]
    pub fn resolve(&self, source: &UnitId, target: &str) -> Option<UnitId> {
        let exact = UnitId::from(target);
        if self.units.contains(&exact) {
            return Some(exact);
        }

        let source_file = self.units.get(source).ok().map(|u| u.file_path.as_str());
        for table in [&self.by_qualified, &self.by_name] {
            let Some(candidates) = table.get(target) else {
                continue;
            };
            let local = source_file.and_then(|file| {
                candidates
                    .iter()
                    .find(|u| u.file_path == file && &u.id != source)
            });
            if let Some(unit) = local {
                return Some(unit.id.clone());
            }
            let others: Vec<&&StructuralUnit> =
                candidates.iter().filter(|u| &u.id != source).collect();
            if others.len() == 1 {
                return Some(others[0].id.clone());
            }
            if others.len() > 1 {
                log::debug!(
                    "Ambiguous reference {source} -> {target} ({} candidates)",
                    others.len()
                );
                return None;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docctx_units::{SourceSpan, UnitKind};
    use pretty_assertions::assert_eq;

    fn unit(file: &str, name: &str) -> StructuralUnit {
        StructuralUnit::new(file, name, UnitKind::Function, SourceSpan::new(1, 2, "..."))
    }

    #[test]
    fn test_resolves_ids_qualified_and_short_names() {
        let store = UnitStore::from_units([
            unit("a.py", "Cart.total"),
            unit("a.py", "checkout"),
            unit("b.py", "checkout"),
            unit("b.py", "render"),
        ]);
        let builder = GraphBuilder::new(&store);
        let src = UnitId::from("a.py::Cart.total");

        assert_eq!(
            builder.resolve(&src, "b.py::render"),
            Some(UnitId::from("b.py::render"))
        );
        assert_eq!(
            builder.resolve(&src, "render"),
            Some(UnitId::from("b.py::render"))
        );
        // same-file candidate wins over the other file's `checkout`
        assert_eq!(
            builder.resolve(&src, "checkout"),
            Some(UnitId::from("a.py::checkout"))
        );
        assert_eq!(
            builder.resolve(&UnitId::from("a.py::checkout"), "total"),
            Some(UnitId::from("a.py::Cart.total"))
        );
        assert_eq!(builder.resolve(&src, "os.path.join"), None);
    }

    #[test]
    fn test_ambiguous_names_outside_the_file_stay_unresolved() {
        let store = UnitStore::from_units([
            unit("a.py", "main"),
            unit("b.py", "helper"),
            unit("c.py", "helper"),
        ]);
        let builder = GraphBuilder::new(&store);
        assert_eq!(builder.resolve(&UnitId::from("a.py::main"), "helper"), None);
    }

    #[test]
    fn test_dangling_and_duplicate_references_are_counted() {
        let store = UnitStore::from_units([unit("a.py", "f"), unit("a.py", "g")]);
        let f = UnitId::from("a.py::f");
        let (graph, report) = GraphBuilder::new(&store).build([
            RawReference::new(f.clone(), "g", EdgeKind::Calls),
            RawReference::new(f.clone(), "g", EdgeKind::Calls),
            RawReference::new(f.clone(), "requests.get", EdgeKind::Calls),
            RawReference::new(UnitId::from("gone.py::x"), "g", EdgeKind::Imports),
        ]);

        assert_eq!(
            report,
            GraphBuildReport {
                nodes: 2,
                edges: 1,
                dangling: 2,
                duplicates: 1,
            }
        );
        assert_eq!(graph.edge_count(), 1);
    }
}
