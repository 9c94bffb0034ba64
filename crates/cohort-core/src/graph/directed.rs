//! Caller-oriented directed view of a relation graph.
//!
//! Co-authorship carries no direction, so a direction has to be imposed
//! explicitly before strongly-connected clustering makes sense. Node indices
//! are shared with the source [`RelationGraph`].

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::BTreeSet;

use crate::config::{Component, ComponentKey};
use crate::error::AnalysisError;
use crate::graph::relation_graph::{CoauthorEdge, RelationGraph, UserNode};

/// Direction chosen for one undirected co-authorship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// First endpoint points to the second.
    Forward,
    /// Second endpoint points to the first.
    Backward,
    Both,
    Neither,
}

#[derive(Debug, Clone)]
pub struct DirectedRelationGraph {
    graph: DiGraph<String, BTreeSet<ComponentKey>>,
}

impl DirectedRelationGraph {
    /// Copy the node set of `source` with no edges.
    fn nodes_of(source: &RelationGraph) -> Self {
        let inner = source.inner();
        let mut graph = DiGraph::with_capacity(inner.node_count(), inner.edge_count());
        for idx in inner.node_indices() {
            let added = graph.add_node(inner[idx].name.clone());
            debug_assert_eq!(added, idx);
        }
        Self { graph }
    }

    fn add_arc(&mut self, from: NodeIndex, to: NodeIndex, components: &BTreeSet<ComponentKey>) {
        match self.graph.find_edge(from, to) {
            Some(edge) => self.graph[edge].extend(components.iter().cloned()),
            None => {
                self.graph.add_edge(from, to, components.clone());
            }
        }
    }

    /// Orient every edge of `source` with a caller rule.
    ///
    /// The rule sees the endpoints in petgraph storage order.
    pub fn orient<F>(source: &RelationGraph, mut rule: F) -> Self
    where
        F: FnMut(&UserNode, &UserNode, &CoauthorEdge) -> EdgeDirection,
    {
        let inner = source.inner();
        let mut directed = Self::nodes_of(source);
        for edge in inner.edge_references() {
            let (a, b) = (edge.source(), edge.target());
            match rule(&inner[a], &inner[b], edge.weight()) {
                EdgeDirection::Forward => directed.add_arc(a, b, &edge.weight().components),
                EdgeDirection::Backward => directed.add_arc(b, a, &edge.weight().components),
                EdgeDirection::Both => {
                    directed.add_arc(a, b, &edge.weight().components);
                    directed.add_arc(b, a, &edge.weight().components);
                }
                EdgeDirection::Neither => {}
            }
        }
        directed
    }

    /// Orient each co-authorship from the earlier-listed author to the later.
    ///
    /// Two users end up mutually reachable only when some component lists
    /// them in the opposite order from another, or through a longer cycle.
    pub fn by_author_order(
        source: &RelationGraph,
        components: &[Component],
    ) -> Result<Self, AnalysisError> {
        let mut directed = Self::nodes_of(source);
        for comp in components {
            let indices = comp
                .authors
                .iter()
                .map(|name| {
                    source
                        .node_index(name)
                        .ok_or_else(|| AnalysisError::lookup("user", name.clone()))
                })
                .collect::<Result<Vec<_>, AnalysisError>>()?;
            let key: BTreeSet<ComponentKey> = std::iter::once(comp.key()).collect();
            for (i, &from) in indices.iter().enumerate() {
                for &to in &indices[i + 1..] {
                    directed.add_arc(from, to, &key);
                }
            }
        }
        Ok(directed)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_arc(&self, from: &str, to: &str) -> bool {
        let find = |name: &str| self.graph.node_indices().find(|&i| self.graph[i] == name);
        match (find(from), find(to)) {
            (Some(a), Some(b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// True when node indices and names match `source` one-for-one.
    pub fn is_aligned_with(&self, source: &RelationGraph) -> bool {
        let inner = source.inner();
        self.graph.node_count() == inner.node_count()
            && inner
                .node_indices()
                .all(|idx| self.graph[idx] == inner[idx].name)
    }

    pub(crate) fn inner(&self) -> &DiGraph<String, BTreeSet<ComponentKey>> {
        &self.graph
    }
}
