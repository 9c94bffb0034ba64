//! Co-authorship relation graph backed by petgraph::UnGraph.
//!
//! Nodes are users, edges join two users who authored at least one component
//! together. Each edge keeps the set of components that induced it.

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::{Component, ComponentKey, User};
use crate::error::AnalysisError;
use crate::records::RecordAccessor;

/// Node data: a user plus presentation metadata.
#[derive(Debug, Clone)]
pub struct UserNode {
    pub name: String,
    pub reputation: f64,
    authored: usize,
    first_component: Option<(ComponentKey, f64)>,
}

impl UserNode {
    fn new(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            reputation: user.reputation,
            authored: 0,
            first_component: None,
        }
    }

    /// Number of analysed components this user authored.
    pub fn authored_count(&self) -> usize {
        self.authored
    }

    /// The user's only component, when they authored exactly one.
    pub fn sole_component(&self) -> Option<(&ComponentKey, f64)> {
        match (&self.first_component, self.authored) {
            (Some((key, rep)), 1) => Some((key, *rep)),
            _ => None,
        }
    }

    /// Renderer label, e.g. `(alice, rep: 0.5), (comp: gear_1, rep: 0.2)`.
    pub fn label(&self) -> String {
        let mut label = format!("({}, rep: {})", self.name, self.reputation);
        if let Some((key, rep)) = self.sole_component() {
            label.push_str(&format!(", (comp: {key}, rep: {rep})"));
        }
        label
    }
}

/// Edge data: the components that made two users co-authors.
#[derive(Debug, Clone, Default)]
pub struct CoauthorEdge {
    pub components: BTreeSet<ComponentKey>,
}

/// Per-component partial build, computed independently of the graph.
struct Contribution<'a> {
    key: ComponentKey,
    reputation: f64,
    authors: Vec<&'a User>,
}

impl<'a> Contribution<'a> {
    fn resolve<R: RecordAccessor + ?Sized>(
        records: &'a R,
        component: &Component,
    ) -> Result<Self, AnalysisError> {
        let key = component.key();
        if component.authors.is_empty() {
            return Err(AnalysisError::DataIntegrity(format!(
                "component '{key}' has no authors"
            )));
        }

        let mut seen = HashSet::with_capacity(component.authors.len());
        let mut authors = Vec::with_capacity(component.authors.len());
        for name in &component.authors {
            if !seen.insert(name.as_str()) {
                return Err(AnalysisError::DataIntegrity(format!(
                    "component '{key}' lists author '{name}' more than once"
                )));
            }
            let user = records
                .user(name)
                .ok_or_else(|| AnalysisError::lookup("user", name.clone()))?;
            authors.push(user);
        }

        Ok(Self {
            key,
            reputation: component.reputation,
            authors,
        })
    }
}

/// Undirected co-authorship graph with O(1) name lookup.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    graph: UnGraph<UserNode, CoauthorEdge>,
    id_index: HashMap<String, NodeIndex>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for `components`, resolving authors through `records`.
    ///
    /// With `parallel`, author resolution runs on the rayon pool; the graph
    /// itself is only written by the sequential merge that follows, in input
    /// order, so both paths produce the same graph.
    pub fn build<R: RecordAccessor + ?Sized>(
        records: &R,
        components: &[Component],
        parallel: bool,
    ) -> Result<Self, AnalysisError> {
        let contributions: Vec<Contribution<'_>> = if parallel {
            components
                .par_iter()
                .map(|c| Contribution::resolve(records, c))
                .collect::<Result<_, AnalysisError>>()?
        } else {
            components
                .iter()
                .map(|c| Contribution::resolve(records, c))
                .collect::<Result<_, AnalysisError>>()?
        };

        let mut graph = Self::new();
        for contribution in contributions {
            graph.merge(contribution);
        }

        log::debug!(
            "Relation graph: {} users, {} co-authorship edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    fn ensure_node(&mut self, user: &User) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&user.name) {
            idx
        } else {
            let idx = self.graph.add_node(UserNode::new(user));
            self.id_index.insert(user.name.clone(), idx);
            idx
        }
    }

    fn merge(&mut self, contribution: Contribution<'_>) {
        let indices: Vec<NodeIndex> = contribution
            .authors
            .iter()
            .map(|user| self.ensure_node(user))
            .collect();

        for &idx in &indices {
            let node = &mut self.graph[idx];
            node.authored += 1;
            if node.first_component.is_none() {
                node.first_component = Some((contribution.key.clone(), contribution.reputation));
            }
        }

        for (i, &a) in indices.iter().enumerate() {
            for &b in &indices[i + 1..] {
                match self.graph.find_edge(a, b) {
                    Some(edge) => {
                        self.graph[edge]
                            .components
                            .insert(contribution.key.clone());
                    }
                    None => {
                        let mut edge = CoauthorEdge::default();
                        edge.components.insert(contribution.key.clone());
                        self.graph.add_edge(a, b, edge);
                    }
                }
            }
        }
    }

    // --- Queries ---

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.id_index.contains_key(name)
    }

    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.id_index.get(name).copied()
    }

    pub fn node(&self, name: &str) -> Option<&UserNode> {
        self.id_index
            .get(name)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &UserNode> {
        self.graph.node_weights()
    }

    /// Edge between two users, regardless of argument order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&CoauthorEdge> {
        let (ai, bi) = (self.node_index(a)?, self.node_index(b)?);
        self.graph
            .find_edge(ai, bi)
            .and_then(|e: EdgeIndex| self.graph.edge_weight(e))
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edge(a, b).is_some()
    }

    /// Co-authors of `name`, sorted.
    pub fn neighbours(&self, name: &str) -> Vec<&str> {
        let Some(idx) = self.node_index(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn degree(&self, name: &str) -> usize {
        self.node_index(name)
            .map(|idx| self.graph.edges(idx).count())
            .unwrap_or(0)
    }

    /// True when the node has no co-authorship edge.
    pub fn is_isolated(&self, idx: NodeIndex) -> bool {
        self.graph.edges(idx).next().is_none()
    }

    /// All edges as `(user, user, edge)` triples.
    pub fn edges(&self) -> Vec<(&str, &str, &CoauthorEdge)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].name.as_str(),
                    self.graph[e.target()].name.as_str(),
                    e.weight(),
                )
            })
            .collect()
    }

    pub(crate) fn inner(&self) -> &UnGraph<UserNode, CoauthorEdge> {
        &self.graph
    }
}
