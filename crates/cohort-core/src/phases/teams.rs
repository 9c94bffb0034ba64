//! Phase 2: partition the relation graph into teams.
//!
//! Two modes are offered:
//!
//! - `undirected`: connected components of the co-authorship graph. Two users
//!   share a team when a chain of shared components links them. This is the
//!   mode that matches symmetric co-authorship.
//! - `directed`: strongly connected components of a [`DirectedRelationGraph`]
//!   supplied by the caller. A graph oriented from co-authorship alone rarely
//!   contains mutual arcs, so this mode tends to produce singleton teams
//!   unless the orientation creates cycles.
//!
//! Team ids are assigned by ascending smallest member name, so a fixed graph
//! and mode always yield the same ids.

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::{AnalysisConfig, ClusterMode, IsolatedPolicy, Team, TeamId};
use crate::error::AnalysisError;
use crate::graph::directed::DirectedRelationGraph;
use crate::graph::relation_graph::RelationGraph;

/// Clustering settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterOptions {
    pub mode: ClusterMode,
    pub isolated: IsolatedPolicy,
}

impl From<&AnalysisConfig> for ClusterOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            mode: config.cluster_mode,
            isolated: config.isolated_users,
        }
    }
}

/// Disjoint teams covering the relation graph (minus excluded isolated users).
#[derive(Debug, Clone)]
pub struct TeamPartition {
    teams: Vec<Team>,
    assignment: HashMap<String, TeamId>,
    excluded: BTreeSet<String>,
    options: ClusterOptions,
}

impl TeamPartition {
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn team(&self, id: TeamId) -> Result<&Team, AnalysisError> {
        self.teams
            .get(id.0)
            .filter(|t| t.id == id)
            .ok_or_else(|| AnalysisError::lookup("team", id.to_string()))
    }

    pub fn team_of(&self, user: &str) -> Option<TeamId> {
        self.assignment.get(user).copied()
    }

    /// Isolated users left out under [`IsolatedPolicy::Exclude`].
    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    pub fn is_excluded(&self, user: &str) -> bool {
        self.excluded.contains(user)
    }

    pub fn assignment(&self) -> &HashMap<String, TeamId> {
        &self.assignment
    }

    pub fn options(&self) -> ClusterOptions {
        self.options
    }
}

/// Partition `graph` into teams.
///
/// `directed` must be supplied exactly when `options.mode` is
/// [`ClusterMode::Directed`], and must have been derived from `graph`.
pub fn cluster_teams(
    graph: &RelationGraph,
    directed: Option<&DirectedRelationGraph>,
    options: &ClusterOptions,
) -> Result<TeamPartition, AnalysisError> {
    let clusters = match (options.mode, directed) {
        (ClusterMode::Undirected, None) => connected_clusters(graph),
        (ClusterMode::Undirected, Some(_)) => {
            return Err(AnalysisError::Configuration(
                "a directed graph was supplied for undirected clustering".into(),
            ))
        }
        (ClusterMode::Directed, None) => {
            return Err(AnalysisError::Configuration(
                "directed clustering requires a directed relation graph".into(),
            ))
        }
        (ClusterMode::Directed, Some(d)) => {
            if !d.is_aligned_with(graph) {
                return Err(AnalysisError::Configuration(
                    "directed graph was not derived from this relation graph".into(),
                ));
            }
            tarjan_scc(d.inner())
        }
    };

    let inner = graph.inner();
    let mut excluded = BTreeSet::new();
    let mut named: Vec<Vec<String>> = Vec::with_capacity(clusters.len());

    for cluster in clusters {
        if cluster.is_empty() {
            return Err(AnalysisError::DataIntegrity(
                "clustering produced an empty team".into(),
            ));
        }
        if options.isolated == IsolatedPolicy::Exclude
            && cluster.len() == 1
            && graph.is_isolated(cluster[0])
        {
            excluded.insert(inner[cluster[0]].name.clone());
            continue;
        }
        let mut members: Vec<String> = cluster
            .into_iter()
            .map(|idx| inner[idx].name.clone())
            .collect();
        members.sort();
        named.push(members);
    }

    named.sort_by(|a, b| a[0].cmp(&b[0]));

    let mut teams = Vec::with_capacity(named.len());
    let mut assignment = HashMap::with_capacity(graph.node_count());
    for (i, members) in named.into_iter().enumerate() {
        let id = TeamId(i);
        for member in &members {
            if assignment.insert(member.clone(), id).is_some() {
                return Err(AnalysisError::DataIntegrity(format!(
                    "user '{member}' was assigned to more than one team"
                )));
            }
        }
        teams.push(Team { id, members });
    }

    log::debug!(
        "{} clustering: {} teams, {} isolated users excluded",
        options.mode,
        teams.len(),
        excluded.len()
    );

    Ok(TeamPartition {
        teams,
        assignment,
        excluded,
        options: *options,
    })
}

/// Connected components via union-find over the undirected edges.
fn connected_clusters(graph: &RelationGraph) -> Vec<Vec<NodeIndex>> {
    let inner = graph.inner();
    let mut sets = UnionFind::<usize>::new(inner.node_count());
    for edge in inner.edge_references() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let mut groups: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
    for idx in inner.node_indices() {
        groups.entry(sets.find(idx.index())).or_default().push(idx);
    }
    groups.into_values().collect()
}

/// Internal co-authorship edges over possible member pairs.
pub fn compute_cohesion(team: &Team, graph: &RelationGraph) -> f64 {
    let n = team.members.len();
    if n < 2 {
        return 0.0;
    }

    let mut internal_edges = 0usize;
    for (i, a) in team.members.iter().enumerate() {
        for b in &team.members[i + 1..] {
            if graph.has_edge(a, b) {
                internal_edges += 1;
            }
        }
    }

    let max_possible = n * (n - 1) / 2;
    internal_edges as f64 / max_possible as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Component, User};
    use crate::records::{RecordAccessor, Snapshot, TopLevelMatcher};

    fn build(comps: &[(&str, &[&str])]) -> (Snapshot, RelationGraph) {
        let mut names: Vec<&str> = comps.iter().flat_map(|(_, a)| a.iter().copied()).collect();
        names.sort_unstable();
        names.dedup();
        let users = names
            .into_iter()
            .map(|n| User {
                name: n.to_string(),
                reputation: 0.5,
                reputation_history: Vec::new(),
            })
            .collect();
        let comps = comps
            .iter()
            .map(|&(name, authors)| Component::with_authors(name, 1, authors))
            .collect();
        let snap = Snapshot::new(users, comps, TopLevelMatcher::default()).unwrap();
        let graph = RelationGraph::build(&snap, snap.list_components(), false).unwrap();
        (snap, graph)
    }

    fn members(p: &TeamPartition) -> Vec<Vec<&str>> {
        p.teams()
            .iter()
            .map(|t| t.members.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn chain_of_coauthors_forms_one_team() {
        let (_, g) = build(&[("x", &["a", "b"]), ("y", &["b", "c"]), ("z", &["d"])]);
        let p = cluster_teams(&g, None, &ClusterOptions::default()).unwrap();
        assert_eq!(members(&p), vec![vec!["a", "b", "c"], vec!["d"]]);
        assert_eq!(p.team_of("a"), Some(TeamId(0)));
        assert_eq!(p.team_of("d"), Some(TeamId(1)));
    }

    #[test]
    fn exclude_policy_drops_isolated_users() {
        let (_, g) = build(&[("x", &["a", "b"]), ("z", &["d"])]);
        let opts = ClusterOptions {
            isolated: IsolatedPolicy::Exclude,
            ..Default::default()
        };
        let p = cluster_teams(&g, None, &opts).unwrap();
        assert_eq!(p.len(), 1);
        assert!(p.is_excluded("d"));
        assert_eq!(p.team_of("d"), None);
    }

    #[test]
    fn ids_follow_smallest_member_name() {
        let (_, g) = build(&[("x", &["zed", "yan"]), ("y", &["bob", "amy"]), ("w", &["max"])]);
        let p = cluster_teams(&g, None, &ClusterOptions::default()).unwrap();
        assert_eq!(
            members(&p),
            vec![vec!["amy", "bob"], vec!["max"], vec!["yan", "zed"]]
        );
    }

    #[test]
    fn directed_mode_requires_directed_graph() {
        let (_, g) = build(&[("x", &["a", "b"])]);
        let opts = ClusterOptions {
            mode: ClusterMode::Directed,
            ..Default::default()
        };
        let err = cluster_teams(&g, None, &opts).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn undirected_mode_rejects_directed_graph() {
        let (snap, g) = build(&[("x", &["a", "b"])]);
        let d = DirectedRelationGraph::by_author_order(&g, snap.list_components()).unwrap();
        let err = cluster_teams(&g, Some(&d), &ClusterOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn directed_mode_without_cycles_degenerates_to_singletons() {
        let (snap, g) = build(&[("x", &["a", "b"]), ("y", &["b", "c"])]);
        let d = DirectedRelationGraph::by_author_order(&g, snap.list_components()).unwrap();
        let opts = ClusterOptions {
            mode: ClusterMode::Directed,
            ..Default::default()
        };
        let p = cluster_teams(&g, Some(&d), &opts).unwrap();
        assert_eq!(members(&p), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn directed_mode_groups_mutual_reachability() {
        let (snap, g) = build(&[("x", &["a", "b"]), ("y", &["b", "c"]), ("w", &["c", "a"])]);
        let d = DirectedRelationGraph::by_author_order(&g, snap.list_components()).unwrap();
        let opts = ClusterOptions {
            mode: ClusterMode::Directed,
            ..Default::default()
        };
        let p = cluster_teams(&g, Some(&d), &opts).unwrap();
        assert_eq!(members(&p), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn unknown_team_id_is_lookup_miss() {
        let (_, g) = build(&[("x", &["a", "b"])]);
        let p = cluster_teams(&g, None, &ClusterOptions::default()).unwrap();
        assert!(p.team(TeamId(0)).is_ok());
        assert!(matches!(
            p.team(TeamId(7)),
            Err(AnalysisError::LookupMiss { kind: "team", .. })
        ));
    }

    #[test]
    fn cohesion_of_path_and_clique() {
        let (_, g) = build(&[("x", &["a", "b"]), ("y", &["b", "c"])]);
        let p = cluster_teams(&g, None, &ClusterOptions::default()).unwrap();
        let cohesion = compute_cohesion(&p.teams()[0], &g);
        assert!((cohesion - 2.0 / 3.0).abs() < 1e-9);

        let (_, g) = build(&[("x", &["a", "b", "c"])]);
        let p = cluster_teams(&g, None, &ClusterOptions::default()).unwrap();
        assert!((compute_cohesion(&p.teams()[0], &g) - 1.0).abs() < 1e-9);
    }
}
