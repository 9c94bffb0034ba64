//! Phase 4: attribute each component to the teams of its authors.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{Component, ComponentKey, OwnershipCategory, TeamId};
use crate::error::AnalysisError;
use crate::phases::teams::TeamPartition;

/// Teams behind one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentOwnership {
    pub key: ComponentKey,
    pub category: OwnershipCategory,
    pub teams: BTreeSet<TeamId>,
}

/// Ownership of a component collection with per-category counts.
#[derive(Debug, Clone, Default)]
pub struct OwnershipReport {
    pub unowned: usize,
    pub single_team: usize,
    pub multi_team: usize,
    pub components: BTreeMap<ComponentKey, ComponentOwnership>,
}

impl OwnershipReport {
    pub fn total(&self) -> usize {
        self.unowned + self.single_team + self.multi_team
    }

    pub fn get(&self, key: &ComponentKey) -> Option<&ComponentOwnership> {
        self.components.get(key)
    }

    /// Components in `category`, in key order.
    pub fn in_category(&self, category: OwnershipCategory) -> Vec<&ComponentKey> {
        self.components
            .values()
            .filter(|o| o.category == category)
            .map(|o| &o.key)
            .collect()
    }
}

/// Resolve the distinct teams of a component's authors.
///
/// Authors excluded from the partition as isolated users are skipped. An
/// author the partition has never seen is a lookup miss.
pub fn attribute_component(
    partition: &TeamPartition,
    component: &Component,
) -> Result<ComponentOwnership, AnalysisError> {
    let key = component.key();
    if component.authors.is_empty() {
        return Err(AnalysisError::DataIntegrity(format!(
            "component '{key}' has no authors"
        )));
    }

    let mut teams = BTreeSet::new();
    for author in &component.authors {
        match partition.team_of(author) {
            Some(id) => {
                teams.insert(id);
            }
            None if partition.is_excluded(author) => {}
            None => return Err(AnalysisError::lookup("user", author.clone())),
        }
    }

    Ok(ComponentOwnership {
        key,
        category: OwnershipCategory::from_team_count(teams.len()),
        teams,
    })
}

/// Attribute every component in `components`.
pub fn attribute_all(
    partition: &TeamPartition,
    components: &[Component],
) -> Result<OwnershipReport, AnalysisError> {
    let mut report = OwnershipReport::default();
    for comp in components {
        let ownership = attribute_component(partition, comp)?;
        match ownership.category {
            OwnershipCategory::Unowned => {
                log::debug!("Unowned component: {}", ownership.key);
                report.unowned += 1;
            }
            OwnershipCategory::SingleTeam => report.single_team += 1,
            OwnershipCategory::MultiTeam => {
                log::debug!("Multi-team component: {}", ownership.key);
                report.multi_team += 1;
            }
        }
        report.components.insert(ownership.key.clone(), ownership);
    }

    log::info!(
        "Ownership: {} unowned, {} single-team, {} multi-team",
        report.unowned,
        report.single_team,
        report.multi_team
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IsolatedPolicy, User};
    use crate::graph::relation_graph::RelationGraph;
    use crate::phases::teams::{cluster_teams, ClusterOptions};
    use crate::records::{RecordAccessor, Snapshot, TopLevelMatcher};

    fn comp(name: &str, authors: &[&str]) -> Component {
        Component::with_authors(name, 1, authors)
    }

    fn partition(comps: Vec<Component>, isolated: IsolatedPolicy) -> (Snapshot, TeamPartition) {
        let mut names: Vec<String> = comps.iter().flat_map(|c| c.authors.clone()).collect();
        names.sort();
        names.dedup();
        let users = names
            .into_iter()
            .map(|name| User {
                name,
                reputation: 0.5,
                reputation_history: Vec::new(),
            })
            .collect();
        let snap = Snapshot::new(users, comps, TopLevelMatcher::default()).unwrap();
        let g = RelationGraph::build(&snap, snap.list_components(), false).unwrap();
        let opts = ClusterOptions {
            isolated,
            ..Default::default()
        };
        let p = cluster_teams(&g, None, &opts).unwrap();
        (snap, p)
    }

    #[test]
    fn authors_in_one_team_are_single_team() {
        let (snap, p) = partition(
            vec![comp("x", &["a", "b"]), comp("y", &["b", "c"])],
            IsolatedPolicy::Singleton,
        );
        let report = attribute_all(&p, snap.list_components()).unwrap();
        assert_eq!(report.single_team, 2);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn excluded_sole_author_leaves_component_unowned() {
        let (snap, p) = partition(
            vec![comp("x", &["a", "b"]), comp("z", &["d"])],
            IsolatedPolicy::Exclude,
        );
        let report = attribute_all(&p, snap.list_components()).unwrap();
        let z = report.get(&ComponentKey::new("z", 1)).unwrap();
        assert_eq!(z.category, OwnershipCategory::Unowned);
        assert!(z.teams.is_empty());
        assert_eq!(report.unowned, 1);
    }

    #[test]
    fn authors_from_separate_teams_are_multi_team() {
        let (_, p) = partition(
            vec![comp("x", &["h", "j"]), comp("y", &["i", "k"])],
            IsolatedPolicy::Singleton,
        );
        let bridge = comp("bridge", &["h", "i"]);
        let o = attribute_component(&p, &bridge).unwrap();
        assert_eq!(o.category, OwnershipCategory::MultiTeam);
        assert_eq!(o.teams, BTreeSet::from([TeamId(0), TeamId(1)]));
    }

    #[test]
    fn unknown_author_is_lookup_miss() {
        let (_, p) = partition(vec![comp("x", &["a", "b"])], IsolatedPolicy::Singleton);
        let err = attribute_component(&p, &comp("q", &["a", "stranger"])).unwrap_err();
        assert!(matches!(err, AnalysisError::LookupMiss { .. }));
    }

    #[test]
    fn authorless_component_is_integrity_error() {
        let (_, p) = partition(vec![comp("x", &["a", "b"])], IsolatedPolicy::Singleton);
        let err = attribute_component(&p, &comp("q", &[])).unwrap_err();
        assert!(matches!(err, AnalysisError::DataIntegrity(_)));
    }
}
