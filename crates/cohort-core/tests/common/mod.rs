//! Shared test helpers for integration tests.

use std::path::{Path, PathBuf};

use cohort_core::config::{AnalysisConfig, Component, ComponentKey, User};
use cohort_core::graph::relation_graph::RelationGraph;
use cohort_core::phases::teams::TeamPartition;
use cohort_core::records::{RecordAccessor, Snapshot, TopLevelMatcher};

// ---------------------------------------------------------------------------
// Fixture path resolution
// ---------------------------------------------------------------------------

/// Resolve `tests/fixtures/{name}` relative to the workspace root.
pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .join("../../tests/fixtures")
        .join(name)
        .canonicalize()
        .unwrap_or_else(|_| {
            Path::new(manifest_dir)
                .join("../../tests/fixtures")
                .join(name)
        })
}

/// Load a fixture snapshot with the default top-level pattern.
pub fn load_fixture(name: &str) -> Snapshot {
    Snapshot::load(fixture_path(name), TopLevelMatcher::default())
        .expect("Failed to load fixture snapshot")
}

/// Default configuration pointing at a fixture snapshot.
pub fn fixture_config(name: &str) -> AnalysisConfig {
    AnalysisConfig {
        snapshot_path: fixture_path(name).to_string_lossy().to_string(),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Snapshot builders
// ---------------------------------------------------------------------------

pub fn user(name: &str, reputation: f64) -> User {
    User {
        name: name.to_string(),
        reputation,
        reputation_history: Vec::new(),
    }
}

pub fn component(name: &str, revision: u32, authors: &[&str]) -> Component {
    Component {
        name: name.to_string(),
        revision,
        reputation: 0.5,
        submit: false,
        authors: authors.iter().map(|a| a.to_string()).collect(),
        subcomponents: Vec::new(),
        in_degree: 0,
        out_degree: 0,
    }
}

/// A name matching the default top-level pattern.
pub fn top_level_name(n: u32) -> String {
    format!("{n:08}-0000-0000-0000-000000000000")
}

/// Snapshot whose users are exactly the authors of `components`, all at 0.5.
pub fn snapshot_of(components: Vec<Component>) -> Snapshot {
    let mut names: Vec<String> = components
        .iter()
        .flat_map(|c| c.authors.iter().cloned())
        .collect();
    names.sort();
    names.dedup();
    let users = names.iter().map(|n| user(n, 0.5)).collect();
    Snapshot::new(users, components, TopLevelMatcher::default())
        .expect("Failed to build snapshot")
}

pub fn snapshot_with(users: Vec<User>, components: Vec<Component>) -> Snapshot {
    Snapshot::new(users, components, TopLevelMatcher::default())
        .expect("Failed to build snapshot")
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Relation graph over every component of `snap`, built sequentially.
pub fn build_graph(snap: &Snapshot) -> RelationGraph {
    RelationGraph::build(snap, snap.list_components(), false).expect("Failed to build graph")
}

/// Team member lists in team-id order.
pub fn member_sets(partition: &TeamPartition) -> Vec<Vec<String>> {
    partition
        .teams()
        .iter()
        .map(|t| t.members.clone())
        .collect()
}

pub fn key(name: &str, revision: u32) -> ComponentKey {
    ComponentKey::new(name, revision)
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
