//! Team reputation statistics tests.

mod common;

use common::*;
use pretty_assertions::assert_eq;

use cohort_core::config::{ClusterMode, IsolatedPolicy, TeamId};
use cohort_core::phases::statistics::{summarize, team_statistics};
use cohort_core::phases::teams::{cluster_teams, ClusterOptions};

#[test]
fn fixture_team_summaries() {
    let snap = load_fixture("small_corpus.json");
    let graph = build_graph(&snap);
    let p = cluster_teams(&graph, None, &ClusterOptions::default()).unwrap();
    let stats = team_statistics(&p, &snap).unwrap();

    assert_eq!(stats.len(), 3);

    let first = &stats[&TeamId(0)];
    assert_eq!(first.count, 3);
    assert_eq!(first.min, 0.2);
    assert_eq!(first.max, 0.8);
    assert!((first.mean - 0.5).abs() < 1e-12);
    assert_eq!(first.median, 0.5);

    let single = &stats[&TeamId(1)];
    assert_eq!(single.count, 1);
    assert_eq!(single.median, 0.7);
    assert_eq!(single.variance, 0.0);
}

#[test]
fn excluded_users_have_no_summary() {
    let snap = load_fixture("small_corpus.json");
    let graph = build_graph(&snap);
    let opts = ClusterOptions {
        mode: ClusterMode::Undirected,
        isolated: IsolatedPolicy::Exclude,
    };
    let p = cluster_teams(&graph, None, &opts).unwrap();
    let stats = team_statistics(&p, &snap).unwrap();

    assert_eq!(stats.len(), 2);
    assert!(stats.values().all(|s| s.count == 3));
}

#[test]
fn summary_matches_hand_computation() {
    let s = summarize(&[0.4, 0.6, 0.3]).unwrap();
    assert_eq!((s.min, s.max, s.median), (0.3, 0.6, 0.4));
    let mean = (0.4 + 0.6 + 0.3) / 3.0;
    let variance = [0.4f64, 0.6, 0.3]
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / 3.0;
    assert!((s.mean - mean).abs() < 1e-12);
    assert!((s.variance - variance).abs() < 1e-12);
}
