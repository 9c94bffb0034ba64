//! Phase 5: reputation statistics per team.

use std::collections::BTreeMap;

use crate::config::{ReputationSummary, Team, TeamId};
use crate::error::AnalysisError;
use crate::phases::teams::TeamPartition;
use crate::records::RecordAccessor;

/// Min, max, mean, median and population variance of `values`.
///
/// An empty input has no summary and is reported as an integrity error.
pub fn summarize(values: &[f64]) -> Result<ReputationSummary, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::DataIntegrity(
            "cannot summarise an empty set of reputations".into(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

    Ok(ReputationSummary {
        count: n,
        min: sorted[0],
        max: sorted[n - 1],
        mean,
        median,
        variance,
    })
}

/// Like [`summarize`], but an empty input yields `None`.
pub fn summarize_optional(values: &[f64]) -> Option<ReputationSummary> {
    summarize(values).ok()
}

/// Pearson correlation coefficient of two equal-length samples.
///
/// `None` for fewer than two pairs, mismatched lengths or a constant sample.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

/// Summarise the reputations of one team's members.
pub fn team_summary<R: RecordAccessor + ?Sized>(
    team: &Team,
    records: &R,
) -> Result<ReputationSummary, AnalysisError> {
    if team.members.is_empty() {
        return Err(AnalysisError::DataIntegrity(format!(
            "{} has no members",
            team.id
        )));
    }
    let reputations = team
        .members
        .iter()
        .map(|name| {
            records
                .user(name)
                .map(|u| u.reputation)
                .ok_or_else(|| AnalysisError::lookup("user", name.clone()))
        })
        .collect::<Result<Vec<f64>, AnalysisError>>()?;
    summarize(&reputations)
}

/// Summarise every team in the partition.
pub fn team_statistics<R: RecordAccessor + ?Sized>(
    partition: &TeamPartition,
    records: &R,
) -> Result<BTreeMap<TeamId, ReputationSummary>, AnalysisError> {
    let mut stats = BTreeMap::new();
    for team in partition.teams() {
        stats.insert(team.id, team_summary(team, records)?);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::User;
    use crate::records::{Snapshot, TopLevelMatcher};

    fn snapshot(users: &[(&str, f64)]) -> Snapshot {
        let users = users
            .iter()
            .map(|&(name, reputation)| User {
                name: name.to_string(),
                reputation,
                reputation_history: Vec::new(),
            })
            .collect();
        Snapshot::new(users, Vec::new(), TopLevelMatcher::default()).unwrap()
    }

    fn team(id: usize, members: &[&str]) -> Team {
        Team {
            id: TeamId(id),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn three_member_summary() {
        let s = summarize(&[0.8, 0.2, 0.5]).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 0.2);
        assert_eq!(s.max, 0.8);
        assert!((s.mean - 0.5).abs() < 1e-12);
        assert_eq!(s.median, 0.5);
        assert!((s.variance - 0.06).abs() < 1e-12);
    }

    #[test]
    fn singleton_variance_is_exactly_zero() {
        let s = summarize(&[0.7]).unwrap();
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.median, 0.7);
    }

    #[test]
    fn even_count_median_averages_middle_pair() {
        let s = summarize(&[1.0, 4.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.median, 2.5);
    }

    #[test]
    fn empty_input_is_integrity_error() {
        assert!(matches!(summarize(&[]), Err(AnalysisError::DataIntegrity(_))));
        assert!(summarize_optional(&[]).is_none());
    }

    #[test]
    fn pearson_detects_linear_relationships() {
        let up = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        let down = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((up - 1.0).abs() < 1e-12);
        assert!((down + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_undefined_for_constant_or_short_samples() {
        assert!(pearson(&[0.1, 0.5], &[2.0, 2.0]).is_none());
        assert!(pearson(&[0.1], &[1.0]).is_none());
        assert!(pearson(&[0.1, 0.2], &[1.0]).is_none());
    }

    #[test]
    fn team_summary_looks_up_member_reputation() {
        let snap = snapshot(&[("a", 0.2), ("b", 0.5), ("c", 0.8)]);
        let s = team_summary(&team(0, &["a", "b", "c"]), &snap).unwrap();
        assert_eq!(s.min, 0.2);
        assert_eq!(s.max, 0.8);
    }

    #[test]
    fn missing_member_is_lookup_miss() {
        let snap = snapshot(&[("a", 0.2)]);
        let err = team_summary(&team(0, &["a", "ghost"]), &snap).unwrap_err();
        assert!(matches!(err, AnalysisError::LookupMiss { kind: "user", .. }));
    }

    #[test]
    fn empty_team_is_integrity_error() {
        let snap = snapshot(&[("a", 0.2)]);
        let err = team_summary(&team(3, &[]), &snap).unwrap_err();
        assert!(matches!(err, AnalysisError::DataIntegrity(_)));
    }
}
