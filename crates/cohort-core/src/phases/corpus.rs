//! Phase 6: corpus-wide user and component summaries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::{
    Component, ComponentKey, ContributionLabel, ContributionType, ReputationSummary,
};
use crate::error::AnalysisError;
use crate::phases::statistics::{pearson, summarize, summarize_optional};
use crate::records::RecordAccessor;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserCounts {
    pub total: usize,
    /// Users who authored at least one component.
    pub contributors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentCounts {
    pub total: usize,
    pub submitted: usize,
    pub top_level: usize,
    /// Distinct component names.
    pub families: usize,
    /// Components whose family has more than one revision.
    pub multi_revisioned: usize,
    /// Not submitted and never used as a subcomponent.
    #[serde(default)]
    pub unused: usize,
    /// Not submitted and not a direct subcomponent of a submitted design.
    #[serde(default)]
    pub unsubmitted: usize,
}

/// Change from the first to the latest revision, one sample per family
/// with more than one revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionChangeStats {
    pub families: usize,
    pub reputation: Option<ReputationSummary>,
    pub in_degree: Option<ReputationSummary>,
    pub out_degree: Option<ReputationSummary>,
}

/// Reputation and degree summaries over every component revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentStats {
    pub reputation: Option<ReputationSummary>,
    pub in_degree: Option<ReputationSummary>,
    pub out_degree: Option<ReputationSummary>,
    pub submitted_reputation: Option<ReputationSummary>,
    pub unsubmitted_reputation: Option<ReputationSummary>,
    /// Pearson correlation of reputation with in-degree.
    pub in_degree_correlation: Option<f64>,
    pub out_degree_correlation: Option<f64>,
    #[serde(default)]
    pub revision_change: RevisionChangeStats,
}

/// Reputation of the components one user authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserComponentStats {
    pub user: String,
    pub components: usize,
    pub reputation: ReputationSummary,
    pub submitted_ratio: f64,
}

/// Users grouped by contribution type, with sorted reputations per group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserTypeStats {
    pub designers: Vec<String>,
    pub integrators: Vec<String>,
    pub dual_contributors: Vec<String>,
    pub designer_reputations: Vec<f64>,
    pub integrator_reputations: Vec<f64>,
    pub dual_contributor_reputations: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub users: UserCounts,
    pub components: ComponentCounts,
    pub user_reputation: Option<ReputationSummary>,
    pub contributor_reputation: Option<ReputationSummary>,
    pub non_contributor_reputation: Option<ReputationSummary>,
    /// Change between each user's first and last reputation sample.
    pub reputation_change: Option<ReputationSummary>,
    #[serde(default)]
    pub user_components: Vec<UserComponentStats>,
    #[serde(default)]
    pub user_types: UserTypeStats,
    #[serde(default)]
    pub component_stats: ComponentStats,
}

/// Summarise the snapshot. `contributions` comes from the contribution phase.
pub fn summarize_corpus<R: RecordAccessor + ?Sized>(
    records: &R,
    contributions: &BTreeMap<String, ContributionType>,
) -> Result<CorpusSummary, AnalysisError> {
    let users = records.list_users();
    let components = records.list_components();

    let mut by_author: HashMap<&str, Vec<&Component>> = HashMap::new();
    for comp in components {
        for author in &comp.authors {
            by_author.entry(author.as_str()).or_default().push(comp);
        }
    }
    let contributors: HashSet<&str> = by_author.keys().copied().collect();

    let mut all_reps = Vec::with_capacity(users.len());
    let mut contrib_reps = Vec::new();
    let mut non_contrib_reps = Vec::new();
    let mut changes = Vec::with_capacity(users.len());
    let mut user_components = Vec::new();

    for user in users {
        all_reps.push(user.reputation);
        match by_author.get(user.name.as_str()) {
            Some(authored) => {
                contrib_reps.push(user.reputation);
                let reps: Vec<f64> = authored.iter().map(|c| c.reputation).collect();
                let submitted = authored.iter().filter(|c| c.submit).count();
                user_components.push(UserComponentStats {
                    user: user.name.clone(),
                    components: authored.len(),
                    reputation: summarize(&reps)?,
                    submitted_ratio: submitted as f64 / authored.len() as f64,
                });
            }
            None => non_contrib_reps.push(user.reputation),
        }

        let change = match (user.reputation_history.first(), user.reputation_history.last()) {
            (Some(first), Some(last)) => last.value - first.value,
            _ => 0.0,
        };
        changes.push(change);
    }

    let mut revisions: HashMap<&str, usize> = HashMap::new();
    for comp in components {
        *revisions.entry(comp.name.as_str()).or_insert(0) += 1;
    }
    let in_submitted: HashSet<ComponentKey> = components
        .iter()
        .filter(|c| c.submit)
        .flat_map(|c| c.subcomponents.iter().cloned())
        .collect();
    let component_counts = ComponentCounts {
        total: components.len(),
        submitted: components.iter().filter(|c| c.submit).count(),
        top_level: components
            .iter()
            .filter(|c| records.is_top_level_name(&c.name))
            .count(),
        families: revisions.len(),
        multi_revisioned: components
            .iter()
            .filter(|c| revisions.get(c.name.as_str()).copied().unwrap_or(0) > 1)
            .count(),
        unused: components
            .iter()
            .filter(|c| !c.submit && c.in_degree == 0)
            .count(),
        unsubmitted: components
            .iter()
            .filter(|c| !c.submit && !in_submitted.contains(&c.key()))
            .count(),
    };

    Ok(CorpusSummary {
        users: UserCounts {
            total: users.len(),
            contributors: contributors.len(),
        },
        components: component_counts,
        user_reputation: summarize_optional(&all_reps),
        contributor_reputation: summarize_optional(&contrib_reps),
        non_contributor_reputation: summarize_optional(&non_contrib_reps),
        reputation_change: summarize_optional(&changes),
        user_components,
        user_types: user_type_stats(records, contributions)?,
        component_stats: component_stats(components),
    })
}

/// Summarise component reputation, degrees and revision-to-revision change.
pub fn component_stats(components: &[Component]) -> ComponentStats {
    let mut reputations = Vec::with_capacity(components.len());
    let mut in_degrees = Vec::with_capacity(components.len());
    let mut out_degrees = Vec::with_capacity(components.len());
    let mut submitted = Vec::new();
    let mut unsubmitted = Vec::new();
    // name -> (earliest revision, latest revision)
    let mut families: BTreeMap<&str, (&Component, &Component)> = BTreeMap::new();

    for comp in components {
        reputations.push(comp.reputation);
        in_degrees.push(f64::from(comp.in_degree));
        out_degrees.push(f64::from(comp.out_degree));
        if comp.submit {
            submitted.push(comp.reputation);
        } else {
            unsubmitted.push(comp.reputation);
        }
        families
            .entry(comp.name.as_str())
            .and_modify(|(first, last)| {
                if comp.revision < first.revision {
                    *first = comp;
                }
                if comp.revision > last.revision {
                    *last = comp;
                }
            })
            .or_insert((comp, comp));
    }

    let mut rep_change = Vec::new();
    let mut in_change = Vec::new();
    let mut out_change = Vec::new();
    for (first, last) in families.values() {
        if first.revision == last.revision {
            continue;
        }
        rep_change.push(last.reputation - first.reputation);
        in_change.push(f64::from(last.in_degree) - f64::from(first.in_degree));
        out_change.push(f64::from(last.out_degree) - f64::from(first.out_degree));
    }

    ComponentStats {
        reputation: summarize_optional(&reputations),
        in_degree: summarize_optional(&in_degrees),
        out_degree: summarize_optional(&out_degrees),
        submitted_reputation: summarize_optional(&submitted),
        unsubmitted_reputation: summarize_optional(&unsubmitted),
        in_degree_correlation: pearson(&reputations, &in_degrees),
        out_degree_correlation: pearson(&reputations, &out_degrees),
        revision_change: RevisionChangeStats {
            families: rep_change.len(),
            reputation: summarize_optional(&rep_change),
            in_degree: summarize_optional(&in_change),
            out_degree: summarize_optional(&out_change),
        },
    }
}

/// Group users by contribution label and dual-contributor flag.
pub fn user_type_stats<R: RecordAccessor + ?Sized>(
    records: &R,
    contributions: &BTreeMap<String, ContributionType>,
) -> Result<UserTypeStats, AnalysisError> {
    let mut stats = UserTypeStats::default();
    for (name, ct) in contributions {
        let reputation = records
            .user(name)
            .map(|u| u.reputation)
            .ok_or_else(|| AnalysisError::lookup("user", name.clone()))?;
        match ct.label {
            ContributionLabel::Designer => {
                stats.designers.push(name.clone());
                stats.designer_reputations.push(reputation);
            }
            ContributionLabel::Integrator => {
                stats.integrators.push(name.clone());
                stats.integrator_reputations.push(reputation);
            }
            ContributionLabel::NonContributor => {}
        }
        if ct.dual_contributor {
            stats.dual_contributors.push(name.clone());
            stats.dual_contributor_reputations.push(reputation);
        }
    }
    stats.designer_reputations.sort_by(|a, b| a.total_cmp(b));
    stats.integrator_reputations.sort_by(|a, b| a.total_cmp(b));
    stats.dual_contributor_reputations.sort_by(|a, b| a.total_cmp(b));
    Ok(stats)
}
