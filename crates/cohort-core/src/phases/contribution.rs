//! Phase 3: classify each user as designer, integrator or non-contributor.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::config::{Component, ContributionLabel, ContributionType};
use crate::records::RecordAccessor;

/// Classify from top-level (`T`) and leaf (`L`) component counts.
///
/// `T > L` is an integrator, `L > T` a designer, a non-zero tie counts as an
/// integrator and `T == L == 0` is a non-contributor. A user with both kinds
/// of components is a dual contributor whatever the label.
pub fn classify_counts(top_level: usize, leaf: usize) -> ContributionType {
    let label = if top_level > leaf {
        ContributionLabel::Integrator
    } else if leaf > top_level {
        ContributionLabel::Designer
    } else if top_level > 0 {
        ContributionLabel::Integrator
    } else {
        ContributionLabel::NonContributor
    };

    ContributionType {
        label,
        dual_contributor: top_level > 0 && leaf > 0,
        top_level,
        leaf,
    }
}

/// Classify a single user by scanning the full component collection.
pub fn classify_user<R: RecordAccessor + ?Sized>(records: &R, user: &str) -> ContributionType {
    let (top_level, leaf) = records
        .list_components()
        .iter()
        .filter(|c| c.authors.iter().any(|a| a == user))
        .fold((0, 0), |(t, l), c| {
            if records.is_top_level_name(&c.name) {
                (t + 1, l)
            } else {
                (t, l + 1)
            }
        });
    classify_counts(top_level, leaf)
}

type Counts<'a> = HashMap<&'a str, (usize, usize)>;

fn count_component<'a, R: RecordAccessor + ?Sized>(
    records: &R,
    mut counts: Counts<'a>,
    comp: &'a Component,
) -> Counts<'a> {
    let top = records.is_top_level_name(&comp.name);
    for author in &comp.authors {
        let entry = counts.entry(author.as_str()).or_insert((0, 0));
        if top {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }
    counts
}

fn merge_counts<'a>(mut into: Counts<'a>, from: Counts<'a>) -> Counts<'a> {
    for (author, (t, l)) in from {
        let entry = into.entry(author).or_insert((0, 0));
        entry.0 += t;
        entry.1 += l;
    }
    into
}

/// Classify every user in the snapshot, plus any author without a user record.
///
/// Counting is a single pass over the components; with `parallel` the pass is
/// split across the rayon pool and the partial counts merged afterwards.
pub fn classify_all<R: RecordAccessor + ?Sized>(
    records: &R,
    parallel: bool,
) -> BTreeMap<String, ContributionType> {
    let components = records.list_components();
    let counts: Counts<'_> = if parallel {
        components
            .par_iter()
            .fold(Counts::new, |acc, c| count_component(records, acc, c))
            .reduce(Counts::new, merge_counts)
    } else {
        components
            .iter()
            .fold(Counts::new(), |acc, c| count_component(records, acc, c))
    };

    let mut result: BTreeMap<String, ContributionType> = records
        .list_users()
        .iter()
        .map(|u| {
            let (t, l) = counts.get(u.name.as_str()).copied().unwrap_or((0, 0));
            (u.name.clone(), classify_counts(t, l))
        })
        .collect();
    for (author, &(t, l)) in &counts {
        result
            .entry((*author).to_string())
            .or_insert_with(|| classify_counts(t, l));
    }

    log::debug!("Classified {} users", result.len());
    result
}
