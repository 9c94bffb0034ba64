//! Sequential phase orchestrator with timing.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use crate::config::{
    AnalysisConfig, AnalysisResult, ClusterMode, Component, ContributionType, Orientation,
    ReputationSummary, TeamId,
};
use crate::error::AnalysisError;
use crate::graph::directed::DirectedRelationGraph;
use crate::graph::relation_graph::RelationGraph;
use crate::output::build_result;
use crate::phases;
use crate::phases::audit::AuditReport;
use crate::phases::corpus::CorpusSummary;
use crate::phases::ownership::OwnershipReport;
use crate::phases::teams::{ClusterOptions, TeamPartition};
use crate::records::{RecordAccessor, Snapshot, TopLevelMatcher};

/// Phase labels for progress reporting.
const PHASE_LABELS: &[(&str, &str)] = &[
    ("graph", "Building co-authorship graph"),
    ("teams", "Clustering teams"),
    ("contributions", "Classifying contributors"),
    ("ownership", "Attributing component ownership"),
    ("statistics", "Summarising team reputation"),
    ("corpus", "Summarising corpus"),
    ("audit", "Auditing components"),
];

/// Progress callback type: (phase_name, label).
pub type ProgressCallback = Box<dyn FnMut(&str, &str)>;

/// Results accumulated by the phases of one run.
#[derive(Default)]
pub struct PhaseState {
    /// Top-level pattern the record accessor classified names with.
    pub top_level_pattern: Option<String>,
    pub graph: Option<RelationGraph>,
    pub directed: Option<DirectedRelationGraph>,
    pub partition: Option<TeamPartition>,
    pub contributions: Option<BTreeMap<String, ContributionType>>,
    pub ownership: Option<OwnershipReport>,
    pub team_statistics: Option<BTreeMap<TeamId, ReputationSummary>>,
    pub corpus: Option<CorpusSummary>,
    pub audit: Option<AuditReport>,
}

/// Borrow the output of an earlier phase.
pub(crate) fn require<'a, T>(slot: &'a Option<T>, phase: &str) -> Result<&'a T, AnalysisError> {
    slot.as_ref()
        .ok_or_else(|| AnalysisError::DataIntegrity(format!("{phase} phase has not run")))
}

/// Type alias for phase function closures to keep signatures readable.
type PhaseFn = Box<
    dyn FnOnce(&AnalysisConfig, &dyn RecordAccessor, &mut PhaseState) -> Result<(), AnalysisError>,
>;

fn orient(
    graph: &RelationGraph,
    orientation: Option<Orientation>,
    components: &[Component],
) -> Result<DirectedRelationGraph, AnalysisError> {
    match orientation {
        Some(Orientation::AuthorOrder) => DirectedRelationGraph::by_author_order(graph, components),
        None => Err(AnalysisError::Configuration(
            "directed clustering requires an edge orientation".into(),
        )),
    }
}

/// Execute every phase over `records` and return the intermediate state
/// together with per-phase timings in seconds.
pub fn run_phases(
    config: &AnalysisConfig,
    records: &dyn RecordAccessor,
    mut progress_callback: Option<ProgressCallback>,
) -> Result<(PhaseState, HashMap<String, f64>), AnalysisError> {
    config.validate()?;

    let mut state = PhaseState {
        top_level_pattern: records.top_level_pattern().map(str::to_string),
        ..Default::default()
    };
    if let Some(pattern) = &state.top_level_pattern {
        if *pattern != config.top_level_pattern {
            log::debug!(
                "Records use top-level pattern '{pattern}', config names '{}'",
                config.top_level_pattern
            );
        }
    }
    let mut timings: HashMap<String, f64> = HashMap::new();

    let phase_fns: Vec<(&str, PhaseFn)> = vec![
        (
            "graph",
            Box::new(|config, records, state| {
                let components = records.list_components();
                let graph = RelationGraph::build(records, components, config.parallel)?;
                if config.cluster_mode == ClusterMode::Directed {
                    state.directed = Some(orient(&graph, config.orientation, components)?);
                }
                state.graph = Some(graph);
                Ok(())
            }),
        ),
        (
            "teams",
            Box::new(|config, _records, state| {
                let graph = require(&state.graph, "graph")?;
                let partition = phases::teams::cluster_teams(
                    graph,
                    state.directed.as_ref(),
                    &ClusterOptions::from(config),
                )?;
                state.partition = Some(partition);
                Ok(())
            }),
        ),
        (
            "contributions",
            Box::new(|config, records, state| {
                state.contributions = Some(phases::contribution::classify_all(
                    records,
                    config.parallel,
                ));
                Ok(())
            }),
        ),
        (
            "ownership",
            Box::new(|_config, records, state| {
                let partition = require(&state.partition, "teams")?;
                let report =
                    phases::ownership::attribute_all(partition, records.list_components())?;
                state.ownership = Some(report);
                Ok(())
            }),
        ),
        (
            "statistics",
            Box::new(|_config, records, state| {
                let partition = require(&state.partition, "teams")?;
                let stats = phases::statistics::team_statistics(partition, records)?;
                state.team_statistics = Some(stats);
                Ok(())
            }),
        ),
        (
            "corpus",
            Box::new(|_config, records, state| {
                let contributions = require(&state.contributions, "contributions")?;
                let summary = phases::corpus::summarize_corpus(records, contributions)?;
                state.corpus = Some(summary);
                Ok(())
            }),
        ),
        (
            "audit",
            Box::new(|_config, records, state| {
                state.audit = Some(phases::audit::audit_components(records));
                Ok(())
            }),
        ),
    ];

    for (name, phase_fn) in phase_fns {
        let label = PHASE_LABELS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, l)| *l)
            .unwrap_or(name);
        if let Some(ref mut cb) = progress_callback {
            cb(name, label);
        }
        log::info!("{label}...");

        let start = Instant::now();
        phase_fn(config, records, &mut state)?;
        let elapsed = start.elapsed().as_secs_f64();
        log::debug!("Phase {name} finished in {:.1}ms", elapsed * 1000.0);
        timings.insert(name.to_string(), elapsed);
    }

    Ok((state, timings))
}

/// Execute the analysis pipeline over `records` and return the result.
pub fn run_pipeline(
    config: &AnalysisConfig,
    records: &dyn RecordAccessor,
    progress_callback: Option<ProgressCallback>,
) -> Result<AnalysisResult, AnalysisError> {
    let total_start = Instant::now();
    let (state, timings) = run_phases(config, records, progress_callback)?;
    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    build_result(config, &state, &timings, total_ms)
}

/// Load the snapshot named by `config.snapshot_path` and analyse it.
pub fn run_snapshot(
    config: &AnalysisConfig,
    progress_callback: Option<ProgressCallback>,
) -> Result<AnalysisResult, AnalysisError> {
    config.validate()?;
    let matcher = TopLevelMatcher::new(&config.top_level_pattern)?;
    let snapshot = Snapshot::load(&config.snapshot_path, matcher)?;
    run_pipeline(config, &snapshot, progress_callback)
}
