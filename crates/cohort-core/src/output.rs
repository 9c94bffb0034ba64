//! JSON report assembly and serialisation.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;

use crate::config::{
    AnalysisConfig, AnalysisResult, ComponentOwnershipOutput, ContributionLabel,
    ContributionOutput, OwnershipOutput, TeamMemberOutput, TeamOutput,
};
use crate::error::AnalysisError;
use crate::phases::teams::compute_cohesion;
use crate::pipeline::{require, PhaseState};

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Build the AnalysisResult from the accumulated phase state.
pub fn build_result(
    config: &AnalysisConfig,
    state: &PhaseState,
    timings: &HashMap<String, f64>,
    total_ms: f64,
) -> Result<AnalysisResult, AnalysisError> {
    let graph = require(&state.graph, "graph")?;
    let partition = require(&state.partition, "teams")?;
    let contributions = require(&state.contributions, "contributions")?;
    let ownership = require(&state.ownership, "ownership")?;
    let team_stats = require(&state.team_statistics, "statistics")?;
    let corpus = require(&state.corpus, "corpus")?;
    let audit = require(&state.audit, "audit")?;

    let mut metadata = HashMap::new();
    metadata.insert(
        "snapshot_path".to_string(),
        serde_json::Value::String(config.snapshot_path.clone()),
    );
    metadata.insert(
        "analysed_at".to_string(),
        serde_json::Value::String(Utc::now().to_rfc3339()),
    );
    metadata.insert(
        "cohort_version".to_string(),
        serde_json::Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );
    metadata.insert(
        "analysis_duration_ms".to_string(),
        serde_json::json!(((total_ms * 10.0).round() / 10.0)),
    );
    metadata.insert("phase_timings".to_string(), serde_json::to_value(timings)?);
    metadata.insert(
        "cluster_mode".to_string(),
        serde_json::Value::String(config.cluster_mode.as_str().to_string()),
    );
    metadata.insert(
        "orientation".to_string(),
        config
            .orientation
            .map(|o| serde_json::Value::String(o.as_str().to_string()))
            .unwrap_or(serde_json::Value::Null),
    );
    metadata.insert(
        "isolated_users".to_string(),
        serde_json::Value::String(config.isolated_users.as_str().to_string()),
    );
    // Prefer the pattern the records were classified with over the config.
    let pattern = state
        .top_level_pattern
        .as_deref()
        .unwrap_or(&config.top_level_pattern);
    metadata.insert(
        "top_level_pattern".to_string(),
        serde_json::Value::String(pattern.to_string()),
    );

    // Teams
    let mut teams = Vec::with_capacity(partition.len());
    for team in partition.teams() {
        let mut members = Vec::with_capacity(team.members.len());
        for name in &team.members {
            let node = graph
                .node(name)
                .ok_or_else(|| AnalysisError::lookup("user", name.clone()))?;
            let ct = contributions
                .get(name)
                .ok_or_else(|| AnalysisError::lookup("contribution", name.clone()))?;
            members.push(TeamMemberOutput {
                name: name.clone(),
                label: node.label(),
                reputation: node.reputation,
                contribution: ct.label,
                dual_contributor: ct.dual_contributor,
            });
        }
        let reputation = team_stats
            .get(&team.id)
            .cloned()
            .ok_or_else(|| AnalysisError::lookup("team", team.id.to_string()))?;
        teams.push(TeamOutput {
            id: team.id.to_string(),
            members,
            cohesion: round3(compute_cohesion(team, graph)),
            reputation,
        });
    }

    let ownership_output = OwnershipOutput {
        unowned: ownership.unowned,
        single_team: ownership.single_team,
        multi_team: ownership.multi_team,
        components: ownership
            .components
            .values()
            .map(|o| ComponentOwnershipOutput {
                component: o.key.to_string(),
                name: o.key.name.clone(),
                revision: o.key.revision,
                category: o.category,
                teams: o.teams.iter().map(|t| t.to_string()).collect(),
            })
            .collect(),
    };

    let contribution_output: Vec<ContributionOutput> = contributions
        .iter()
        .map(|(user, ct)| ContributionOutput {
            user: user.clone(),
            label: ct.label,
            dual_contributor: ct.dual_contributor,
            top_level: ct.top_level,
            leaf: ct.leaf,
        })
        .collect();

    let count_label = |label: ContributionLabel| {
        contributions.values().filter(|c| c.label == label).count()
    };

    let mut stats = HashMap::new();
    stats.insert("users".to_string(), serde_json::json!(corpus.users.total));
    stats.insert(
        "components".to_string(),
        serde_json::json!(corpus.components.total),
    );
    stats.insert("graph_nodes".to_string(), serde_json::json!(graph.node_count()));
    stats.insert("graph_edges".to_string(), serde_json::json!(graph.edge_count()));
    stats.insert("teams".to_string(), serde_json::json!(partition.len()));
    stats.insert(
        "excluded_users".to_string(),
        serde_json::json!(partition.excluded().len()),
    );
    stats.insert("unowned".to_string(), serde_json::json!(ownership.unowned));
    stats.insert(
        "single_team".to_string(),
        serde_json::json!(ownership.single_team),
    );
    stats.insert(
        "multi_team".to_string(),
        serde_json::json!(ownership.multi_team),
    );
    stats.insert(
        "designers".to_string(),
        serde_json::json!(count_label(ContributionLabel::Designer)),
    );
    stats.insert(
        "integrators".to_string(),
        serde_json::json!(count_label(ContributionLabel::Integrator)),
    );
    stats.insert(
        "dual_contributors".to_string(),
        serde_json::json!(contributions.values().filter(|c| c.dual_contributor).count()),
    );
    stats.insert(
        "audit_findings".to_string(),
        serde_json::json!(audit.findings.len()),
    );

    Ok(AnalysisResult {
        version: "1.0".to_string(),
        metadata,
        stats,
        teams,
        excluded_users: partition.excluded().iter().cloned().collect(),
        ownership: ownership_output,
        contributions: contribution_output,
        team_statistics: team_stats
            .iter()
            .map(|(id, summary)| (id.to_string(), *summary))
            .collect(),
        corpus: corpus.clone(),
        audit: audit.clone(),
    })
}

/// Write the analysis result to a JSON file.
pub fn write_output(result: &AnalysisResult, output_path: &str) -> Result<(), AnalysisError> {
    if let Some(parent) = Path::new(output_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(output_path, json)?;
    log::info!("Wrote report to {output_path}");
    Ok(())
}
