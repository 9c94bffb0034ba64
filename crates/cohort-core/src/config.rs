//! Core data types and configuration for cohort analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::AnalysisError;
use crate::phases::audit::AuditReport;
use crate::phases::corpus::CorpusSummary;

/// Naming convention for finished, top-level designs: a UUID-shaped name.
pub const DEFAULT_TOP_LEVEL_PATTERN: &str = r"\w{8}-\w{4}-\w{4}-\w{4}-\w{12}";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One sample of a user's reputation over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A contributor in the record store. `name` is unique per snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub reputation: f64,
    #[serde(default)]
    pub reputation_history: Vec<ReputationSample>,
}

/// Unique key of a component revision.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentKey {
    pub name: String,
    pub revision: u32,
}

impl ComponentKey {
    pub fn new(name: impl Into<String>, revision: u32) -> Self {
        Self {
            name: name.into(),
            revision,
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.revision)
    }
}

/// A versioned component and the users who authored it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub revision: u32,
    #[serde(default)]
    pub reputation: f64,
    /// Whether this revision is a final submitted design.
    #[serde(default)]
    pub submit: bool,
    /// Author user names, in authorship order.
    pub authors: Vec<String>,
    #[serde(default)]
    pub subcomponents: Vec<ComponentKey>,
    #[serde(default)]
    pub in_degree: u32,
    #[serde(default)]
    pub out_degree: u32,
}

impl Component {
    pub fn key(&self) -> ComponentKey {
        ComponentKey::new(self.name.clone(), self.revision)
    }

    /// Unsubmitted revision with reputation 0.5 and no subcomponents.
    #[cfg(test)]
    pub(crate) fn with_authors(name: &str, revision: u32, authors: &[&str]) -> Self {
        Self {
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
}

// ---------------------------------------------------------------------------
// Analysis vocabulary
// ---------------------------------------------------------------------------

/// How the relation graph is partitioned into teams.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ClusterMode {
    /// Connected components of the undirected co-authorship graph.
    #[default]
    Undirected,
    /// Strongly connected components of a caller-oriented directed graph.
    Directed,
}

impl ClusterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undirected => "undirected",
            Self::Directed => "directed",
        }
    }

    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "undirected" => Some(Self::Undirected),
            "directed" => Some(Self::Directed),
            _ => None,
        }
    }
}

impl fmt::Display for ClusterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule used to impose a direction on co-authorship edges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Earlier-listed author points to later-listed author.
    AuthorOrder,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorOrder => "author-order",
        }
    }

    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "author-order" => Some(Self::AuthorOrder),
            _ => None,
        }
    }
}

/// What happens to users without any co-authorship edge.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IsolatedPolicy {
    /// Each isolated user forms a team of one.
    #[default]
    Singleton,
    /// Isolated users are left out of the team partition.
    Exclude,
}

impl IsolatedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singleton => "singleton",
            Self::Exclude => "exclude",
        }
    }
}

impl fmt::Display for IsolatedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a team within one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub usize);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team_{}", self.0)
    }
}

/// A cluster of users. Members are sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub members: Vec<String>,
}

/// Primary contribution pattern of a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ContributionLabel {
    /// Mostly authors leaf components.
    Designer,
    /// Mostly authors top-level components.
    Integrator,
    NonContributor,
}

impl ContributionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Designer => "designer",
            Self::Integrator => "integrator",
            Self::NonContributor => "non-contributor",
        }
    }
}

impl fmt::Display for ContributionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one user, with the counts it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionType {
    pub label: ContributionLabel,
    pub dual_contributor: bool,
    pub top_level: usize,
    pub leaf: usize,
}

/// How many distinct teams a component's authors belong to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OwnershipCategory {
    Unowned,
    SingleTeam,
    MultiTeam,
}

impl OwnershipCategory {
    pub fn from_team_count(count: usize) -> Self {
        match count {
            0 => Self::Unowned,
            1 => Self::SingleTeam,
            _ => Self::MultiTeam,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unowned => "unowned",
            Self::SingleTeam => "single-team",
            Self::MultiTeam => "multi-team",
        }
    }
}

impl fmt::Display for OwnershipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive statistics over a set of reputation values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReputationSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population variance.
    pub variance: f64,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub snapshot_path: String,
    pub output_path: Option<String>,
    #[serde(default)]
    pub cluster_mode: ClusterMode,
    /// Required for, and only valid with, directed clustering.
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub isolated_users: IsolatedPolicy,
    #[serde(default = "default_top_level_pattern")]
    pub top_level_pattern: String,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub quiet: bool,
}

fn default_top_level_pattern() -> String {
    DEFAULT_TOP_LEVEL_PATTERN.to_string()
}
fn default_parallel() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            snapshot_path: String::new(),
            output_path: None,
            cluster_mode: ClusterMode::default(),
            orientation: None,
            isolated_users: IsolatedPolicy::default(),
            top_level_pattern: default_top_level_pattern(),
            parallel: default_parallel(),
            verbose: false,
            quiet: false,
        }
    }
}

impl AnalysisConfig {
    /// Reject inconsistent settings before any phase runs.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match (self.cluster_mode, self.orientation) {
            (ClusterMode::Directed, None) => {
                return Err(AnalysisError::Configuration(
                    "directed clustering requires an edge orientation".into(),
                ))
            }
            (ClusterMode::Undirected, Some(o)) => {
                return Err(AnalysisError::Configuration(format!(
                    "orientation '{}' is only meaningful for directed clustering",
                    o.as_str()
                )))
            }
            _ => {}
        }
        if self.top_level_pattern.trim().is_empty() {
            return Err(AnalysisError::Configuration(
                "top-level pattern must not be empty".into(),
            ));
        }
        if self.verbose && self.quiet {
            return Err(AnalysisError::Configuration(
                "verbose and quiet are mutually exclusive".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output schema
// ---------------------------------------------------------------------------

/// Result of an analysis run, serialised as the JSON report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub stats: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub teams: Vec<TeamOutput>,
    #[serde(default)]
    pub excluded_users: Vec<String>,
    #[serde(default)]
    pub ownership: OwnershipOutput,
    #[serde(default)]
    pub contributions: Vec<ContributionOutput>,
    /// Member reputation summary keyed by team id.
    #[serde(default)]
    pub team_statistics: BTreeMap<String, ReputationSummary>,
    #[serde(default)]
    pub corpus: CorpusSummary,
    #[serde(default)]
    pub audit: AuditReport,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            version: default_version(),
            metadata: HashMap::new(),
            stats: HashMap::new(),
            teams: Vec::new(),
            excluded_users: Vec::new(),
            ownership: OwnershipOutput::default(),
            contributions: Vec::new(),
            team_statistics: BTreeMap::new(),
            corpus: CorpusSummary::default(),
            audit: AuditReport::default(),
        }
    }
}

/// Team in the output JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamOutput {
    pub id: String,
    pub members: Vec<TeamMemberOutput>,
    pub cohesion: f64,
    pub reputation: ReputationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberOutput {
    pub name: String,
    pub label: String,
    pub reputation: f64,
    pub contribution: ContributionLabel,
    pub dual_contributor: bool,
}

/// Ownership section of the output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnershipOutput {
    pub unowned: usize,
    pub single_team: usize,
    pub multi_team: usize,
    #[serde(default)]
    pub components: Vec<ComponentOwnershipOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentOwnershipOutput {
    pub component: String,
    pub name: String,
    pub revision: u32,
    pub category: OwnershipCategory,
    pub teams: Vec<String>,
}

/// Contribution classification in the output JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionOutput {
    pub user: String,
    pub label: ContributionLabel,
    pub dual_contributor: bool,
    pub top_level: usize,
    pub leaf: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_key_display_joins_revision() {
        assert_eq!(ComponentKey::new("wheel", 3).to_string(), "wheel_3");
    }

    #[test]
    fn component_keys_order_by_name_then_revision() {
        let mut keys = vec![
            ComponentKey::new("b", 1),
            ComponentKey::new("a", 2),
            ComponentKey::new("a", 1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                ComponentKey::new("a", 1),
                ComponentKey::new("a", 2),
                ComponentKey::new("b", 1),
            ]
        );
    }

    #[test]
    fn with_authors_keeps_authorship_order() {
        let comp = Component::with_authors("gear", 2, &["ben", "ann"]);
        assert_eq!(comp.key(), ComponentKey::new("gear", 2));
        assert_eq!(comp.authors, vec!["ben".to_string(), "ann".to_string()]);
        assert!(!comp.submit);
        assert!(comp.subcomponents.is_empty());
        assert_eq!((comp.in_degree, comp.out_degree), (0, 0));
    }

    #[test]
    fn ownership_category_from_team_count() {
        assert_eq!(OwnershipCategory::from_team_count(0), OwnershipCategory::Unowned);
        assert_eq!(OwnershipCategory::from_team_count(1), OwnershipCategory::SingleTeam);
        assert_eq!(OwnershipCategory::from_team_count(4), OwnershipCategory::MultiTeam);
    }

    #[test]
    fn team_id_display() {
        assert_eq!(TeamId(2).to_string(), "team_2");
    }

    #[test]
    fn analysis_config_defaults() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.cluster_mode, ClusterMode::Undirected);
        assert_eq!(cfg.isolated_users, IsolatedPolicy::Singleton);
        assert_eq!(cfg.top_level_pattern, DEFAULT_TOP_LEVEL_PATTERN);
        assert!(cfg.parallel);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn directed_mode_without_orientation_is_rejected() {
        let cfg = AnalysisConfig {
            cluster_mode: ClusterMode::Directed,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn orientation_without_directed_mode_is_rejected() {
        let cfg = AnalysisConfig {
            orientation: Some(Orientation::AuthorOrder),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"cluster_mode": "directed", "orientation": "author-order"}"#)
                .unwrap();
        assert_eq!(cfg.cluster_mode, ClusterMode::Directed);
        assert_eq!(cfg.orientation, Some(Orientation::AuthorOrder));
        assert_eq!(cfg.isolated_users, IsolatedPolicy::Singleton);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn contribution_label_serializes_kebab_case() {
        let json = serde_json::to_string(&ContributionLabel::NonContributor).unwrap();
        assert_eq!(json, "\"non-contributor\"");
    }

    #[test]
    fn component_defaults_when_fields_missing() {
        let comp: Component =
            serde_json::from_str(r#"{"name": "gear", "revision": 1, "authors": ["alice"]}"#)
                .unwrap();
        assert!(!comp.submit);
        assert!(comp.subcomponents.is_empty());
        assert_eq!(comp.reputation, 0.0);
        assert_eq!(comp.key(), ComponentKey::new("gear", 1));
    }

    #[test]
    fn analysis_result_default() {
        let result = AnalysisResult::default();
        assert_eq!(result.version, "1.0");
        assert!(result.teams.is_empty());
        assert!(result.contributions.is_empty());
        assert_eq!(result.ownership.multi_team, 0);
    }
}
