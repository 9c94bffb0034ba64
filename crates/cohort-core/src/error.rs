//! Error taxonomy for an analysis run.

/// Errors surfaced by the analysis entry points.
///
/// Every variant aborts the current run. Nothing is retried: the input is an
/// immutable snapshot, so a failure is deterministic.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A record or a computed value breaks a structural invariant
    /// (component without authors, empty team, empty summary input).
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// Invalid or inconsistent configuration, detected before any phase runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A query referenced a user, team or component that is not present.
    #[error("lookup miss: {kind} '{key}' not found")]
    LookupMiss { kind: &'static str, key: String },

    /// Filesystem I/O failure while reading a snapshot or writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or output (de)serialisation failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn lookup(kind: &'static str, key: impl Into<String>) -> Self {
        Self::LookupMiss {
            kind,
            key: key.into(),
        }
    }
}
