//! Cohort Core: collaboration structure analysis over a component corpus.
//!
//! This crate contains all analysis logic: co-authorship graph construction,
//! team clustering, contribution classification, ownership attribution and
//! reputation statistics.

pub mod config;
pub mod error;
pub mod graph;
pub mod output;
pub mod phases;
pub mod pipeline;
pub mod records;

pub use error::AnalysisError;
pub use records::{RecordAccessor, Snapshot, TopLevelMatcher};
