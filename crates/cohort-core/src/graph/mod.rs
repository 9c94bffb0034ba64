//! Graph structures built from the record snapshot.

pub mod directed;
pub mod relation_graph;
