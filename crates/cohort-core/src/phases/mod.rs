//! Analysis phases, run in order by the pipeline.

pub mod audit;
pub mod contribution;
pub mod corpus;
pub mod ownership;
pub mod statistics;
pub mod teams;
