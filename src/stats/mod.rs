//! Field statistics
//!
//! Null and empty counts plus min/max per declared field path, accumulated
//! as batches are accepted. Only a full rebuild ever recomputes them.

mod aggregator;
mod types;

pub use aggregator::StatsAggregator;
pub use types::{measure, FieldStats, StatsSnapshot};
