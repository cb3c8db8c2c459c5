//! Statistics aggregator
//!
//! Folds accepted records into per-field statistics for every path the
//! schema declares. A batch is folded into a staged copy first; the owner
//! swaps the copy in only after the batch is persisted, so a failed write
//! leaves statistics untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::types::{FieldStats, StatsSnapshot};
use crate::path::FieldPath;
use crate::value::FieldValue;

/// Incremental per-field statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsAggregator {
    fields: BTreeMap<FieldPath, FieldStats>,
    item_count: u64,
    updated_at: Option<DateTime<Utc>>,
}

impl StatsAggregator {
    /// Creates empty statistics for `paths`.
    pub fn new<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a FieldPath>,
    {
        Self {
            fields: paths
                .into_iter()
                .map(|path| (path.clone(), FieldStats::default()))
                .collect(),
            item_count: 0,
            updated_at: None,
        }
    }

    /// Folds one accepted record.
    ///
    /// Nested paths walk nested objects; a parent that is absent, null or
    /// not an object makes the nested field absent.
    pub fn update(&mut self, record: &Value) {
        let empty = Map::new();
        let record = record.as_object().unwrap_or(&empty);
        for (path, stats) in self.fields.iter_mut() {
            stats.observe(&FieldValue::from_option(path.walk(record)));
        }
        self.item_count += 1;
    }

    /// Returns a copy with `batch` folded in. `self` is unchanged.
    pub fn stage(&self, batch: &[Value], at: DateTime<Utc>) -> Self {
        let mut staged = self.clone();
        for record in batch {
            staged.update(record);
        }
        staged.updated_at = Some(at);
        staged
    }

    /// Recomputes statistics from scratch over `records`.
    pub fn rebuild(&mut self, records: &[Value]) {
        for stats in self.fields.values_mut() {
            *stats = FieldStats::default();
        }
        self.item_count = 0;
        for record in records {
            self.update(record);
        }
        self.updated_at = Some(Utc::now());
    }

    pub fn field(&self, path: &FieldPath) -> Option<&FieldStats> {
        self.fields.get(path)
    }

    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fields: self
                .fields
                .iter()
                .map(|(path, stats)| (path.canonical(), *stats))
                .collect(),
            item_count: self.item_count,
            updated_at: self.updated_at,
        }
    }
}
