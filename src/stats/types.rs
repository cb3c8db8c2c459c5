//! Field statistics types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::FieldValue;

/// Monotonic per-field aggregates.
///
/// Counts only grow and `min`/`max` only widen while records are appended.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStats {
    /// Records where the field is explicitly `null`
    pub null_count: u64,
    /// Records where the field is absent
    pub empty_count: u64,
    /// Smallest measure seen; `None` until a measurable value arrives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Largest measure seen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FieldStats {
    /// Folds one observed value into the aggregates.
    pub fn observe(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Absent => self.empty_count += 1,
            FieldValue::Null => self.null_count += 1,
            FieldValue::Present(Value::Bool(flag)) => {
                // min pins to 0, max flips to 1 on the first true
                self.widen(0.0);
                self.widen(if *flag { 1.0 } else { 0.0 });
            }
            FieldValue::Present(other) => {
                if let Some(measure) = measure(other) {
                    self.widen(measure);
                }
            }
        }
    }

    fn widen(&mut self, measure: f64) {
        self.min = Some(self.min.map_or(measure, |m| m.min(measure)));
        self.max = Some(self.max.map_or(measure, |m| m.max(measure)));
    }

    /// True when `self` could have been produced from `earlier` by
    /// observing more values.
    pub fn extends(&self, earlier: &FieldStats) -> bool {
        let min_ok = match (earlier.min, self.min) {
            (None, _) => true,
            (Some(before), Some(after)) => after <= before,
            (Some(_), None) => false,
        };
        let max_ok = match (earlier.max, self.max) {
            (None, _) => true,
            (Some(before), Some(after)) => after >= before,
            (Some(_), None) => false,
        };
        self.null_count >= earlier.null_count
            && self.empty_count >= earlier.empty_count
            && min_ok
            && max_ok
    }
}

/// Measure used for min/max, chosen by the value's runtime type.
///
/// Numbers measure themselves, strings their length in characters,
/// arrays their element count, objects their key count.
pub fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(a) => Some(a.len() as f64),
        Value::Object(o) => Some(o.len() as f64),
        Value::Bool(_) | Value::Null => None,
    }
}

/// Read-only statistics surface for monitoring consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Stats keyed by canonical field path
    pub fields: BTreeMap<String, FieldStats>,
    /// Records folded in so far
    pub item_count: u64,
    /// Time of the last committed batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatsSnapshot {
    pub fn field(&self, path: &str) -> Option<&FieldStats> {
        self.fields.get(path)
    }
}
