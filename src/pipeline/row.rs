//! Projected rows
//!
//! A row has exactly one cell per output column, in column order. Missing
//! fields are kept as [`FieldValue::Absent`] cells so every row of a view
//! has the same shape.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::path::FieldPath;
use crate::value::FieldValue;

/// One output row of a transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<(FieldPath, FieldValue)>,
}

impl Row {
    /// Projects `columns` out of `record`, in order.
    pub fn select(record: &Map<String, Value>, columns: &[FieldPath]) -> Self {
        Self {
            cells: columns
                .iter()
                .map(|column| (column.clone(), FieldValue::read(record, column)))
                .collect(),
        }
    }

    /// Drops the listed columns. Paths that are not columns are ignored.
    pub fn omit(&mut self, omit: &[FieldPath]) {
        if !omit.is_empty() {
            self.cells.retain(|(column, _)| !omit.contains(column));
        }
    }

    /// Keeps only the cells whose column satisfies `keep`.
    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(&FieldPath) -> bool,
    {
        self.cells.retain(|(column, _)| keep(column));
    }

    /// The cell for `column`; `Absent` if the row has no such column.
    pub fn get(&self, column: &FieldPath) -> &FieldValue {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, value)| value)
            .unwrap_or(&FieldValue::Absent)
    }

    pub fn columns(&self) -> impl Iterator<Item = &FieldPath> {
        self.cells.iter().map(|(column, _)| column)
    }

    pub fn cells(&self) -> &[(FieldPath, FieldValue)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when every cell is absent, null or empty.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.is_blank())
    }

    /// Converts to a JSON record keyed by canonical column name. Absent
    /// cells are left out; null cells are kept.
    pub fn to_record(&self) -> Map<String, Value> {
        self.cells
            .iter()
            .filter_map(|(column, value)| {
                value.clone().into_json().map(|json| (column.canonical(), json))
            })
            .collect()
    }
}

/// Serializes as a map from canonical column name to [`FieldValue`], in
/// column order. Every row of a view has the same keys; absent cells keep
/// their `undefined` marker. [`Row::to_record`] is the lossy plain-JSON view.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(&column.canonical(), value)?;
        }
        map.end()
    }
}
