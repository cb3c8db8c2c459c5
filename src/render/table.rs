//! Table model handed to presentation layers

use serde::{Deserialize, Serialize};

use super::format::DisplayFormat;
use crate::path::FieldPath;
use crate::value::FieldValue;

/// One table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Field path the column reads, in canonical dotted form
    pub path: FieldPath,
    /// Configured label, else the canonical path
    pub label: String,
    /// Configured format, else inferred from the column's first present value
    pub format: DisplayFormat,
    /// True when `format` comes from the view's display properties
    pub explicit: bool,
}

/// One table cell. The value is exactly what the pipeline produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: FieldValue,
    pub format: DisplayFormat,
}

impl Cell {
    pub fn is_undefined(&self) -> bool {
        self.value.is_absent()
    }
}

/// Rendered view: one column per output field, one cell per column per row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableModel {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableModel {
    pub fn column(&self, path: &FieldPath) -> Option<(usize, &Column)> {
        self.columns.iter().enumerate().find(|(_, c)| &c.path == path)
    }

    /// Cell at `row` for the column reading `path`.
    pub fn cell(&self, row: usize, path: &FieldPath) -> Option<&Cell> {
        let (index, _) = self.column(path)?;
        self.rows.get(row)?.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
