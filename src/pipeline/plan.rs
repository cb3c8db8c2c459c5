//! Transformation plans
//!
//! Execution order (fixed; reordering changes results):
//!
//! 1. unwind, each path in listed order
//! 2. flatten, each path in listed order
//! 3. select `fields`, in order; missing fields become absent cells
//! 4. omit
//! 5. order: natural write order, or reversed when `desc`
//! 6. offset / limit
//!
//! A plan is a pure function of its input records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{TransformResult, TransformationError};
use super::row::Row;
use super::stages::{flatten, unwind};
use crate::path::FieldPath;
use crate::schema::ViewTransformation;

/// Request-time overrides of a view's paging and cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQuery {
    /// Rows to skip after ordering
    #[serde(default)]
    pub offset: usize,
    /// Overrides the view's `limit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Overrides the view's `desc`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<bool>,
    /// Skip hidden columns and rows with no usable cell
    #[serde(default)]
    pub clean: bool,
    /// Skip columns whose first segment starts with `#`
    #[serde(default)]
    pub skip_hidden: bool,
}

impl ViewQuery {
    fn hides_columns(&self) -> bool {
        self.clean || self.skip_hidden
    }
}

/// Output of a paged run.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Rows in output order
    pub rows: Vec<Row>,
    /// Rows available before offset and limit
    pub total: usize,
    /// Offset that was applied
    pub offset: usize,
    /// Limit that was applied, if any
    pub limit: Option<u64>,
}

/// A checked, ready-to-run view transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPlan {
    unwind: Vec<FieldPath>,
    flatten: Vec<FieldPath>,
    fields: Vec<FieldPath>,
    omit: Vec<FieldPath>,
    limit: Option<u64>,
    desc: bool,
}

impl TransformPlan {
    /// Checks a transformation for ambiguity and builds a plan.
    ///
    /// # Errors
    ///
    /// - `NoFields` if nothing is selected
    /// - `DuplicateField`, `AmbiguousUnwind`, `DuplicateFlatten` for repeats
    /// - `UnwindFlattenConflict` if a path is both unwound and flattened
    /// - `CyclicUnwind` if an unwind target lives inside an earlier one
    pub fn compile(t: &ViewTransformation) -> TransformResult<Self> {
        if t.fields.is_empty() {
            return Err(TransformationError::NoFields);
        }
        if let Some(dup) = first_duplicate(&t.fields) {
            return Err(TransformationError::DuplicateField(dup.canonical()));
        }
        if let Some(dup) = first_duplicate(&t.unwind) {
            return Err(TransformationError::AmbiguousUnwind(dup.canonical()));
        }
        if let Some(dup) = first_duplicate(&t.flatten) {
            return Err(TransformationError::DuplicateFlatten(dup.canonical()));
        }
        if let Some(both) = t.unwind.iter().find(|p| t.flatten.contains(p)) {
            return Err(TransformationError::UnwindFlattenConflict(both.canonical()));
        }
        for (i, outer) in t.unwind.iter().enumerate() {
            if let Some(inner) = t.unwind[i + 1..].iter().find(|inner| outer.is_prefix_of(inner)) {
                return Err(TransformationError::CyclicUnwind {
                    outer: outer.canonical(),
                    inner: inner.canonical(),
                });
            }
        }

        Ok(Self {
            unwind: t.unwind.clone(),
            flatten: t.flatten.clone(),
            fields: t.fields.clone(),
            omit: t.omit.clone(),
            limit: t.limit,
            desc: t.desc,
        })
    }

    /// Output columns: selected fields minus omitted ones, in order.
    pub fn columns(&self) -> Vec<FieldPath> {
        self.fields
            .iter()
            .filter(|field| !self.omit.contains(field))
            .cloned()
            .collect()
    }

    /// Output columns after request-time column hiding.
    pub fn columns_for(&self, query: &ViewQuery) -> Vec<FieldPath> {
        let mut columns = self.columns();
        if query.hides_columns() {
            columns.retain(|column| !is_hidden(column));
        }
        columns
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn desc(&self) -> bool {
        self.desc
    }

    /// Runs the plan with the view's own ordering and limit.
    pub fn run(&self, records: &[Value]) -> Vec<Row> {
        self.run_page(records, &ViewQuery::default()).rows
    }

    /// Runs the plan with request overrides.
    pub fn run_page(&self, records: &[Value], query: &ViewQuery) -> Page {
        let desc = query.desc.unwrap_or(self.desc);
        let limit = query.limit.or(self.limit);

        // one group per source record, so ordering follows write order even
        // when unwind expands a record into several rows
        let mut groups: Vec<Vec<Row>> = records
            .iter()
            .map(|record| self.rows_for(record, query))
            .collect();
        if desc {
            groups.reverse();
        }

        let rows: Vec<Row> = groups.into_iter().flatten().collect();
        let total = rows.len();

        let rows = rows
            .into_iter()
            .skip(query.offset)
            .take(limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX)))
            .collect();

        Page {
            rows,
            total,
            offset: query.offset,
            limit,
        }
    }

    fn rows_for(&self, record: &Value, query: &ViewQuery) -> Vec<Row> {
        // stored items are objects; anything else projects as all-absent
        let base = record.as_object().cloned().unwrap_or_default();

        let mut expanded = vec![base];
        for path in &self.unwind {
            expanded = expanded
                .into_iter()
                .flat_map(|record| unwind(record, path))
                .collect();
        }

        expanded
            .into_iter()
            .map(|mut record| {
                for path in &self.flatten {
                    flatten(&mut record, path);
                }
                self.project(&record, query)
            })
            .filter(|row| !(query.clean && row.is_blank()))
            .collect()
    }

    fn project(&self, record: &Map<String, Value>, query: &ViewQuery) -> Row {
        let mut row = Row::select(record, &self.fields);
        row.omit(&self.omit);
        if query.hides_columns() {
            row.retain_columns(|column| !is_hidden(column));
        }
        row
    }
}

/// Applies `t` to `records`.
pub fn transform(records: &[Value], t: &ViewTransformation) -> TransformResult<Vec<Row>> {
    Ok(TransformPlan::compile(t)?.run(records))
}

fn is_hidden(column: &FieldPath) -> bool {
    column.head().starts_with('#')
}

fn first_duplicate(paths: &[FieldPath]) -> Option<&FieldPath> {
    paths
        .iter()
        .enumerate()
        .find(|(i, path)| paths[..*i].contains(*path))
        .map(|(_, path)| path)
}
