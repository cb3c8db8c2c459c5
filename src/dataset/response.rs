//! Read-path response

use serde::{Deserialize, Serialize};

use crate::render::TableModel;

/// A rendered page of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub view: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `columns` and `rows`
    #[serde(flatten)]
    pub table: TableModel,
    /// Rows available before offset and limit
    pub total: usize,
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}
