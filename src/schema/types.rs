//! Dataset schema document types
//!
//! These mirror the JSON document a dataset is configured with:
//!
//! ```json
//! {
//!   "actorSpecification": 1,
//!   "fields": { "$schema": "http://json-schema.org/draft-07/schema#", "type": "object", ... },
//!   "views": {
//!     "overview": {
//!       "title": "Overview",
//!       "transformation": { "fields": ["name", "price"], "limit": 50, "desc": true },
//!       "display": { "component": "table", "properties": { "price": { "format": "number" } } }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::FieldPath;
use crate::render::{DisplayComponent, DisplayFormat};

/// Top-level dataset schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSchema {
    /// Document format version, must be 1
    pub actor_specification: i64,
    /// Optional dataset title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional dataset description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Structural JSON schema of a single item; absent disables validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,
    /// Named views
    pub views: BTreeMap<String, DatasetView>,
}

/// A named transformation plus display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetView {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub transformation: ViewTransformation,
    pub display: ViewDisplay,
}

/// Read-side projection of stored records.
///
/// `fields` is both the projection and the column order. Paths used by
/// `flatten`, `omit` and display properties are post-flatten dotted names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewTransformation {
    pub fields: Vec<FieldPath>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unwind: Vec<FieldPath>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flatten: Vec<FieldPath>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit: Vec<FieldPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default)]
    pub desc: bool,
}

impl ViewTransformation {
    /// Creates a transformation selecting `fields` in order.
    pub fn select<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = FieldPath>,
    {
        Self {
            fields: fields.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// Presentation metadata of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDisplay {
    pub component: DisplayComponent,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<FieldPath, ViewDisplayProperty>,
}

impl ViewDisplay {
    /// A table with no per-column metadata.
    pub fn table() -> Self {
        Self {
            component: DisplayComponent::Table,
            properties: BTreeMap::new(),
        }
    }

    pub fn property(&self, path: &FieldPath) -> Option<&ViewDisplayProperty> {
        self.properties.get(path)
    }
}

/// Per-column label and format hint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewDisplayProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<DisplayFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_view_document_parses() {
        let view: DatasetView = serde_json::from_value(json!({
            "title": "Overview",
            "transformation": {
                "fields": ["name", "foo.bar"],
                "flatten": ["foo"],
                "limit": 10,
                "desc": true
            },
            "display": {
                "component": "table",
                "properties": {
                    "foo.bar": { "label": "Bar", "format": "link" }
                }
            }
        }))
        .unwrap();

        assert_eq!(view.transformation.fields.len(), 2);
        assert_eq!(view.transformation.limit, Some(10));
        assert!(view.transformation.desc);
        let prop = view
            .display
            .property(&FieldPath::parse("foo.bar").unwrap())
            .unwrap();
        assert_eq!(prop.label.as_deref(), Some("Bar"));
        assert_eq!(prop.format, Some(DisplayFormat::Link));
    }

    #[test]
    fn test_negative_limit_rejected() {
        let result = serde_json::from_value::<ViewTransformation>(json!({
            "fields": ["a"],
            "limit": -1
        }));
        assert!(result.is_err());
    }
}
