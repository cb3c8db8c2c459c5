//! Three-state field values
//!
//! JSON alone cannot tell "the key is missing" apart from "the key holds
//! null" once a value leaves its record. Every component that reads a field
//! out of a record goes through [`FieldValue`] so the distinction survives
//! projection, statistics and rendering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::FieldPath;

/// A field read out of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    /// The key is present with a non-null value
    Present(Value),
    /// The key is present and holds `null`
    Null,
    /// The key does not exist on the record
    #[serde(rename = "undefined")]
    Absent,
}

impl FieldValue {
    /// Reads `path` out of `record`.
    pub fn read(record: &Map<String, Value>, path: &FieldPath) -> Self {
        Self::from_option(path.resolve(record))
    }

    /// Converts an optional JSON value.
    pub fn from_option(value: Option<&Value>) -> Self {
        match value {
            None => FieldValue::Absent,
            Some(Value::Null) => FieldValue::Null,
            Some(v) => FieldValue::Present(v.clone()),
        }
    }

    /// Returns the present value, if any.
    pub fn as_present(&self) -> Option<&Value> {
        match self {
            FieldValue::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// True for absent, null, empty string, empty array and empty object.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Absent | FieldValue::Null => true,
            FieldValue::Present(Value::String(s)) => s.is_empty(),
            FieldValue::Present(Value::Array(a)) => a.is_empty(),
            FieldValue::Present(Value::Object(o)) => o.is_empty(),
            FieldValue::Present(_) => false,
        }
    }

    /// Converts back to JSON, collapsing `Absent` into `None`.
    pub fn into_json(self) -> Option<Value> {
        match self {
            FieldValue::Present(v) => Some(v),
            FieldValue::Null => Some(Value::Null),
            FieldValue::Absent => None,
        }
    }
}

/// JSON type name as used in schema `type` keywords.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
