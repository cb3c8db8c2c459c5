//! Schema validation error types
//!
//! A rejected batch serializes to the write-path failure payload:
//!
//! ```json
//! { "error": { "type": "schema-validation-error", "message": "Schema validation failed",
//!     "data": { "invalidItems": [ { "itemPosition": 1, "validationErrors": [...] } ] } } }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `error.type` of the failure payload
pub const SCHEMA_VALIDATION_ERROR_TYPE: &str = "schema-validation-error";
/// `error.message` of the failure payload
pub const SCHEMA_VALIDATION_ERROR_MESSAGE: &str = "Schema validation failed";

/// A single keyword failure, shaped like a standard JSON-Schema error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaViolation {
    /// JSON pointer into the item (`""` for the item itself)
    pub instance_path: String,
    /// JSON pointer into the schema, rooted at `#`
    pub schema_path: String,
    /// Failing keyword
    pub keyword: String,
    /// Human-readable message
    pub message: String,
    /// Keyword-specific parameters
    pub params: Value,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = if self.instance_path.is_empty() {
            "item"
        } else {
            &self.instance_path
        };
        write!(f, "{} {} ({})", at, self.message, self.schema_path)
    }
}

/// All violations of one item in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Zero-based position of the item in its batch
    pub item_position: usize,
    pub validation_errors: Vec<SchemaViolation>,
}

/// A rejected batch. No item of the batch may be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaValidationError {
    invalid_items: Vec<ValidationError>,
}

impl SchemaValidationError {
    pub fn new(invalid_items: Vec<ValidationError>) -> Self {
        Self { invalid_items }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        "DATASET_SCHEMA_VALIDATION_FAILED"
    }

    /// Failing items, ordered by position.
    pub fn invalid_items(&self) -> &[ValidationError] {
        &self.invalid_items
    }

    /// Positions of the failing items.
    pub fn positions(&self) -> Vec<usize> {
        self.invalid_items.iter().map(|item| item.item_position).collect()
    }

    /// The public failure payload.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: ErrorBody {
                kind: SCHEMA_VALIDATION_ERROR_TYPE.to_string(),
                message: SCHEMA_VALIDATION_ERROR_MESSAGE.to_string(),
                data: ErrorData {
                    invalid_items: self.invalid_items.clone(),
                },
            },
        }
    }
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} invalid item(s)",
            SCHEMA_VALIDATION_ERROR_MESSAGE,
            self.invalid_items.len()
        )?;
        if let Some(first) = self.invalid_items.first() {
            if let Some(violation) = first.validation_errors.first() {
                write!(f, ", first at position {}: {}", first.item_position, violation)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for SchemaValidationError {}

/// Write-path failure payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub data: ErrorData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    pub invalid_items: Vec<ValidationError>,
}

/// Result type for batch validation
pub type ValidationResult<T> = Result<T, SchemaValidationError>;
