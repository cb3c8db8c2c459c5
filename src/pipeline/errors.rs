//! Transformation error types
//!
//! Raised when a view's transformation cannot be resolved unambiguously.
//! Missing fields on individual records are not errors; they project as
//! absent cells.

use thiserror::Error;

use crate::path::PathError;

/// Errors in a view transformation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformationError {
    /// `fields` is empty
    #[error("transformation selects no fields")]
    NoFields,

    /// The same path is selected twice
    #[error("field '{0}' is selected more than once")]
    DuplicateField(String),

    /// The same path is unwound twice
    #[error("unwind target '{0}' is listed more than once")]
    AmbiguousUnwind(String),

    /// The same path is flattened twice
    #[error("flatten target '{0}' is listed more than once")]
    DuplicateFlatten(String),

    /// A path is both unwound and flattened
    #[error("path '{0}' is both unwound and flattened")]
    UnwindFlattenConflict(String),

    /// An unwind target lies inside an earlier unwind target, which no
    /// longer exists once the outer one is promoted
    #[error("unwind target '{inner}' is nested in earlier unwind target '{outer}'")]
    CyclicUnwind { outer: String, inner: String },

    /// A path string could not be parsed
    #[error("invalid field path: {0}")]
    Path(#[from] PathError),
}

impl TransformationError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        "DATASET_TRANSFORMATION_ERROR"
    }
}

/// Result type for transformations
pub type TransformResult<T> = Result<T, TransformationError>;
