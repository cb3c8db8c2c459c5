//! Write-path batch validation
//!
//! Validates candidate items against a dataset's compiled `fields` schema
//! with draft-07 semantics. A batch is accepted or rejected as a unit; a
//! rejection lists every failing item with all of its violations.

mod errors;
#[allow(clippy::module_inception)]
mod validator;

pub use errors::{
    ErrorBody, ErrorData, ErrorPayload, SchemaValidationError, SchemaViolation, ValidationError,
    ValidationResult, SCHEMA_VALIDATION_ERROR_MESSAGE, SCHEMA_VALIDATION_ERROR_TYPE,
};
pub use validator::{validate, BatchValidator};
