//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use serde_json::Value;

use crate::dataset::{QueryError, StoreError, WriteError};
use crate::schema::ConfigurationError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Engine config file error
    ConfigError,
    /// I/O error (files, stdin/stdout)
    IoError,
    /// Input is not the expected JSON shape
    InvalidInput,
    /// An engine error, carrying its own code
    Engine(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DATASET_CLI_CONFIG_ERROR",
            Self::IoError => "DATASET_CLI_IO_ERROR",
            Self::InvalidInput => "DATASET_CLI_INVALID_INPUT",
            Self::Engine(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    /// Printed instead of the generic error object
    payload: Option<Value>,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            payload: None,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidInput, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured body to print in place of `{"status":"error",..}`
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_input(format!("JSON error: {}", e))
    }
}

impl From<ConfigurationError> for CliError {
    fn from(e: ConfigurationError) -> Self {
        Self::new(CliErrorCode::Engine(e.code()), e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::new(CliErrorCode::Engine(e.code()), e.to_string())
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        Self::new(CliErrorCode::Engine(e.code()), e.to_string())
    }
}

impl From<WriteError> for CliError {
    fn from(e: WriteError) -> Self {
        let payload = match &e {
            WriteError::Validation(v) => serde_json::to_value(v.to_payload()).ok(),
            _ => None,
        };
        Self {
            code: CliErrorCode::Engine(e.code()),
            message: e.to_string(),
            payload,
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::SchemaValidationError;

    #[test]
    fn test_engine_codes_pass_through() {
        let err = CliError::from(QueryError::UnknownView("x".into()));
        assert_eq!(err.code_str(), "DATASET_UNKNOWN_VIEW");
        assert!(err.payload().is_none());
    }

    #[test]
    fn test_validation_error_carries_payload() {
        let err = CliError::from(WriteError::Validation(SchemaValidationError::new(Vec::new())));
        assert_eq!(err.code_str(), "DATASET_SCHEMA_VALIDATION_FAILED");
        let payload = err.payload().unwrap();
        assert_eq!(payload["error"]["type"], "schema-validation-error");
    }
}
