//! Dataset error types

use thiserror::Error;

use crate::validator::SchemaValidationError;

/// Failures reported by a record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store refused or could not complete the operation
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// Internal state of the store is unusable
    #[error("record store internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        "DATASET_STORE_ERROR"
    }
}

/// Errors on the write path. Any error means nothing was persisted and
/// statistics did not change.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The batch exceeds the configured maximum size
    #[error("batch of {size} items exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// At least one item violates the schema
    #[error(transparent)]
    Validation(#[from] SchemaValidationError),

    /// Persisting the batch failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WriteError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            WriteError::BatchTooLarge { .. } => "DATASET_BATCH_TOO_LARGE",
            WriteError::Validation(e) => e.code(),
            WriteError::Store(e) => e.code(),
        }
    }
}

/// Errors on the read path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No view with this name is configured
    #[error("unknown view '{0}'")]
    UnknownView(String),

    /// Reading stored records failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnknownView(_) => "DATASET_UNKNOWN_VIEW",
            QueryError::Store(e) => e.code(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type WriteResult<T> = Result<T, WriteError>;
pub type QueryResult<T> = Result<T, QueryError>;
