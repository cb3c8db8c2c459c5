//! Configuration errors raised while loading a dataset schema
//!
//! Every variant is fatal at load time: a dataset with a malformed schema or
//! view document never becomes usable.

use thiserror::Error;

use crate::path::PathError;
use crate::pipeline::TransformationError;
use crate::render::RenderError;

/// Draft-07 meta-schema identifier accepted in `fields.$schema`.
pub const DRAFT_07_ID: &str = "http://json-schema.org/draft-07/schema#";

/// Errors in the dataset schema document or its views.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// The document could not be read
    #[error("failed to read schema '{path}': {reason}")]
    Io { path: String, reason: String },

    /// The document is not valid JSON
    #[error("schema document is not valid JSON: {0}")]
    InvalidJson(String),

    /// The document has the wrong top-level shape
    #[error("invalid schema document: {0}")]
    InvalidDocument(String),

    /// `actorSpecification` is not 1
    #[error("unsupported actorSpecification {0}, expected 1")]
    UnsupportedActorSpecification(i64),

    /// `fields` describes something other than a single object item
    #[error("'fields' must describe an object item, found {0}")]
    FieldsNotObject(String),

    /// `fields.$schema` names a draft other than draft-07
    #[error("unsupported $schema '{0}', expected '{}'", DRAFT_07_ID)]
    UnsupportedDraft(String),

    /// A schema keyword has an invalid value
    #[error("invalid schema keyword at '{path}': {reason}")]
    InvalidKeyword { path: String, reason: String },

    /// A `$ref` cannot be resolved locally
    #[error("unresolved $ref '{0}'")]
    UnresolvedReference(String),

    /// A `$ref` cycle re-enters a schema without descending into the instance
    #[error("cyclic $ref '{0}' never reaches a validating schema")]
    CyclicReference(String),

    /// A view name is empty or otherwise unusable
    #[error("invalid view name '{0}'")]
    InvalidViewName(String),

    /// A view's transformation is inconsistent
    #[error("view '{view}': {source}")]
    Transformation {
        view: String,
        #[source]
        source: TransformationError,
    },

    /// A view's display section is unsupported
    #[error("view '{view}': {source}")]
    Render {
        view: String,
        #[source]
        source: RenderError,
    },

    /// A path string could not be parsed
    #[error("invalid field path: {0}")]
    Path(#[from] PathError),
}

impl ConfigurationError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigurationError::Transformation { .. } => "DATASET_TRANSFORMATION_ERROR",
            ConfigurationError::Render { .. } => "DATASET_RENDER_ERROR",
            _ => "DATASET_CONFIGURATION_ERROR",
        }
    }

    pub(crate) fn keyword(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidKeyword {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for schema loading
pub type ConfigResult<T> = Result<T, ConfigurationError>;
