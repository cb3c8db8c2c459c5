//! Render error types
//!
//! Render errors are configuration errors: they are detected when a view's
//! display section is loaded, never per record.

use thiserror::Error;

/// Errors in a view's display configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// `display.component` is not `table`
    #[error("unsupported display component '{0}', only 'table' is supported")]
    UnsupportedComponent(String),

    /// `display.properties[..].format` is not a known format
    #[error("unsupported display format '{0}'")]
    UnsupportedFormat(String),

    /// `display.properties` names a field the view does not select
    #[error("display property '{0}' does not match any selected field")]
    UnresolvedProperty(String),
}

impl RenderError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        "DATASET_RENDER_ERROR"
    }
}

/// Result type for render configuration
pub type RenderResult<T> = Result<T, RenderError>;
