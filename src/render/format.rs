//! Display component and format enumerations
//!
//! Both are closed sets parsed from strings at configuration load. A new
//! format is added here and in the renderer's dispatch, nowhere else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::RenderError;

/// Presentation component of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisplayComponent {
    Table,
}

impl DisplayComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayComponent::Table => "table",
        }
    }
}

impl FromStr for DisplayComponent {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(DisplayComponent::Table),
            other => Err(RenderError::UnsupportedComponent(other.to_string())),
        }
    }
}

impl TryFrom<String> for DisplayComponent {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplayComponent> for String {
    fn from(value: DisplayComponent) -> Self {
        value.as_str().to_string()
    }
}

/// Rendering hint for a column. Never changes the cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisplayFormat {
    Text,
    Number,
    Date,
    Link,
    Boolean,
    Image,
    Array,
    Object,
}

impl DisplayFormat {
    pub const ALL: [DisplayFormat; 8] = [
        DisplayFormat::Text,
        DisplayFormat::Number,
        DisplayFormat::Date,
        DisplayFormat::Link,
        DisplayFormat::Boolean,
        DisplayFormat::Image,
        DisplayFormat::Array,
        DisplayFormat::Object,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayFormat::Text => "text",
            DisplayFormat::Number => "number",
            DisplayFormat::Date => "date",
            DisplayFormat::Link => "link",
            DisplayFormat::Boolean => "boolean",
            DisplayFormat::Image => "image",
            DisplayFormat::Array => "array",
            DisplayFormat::Object => "object",
        }
    }

    /// Default format for a value when the view gives none.
    ///
    /// Only composite values get a composite format; numbers, dates and
    /// booleans are not auto-detected.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Array(_) => DisplayFormat::Array,
            Value::Object(_) => DisplayFormat::Object,
            _ => DisplayFormat::Text,
        }
    }
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayFormat::ALL
            .iter()
            .copied()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| RenderError::UnsupportedFormat(s.to_string()))
    }
}

impl TryFrom<String> for DisplayFormat {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplayFormat> for String {
    fn from(value: DisplayFormat) -> Self {
        value.as_str().to_string()
    }
}
