//! Dataset schema loading
//!
//! A [`SchemaStore`] is built once per dataset configuration and is
//! immutable afterwards. Everything that can be checked without records is
//! checked here:
//! - `actorSpecification` is 1 and `views` is present
//! - `fields` compiles as a draft-07 object schema
//! - each view's transformation is unambiguous
//! - each view's display uses a known component, known formats, and only
//!   properties of selected fields

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use super::errors::{ConfigResult, ConfigurationError};
use super::node::CompiledSchema;
use super::types::{DatasetSchema, DatasetView, ViewDisplay, ViewTransformation};
use crate::path::FieldPath;
use crate::pipeline::TransformPlan;
use crate::render::{DisplayComponent, DisplayFormat, ViewRenderer};

/// The only supported document format version.
pub const ACTOR_SPECIFICATION: i64 = 1;

/// A loaded view with its compiled transformation.
#[derive(Debug, Clone)]
pub struct ViewDefinition {
    name: String,
    view: DatasetView,
    plan: TransformPlan,
}

impl ViewDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.view.title
    }

    pub fn description(&self) -> Option<&str> {
        self.view.description.as_deref()
    }

    pub fn transformation(&self) -> &ViewTransformation {
        &self.view.transformation
    }

    pub fn display(&self) -> &ViewDisplay {
        &self.view.display
    }

    pub fn plan(&self) -> &TransformPlan {
        &self.plan
    }
}

/// An immutable, fully checked dataset schema.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    document: DatasetSchema,
    compiled: Option<CompiledSchema>,
    views: BTreeMap<String, ViewDefinition>,
    declared: Vec<FieldPath>,
}

impl SchemaStore {
    /// Reads and loads a schema document from disk.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parses and loads a schema document from JSON text.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ConfigurationError::InvalidJson(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Loads an already parsed schema document.
    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ConfigurationError::InvalidDocument("document must be an object".into()))?;

        match obj.get("actorSpecification") {
            None => {
                return Err(ConfigurationError::InvalidDocument(
                    "missing 'actorSpecification'".into(),
                ))
            }
            Some(spec) => match spec.as_i64() {
                Some(ACTOR_SPECIFICATION) => {}
                Some(other) => return Err(ConfigurationError::UnsupportedActorSpecification(other)),
                None => {
                    return Err(ConfigurationError::InvalidDocument(format!(
                        "'actorSpecification' must be an integer, found {}",
                        spec
                    )))
                }
            },
        }

        let views = match obj.get("views") {
            Some(Value::Object(views)) => views,
            Some(_) => {
                return Err(ConfigurationError::InvalidDocument("'views' must be an object".into()))
            }
            None => return Err(ConfigurationError::InvalidDocument("missing 'views'".into())),
        };

        // unsupported component/format strings would otherwise surface as
        // opaque serde messages
        for (name, view) in views {
            prescan_display(name, view)?;
        }

        let document: DatasetSchema = serde_json::from_value(value.clone())
            .map_err(|e| ConfigurationError::InvalidDocument(e.to_string()))?;
        Self::from_document(document)
    }

    /// Checks a typed document and builds the store.
    pub fn from_document(document: DatasetSchema) -> ConfigResult<Self> {
        if document.actor_specification != ACTOR_SPECIFICATION {
            return Err(ConfigurationError::UnsupportedActorSpecification(
                document.actor_specification,
            ));
        }

        let compiled = document
            .fields
            .as_ref()
            .map(CompiledSchema::compile)
            .transpose()?;

        let mut views = BTreeMap::new();
        for (name, view) in &document.views {
            if name.trim().is_empty() {
                return Err(ConfigurationError::InvalidViewName(name.clone()));
            }
            let plan = TransformPlan::compile(&view.transformation).map_err(|source| {
                ConfigurationError::Transformation {
                    view: name.clone(),
                    source,
                }
            })?;
            ViewRenderer::check(&view.display, &view.transformation.fields).map_err(|source| {
                ConfigurationError::Render {
                    view: name.clone(),
                    source,
                }
            })?;
            views.insert(
                name.clone(),
                ViewDefinition {
                    name: name.clone(),
                    view: view.clone(),
                    plan,
                },
            );
        }

        let declared = compiled
            .as_ref()
            .map(CompiledSchema::declared_paths)
            .unwrap_or_default();

        Ok(Self {
            document,
            compiled,
            views,
            declared,
        })
    }

    pub fn document(&self) -> &DatasetSchema {
        &self.document
    }

    pub fn title(&self) -> Option<&str> {
        self.document.title.as_deref()
    }

    /// The compiled `fields` schema; `None` disables validation.
    pub fn compiled(&self) -> Option<&CompiledSchema> {
        self.compiled.as_ref()
    }

    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.get(name)
    }

    /// Views in name order.
    pub fn views(&self) -> impl Iterator<Item = &ViewDefinition> {
        self.views.values()
    }

    pub fn view_names(&self) -> Vec<&str> {
        self.views.keys().map(String::as_str).collect()
    }

    /// Field paths declared through nested `properties`, parents first.
    pub fn declared_paths(&self) -> &[FieldPath] {
        &self.declared
    }
}

fn prescan_display(name: &str, view: &Value) -> ConfigResult<()> {
    let render_error = |source| ConfigurationError::Render {
        view: name.to_string(),
        source,
    };
    let Some(display) = view.get("display") else {
        return Ok(());
    };
    if let Some(component) = display.get("component").and_then(Value::as_str) {
        component.parse::<DisplayComponent>().map_err(render_error)?;
    }
    if let Some(properties) = display.get("properties").and_then(Value::as_object) {
        for property in properties.values() {
            if let Some(format) = property.get("format").and_then(Value::as_str) {
                format.parse::<DisplayFormat>().map_err(render_error)?;
            }
        }
    }
    Ok(())
}
