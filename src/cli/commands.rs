//! CLI command implementations
//!
//! Each command loads the engine config, loads the dataset schema, opens a
//! dataset over an in-memory store and prints one JSON object.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, DatasetOptions, MemoryRecordStore, DEFAULT_MAX_BATCH_SIZE};
use crate::observability::{Event, Logger, Severity};
use crate::pipeline::ViewQuery;
use crate::schema::SchemaStore;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_batch, read_items, write_ok, write_response};

/// Engine configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Dataset schema document (required)
    pub schema_path: PathBuf,

    /// Stored items for `view` and `stats`, as a JSON array or JSON lines
    #[serde(default)]
    pub items_path: Option<PathBuf>,

    /// Minimum log severity (optional, default "INFO")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Largest accepted write batch (optional, default 10000)
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Row limit when neither view nor request sets one
    #[serde(default)]
    pub default_view_limit: Option<u64>,
}

fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

impl EngineConfig {
    /// Load configuration from file.
    ///
    /// Relative paths in the file are resolved against its directory.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        if let Some(base) = path.parent() {
            config.schema_path = resolve(base, &config.schema_path);
            config.items_path = config.items_path.as_deref().map(|p| resolve(base, p));
        }

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> CliResult<()> {
        self.severity()?;

        if self.max_batch_size == 0 {
            return Err(CliError::config_error("max_batch_size must be > 0"));
        }

        if self.schema_path.as_os_str().is_empty() {
            return Err(CliError::config_error("schema_path must not be empty"));
        }

        Ok(())
    }

    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    pub fn options(&self) -> DatasetOptions {
        DatasetOptions {
            max_batch_size: self.max_batch_size,
            default_view_limit: self.default_view_limit,
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Validate { config, input } => validate(&config, input.as_deref()),
        Command::View {
            name,
            config,
            query,
        } => view(&config, &name, &query.to_query()),
        Command::Stats { config } => stats(&config),
        Command::Views { config } => views(&config),
    }
}

/// Validates a batch. Prints `{"status":"ok"}` or the validation failure
/// payload.
pub fn validate(config_path: &Path, input: Option<&Path>) -> CliResult<()> {
    let (config, schema) = load(config_path)?;
    let batch = read_batch(input)?;

    let dataset = Dataset::with_options(schema, Arc::new(MemoryRecordStore::new()), config.options())?;
    dataset.push_items(&batch)?;
    write_ok()
}

/// Renders one page of a view over the configured items.
pub fn view(config_path: &Path, name: &str, query: &ViewQuery) -> CliResult<()> {
    let dataset = open_with_items(config_path)?;
    let response = dataset.query_view(name, query)?;
    write_response(&response)
}

/// Prints statistics folded over the configured items.
pub fn stats(config_path: &Path) -> CliResult<()> {
    let dataset = open_with_items(config_path)?;
    let snapshot = dataset.stats_snapshot()?;
    write_response(&snapshot)
}

/// Lists configured views.
pub fn views(config_path: &Path) -> CliResult<()> {
    let (_, schema) = load(config_path)?;
    let listing: Vec<ViewSummary> = schema
        .views()
        .map(|view| ViewSummary {
            name: view.name().to_string(),
            title: view.title().to_string(),
            description: view.description().map(str::to_string),
            columns: view.plan().columns().iter().map(|c| c.canonical()).collect(),
        })
        .collect();
    write_response(&listing)
}

#[derive(Debug, Serialize)]
struct ViewSummary {
    name: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    columns: Vec<String>,
}

fn load(config_path: &Path) -> CliResult<(EngineConfig, SchemaStore)> {
    let config = EngineConfig::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    Logger::event(
        Event::ConfigLoaded,
        &[("path", config_path.display().to_string().as_str())],
    );

    let schema = SchemaStore::load_file(&config.schema_path)?;
    Logger::event(
        Event::SchemaLoaded,
        &[
            ("path", config.schema_path.display().to_string().as_str()),
            ("views", schema.view_names().len().to_string().as_str()),
        ],
    );
    Ok((config, schema))
}

fn open_with_items(config_path: &Path) -> CliResult<Dataset> {
    let (config, schema) = load(config_path)?;
    let items = match &config.items_path {
        Some(path) => read_items(path)?,
        None => Vec::new(),
    };
    let store = Arc::new(MemoryRecordStore::with_records(items));
    Ok(Dataset::with_options(schema, store, config.options())?)
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, config: serde_json::Value) -> PathBuf {
        let path = temp_dir.path().join("dataset.json");
        fs::write(&path, config.to_string()).unwrap();
        path
    }

    #[test]
    fn test_config_defaults_and_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({"schema_path": "schema.json"}));

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.log_level, "INFO");
        assert_eq!(config.max_batch_size, 10_000);
        assert_eq!(config.default_view_limit, None);
        assert_eq!(config.schema_path, temp_dir.path().join("schema.json"));
        assert!(config.items_path.is_none());
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let temp_dir = TempDir::new().unwrap();

        let path = write_config(&temp_dir, json!({"schema_path": "s.json", "max_batch_size": 0}));
        assert_eq!(
            EngineConfig::load(&path).unwrap_err().code(),
            &CliErrorCode::ConfigError
        );

        let path = write_config(&temp_dir, json!({"schema_path": "s.json", "log_level": "LOUD"}));
        assert!(EngineConfig::load(&path).is_err());

        let path = write_config(&temp_dir, json!({"items_path": "i.json"}));
        assert!(EngineConfig::load(&path).is_err());
    }

    #[test]
    fn test_missing_schema_file_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({"schema_path": "missing.json"}));
        let err = stats(&path).unwrap_err();
        assert_eq!(err.code_str(), "DATASET_CONFIGURATION_ERROR");
    }
}
