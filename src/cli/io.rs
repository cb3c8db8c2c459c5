//! JSON I/O handling for CLI
//!
//! - Input: a JSON array batch, or stored items as a JSON array or JSON lines
//! - Output: a single JSON object on stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Reads a batch (a JSON array) from `path`, or from stdin when `None`.
pub fn read_batch(path: Option<&Path>) -> CliResult<Vec<Value>> {
    let text = match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| CliError::io_error(format!("failed to read {}: {}", path.display(), e)))?,
        None => {
            let mut text = String::new();
            io::stdin().lock().read_to_string(&mut text)?;
            text
        }
    };

    if text.trim().is_empty() {
        return Err(CliError::invalid_input("empty input"));
    }
    match serde_json::from_str::<Value>(&text)? {
        Value::Array(items) => Ok(items),
        other => Err(CliError::invalid_input(format!(
            "batch must be a JSON array, found {}",
            crate::value::json_type_name(&other)
        ))),
    }
}

/// Reads stored items: a JSON array, or one JSON value per line.
pub fn read_items(path: &Path) -> CliResult<Vec<Value>> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("failed to read {}: {}", path.display(), e)))?;
    parse_items(&text)
}

fn parse_items(text: &str) -> CliResult<Vec<Value>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return match serde_json::from_str::<Value>(trimmed)? {
            Value::Array(items) => Ok(items),
            _ => Err(CliError::invalid_input("items file must hold a JSON array")),
        };
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| CliError::invalid_input(format!("line {}: {}", n + 1, e)))
        })
        .collect()
}

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    write_value(&json!({
        "status": "ok",
        "data": data
    }))
}

/// Write a bare `{"status":"ok"}` to stdout
pub fn write_ok() -> CliResult<()> {
    write_value(&json!({ "status": "ok" }))
}

/// Write an error response to stdout; a structured payload wins over the
/// generic error object.
pub fn write_error(err: &CliError) -> CliResult<()> {
    match err.payload() {
        Some(payload) => write_value(payload),
        None => write_value(&json!({
            "status": "error",
            "code": err.code_str(),
            "message": err.message()
        })),
    }
}

fn write_value(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_items_array_and_lines() {
        assert_eq!(parse_items("  [{\"a\":1},{\"a\":2}]").unwrap().len(), 2);
        let items = parse_items("{\"a\":1}\n\n{\"a\":2}\n").unwrap();
        assert_eq!(items, vec![json!({"a": 1}), json!({"a": 2})]);
        assert!(parse_items("{\"a\":1}\nnot json").is_err());
    }

    #[test]
    fn test_read_batch_requires_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("batch.json");

        fs::write(&path, "{\"a\": 1}").unwrap();
        let err = read_batch(Some(&path)).unwrap_err();
        assert_eq!(err.code_str(), "DATASET_CLI_INVALID_INPUT");

        fs::write(&path, "[{\"a\": 1}]").unwrap();
        assert_eq!(read_batch(Some(&path)).unwrap(), vec![json!({"a": 1})]);
    }
}
