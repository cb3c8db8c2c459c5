//! CLI module
//!
//! Provides command-line access to:
//! - validate: check a write batch against the schema
//! - view: render a view over stored items
//! - stats: field statistics of stored items
//! - views: list configured views

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, QueryArgs};
pub use commands::{run, run_command, stats, validate, view, views, EngineConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_batch, read_items, write_error, write_response};
