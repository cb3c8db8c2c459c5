//! CLI argument definitions using clap
//!
//! Commands:
//! - dataset-engine validate --config <path> [--input <path>]
//! - dataset-engine view <name> --config <path> [--offset N] [--limit N] [--desc] [--clean] [--skip-hidden]
//! - dataset-engine stats --config <path>
//! - dataset-engine views --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::ViewQuery;

/// Schema-driven validation, statistics and views for append-only datasets
#[derive(Parser, Debug)]
#[command(name = "dataset-engine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a JSON array batch against the dataset schema
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./dataset.json")]
        config: PathBuf,

        /// Batch file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Render a view over the stored items
    View {
        /// View name
        name: String,

        /// Path to configuration file
        #[arg(long, default_value = "./dataset.json")]
        config: PathBuf,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Print field statistics of the stored items
    Stats {
        /// Path to configuration file
        #[arg(long, default_value = "./dataset.json")]
        config: PathBuf,
    },

    /// List the configured views
    Views {
        /// Path to configuration file
        #[arg(long, default_value = "./dataset.json")]
        config: PathBuf,
    },
}

/// Read-path overrides
#[derive(clap::Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Rows to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Maximum rows, overriding the view
    #[arg(long)]
    pub limit: Option<u64>,

    /// Newest records first, overriding the view
    #[arg(long)]
    pub desc: bool,

    /// Drop hidden columns and blank rows
    #[arg(long)]
    pub clean: bool,

    /// Drop columns whose name starts with '#'
    #[arg(long)]
    pub skip_hidden: bool,
}

impl QueryArgs {
    pub fn to_query(&self) -> ViewQuery {
        ViewQuery {
            offset: self.offset,
            limit: self.limit,
            // absent flag keeps the view's own order
            desc: self.desc.then_some(true),
            clean: self.clean,
            skip_hidden: self.skip_hidden,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_view_command() {
        let cli = Cli::try_parse_from([
            "dataset-engine",
            "view",
            "overview",
            "--config",
            "cfg.json",
            "--offset",
            "5",
            "--limit",
            "10",
            "--desc",
            "--skip-hidden",
        ])
        .unwrap();

        match cli.command {
            Command::View { name, config, query } => {
                assert_eq!(name, "overview");
                assert_eq!(config, PathBuf::from("cfg.json"));
                let query = query.to_query();
                assert_eq!(query.offset, 5);
                assert_eq!(query.limit, Some(10));
                assert_eq!(query.desc, Some(true));
                assert!(query.skip_hidden);
                assert!(!query.clean);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_desc_flag_absent_keeps_view_order() {
        assert_eq!(QueryArgs::default().to_query().desc, None);
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["dataset-engine", "stats"]).unwrap();
        match cli.command {
            Command::Stats { config } => assert_eq!(config, PathBuf::from("./dataset.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
