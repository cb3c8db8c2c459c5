//! dataset-engine CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. On failure the error
//! object (or validation payload) is printed to stdout, a one-line summary
//! to stderr, and the process exits non-zero.

use dataset_engine::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(&e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
