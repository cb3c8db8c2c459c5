//! dataset-engine - schema-driven validation, statistics and views for
//! append-only datasets
//!
//! - Write path: batches are validated against a draft-07 item schema and
//!   accepted or rejected as a unit; accepted batches update field
//!   statistics together with persistence.
//! - Read path: named views project stored records through a fixed
//!   unwind / flatten / select / omit / order / limit pipeline into a table.

pub mod cli;
pub mod dataset;
pub mod observability;
pub mod path;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod stats;
pub mod validator;
pub mod value;
