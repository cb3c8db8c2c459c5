//! Dataset schema subsystem
//!
//! A dataset is configured by one schema document: the structural JSON
//! schema of a single item (`fields`) plus named views. The document is
//! loaded and checked once, then never changes.
//!
//! # Design Principles
//!
//! - Fail at load, never per record
//! - `fields` is compiled once into a typed node tree
//! - Absent `fields` disables validation, nothing else
//! - Views are checked against the pipeline and renderer before use

mod errors;
mod loader;
mod node;
mod types;

pub use errors::{ConfigResult, ConfigurationError, DRAFT_07_ID};
pub use loader::{SchemaStore, ViewDefinition, ACTOR_SPECIFICATION};
pub use node::{
    escape_pointer, is_integer, Additional, ArrayRules, CompiledSchema, Items, NumberRules,
    ObjectRules, RefTarget, SchemaNode, StringRules, TypeNode, TypeUnion, TypedNode,
};
pub use types::{DatasetSchema, DatasetView, ViewDisplay, ViewDisplayProperty, ViewTransformation};
