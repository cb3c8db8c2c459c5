//! Dataset facade
//!
//! Ties the write path (validation, persistence, statistics), the read
//! path (view transformation and rendering) and monitoring together over a
//! pluggable [`RecordStore`].

#[allow(clippy::module_inception)]
mod dataset;
mod errors;
mod response;
mod store;

pub use dataset::{render_view, Dataset, DatasetOptions, DEFAULT_MAX_BATCH_SIZE};
pub use errors::{QueryError, QueryResult, StoreError, StoreResult, WriteError, WriteResult};
pub use response::ViewResponse;
pub use store::{MemoryRecordStore, RecordStore};
