//! Record store abstraction
//!
//! The engine does not decide how records are kept. A store appends a
//! validated batch together with the statistics that include it, as one
//! unit: either both are kept or neither is.

use std::sync::RwLock;

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use crate::stats::StatsSnapshot;

/// Persistence collaborator of a dataset
pub trait RecordStore: Send + Sync {
    /// Appends `items` and replaces the stored statistics with `stats`.
    ///
    /// On error nothing may be kept.
    fn commit(&self, items: &[Value], stats: &StatsSnapshot) -> StoreResult<()>;

    /// All stored records in write order.
    fn records(&self) -> StoreResult<Vec<Value>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<Value>,
    stats: Option<StatsSnapshot>,
}

/// In-memory store, used by tests and the CLI
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    state: RwLock<MemoryState>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with `records`, as if written earlier.
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                records,
                stats: None,
            }),
        }
    }

    /// Last committed statistics.
    pub fn stats(&self) -> StoreResult<Option<StatsSnapshot>> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))?;
        Ok(state.stats.clone())
    }

    pub fn len(&self) -> StoreResult<usize> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))?;
        Ok(state.records.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl RecordStore for MemoryRecordStore {
    fn commit(&self, items: &[Value], stats: &StatsSnapshot) -> StoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))?;
        state.records.extend_from_slice(items);
        state.stats = Some(stats.clone());
        Ok(())
    }

    fn records(&self) -> StoreResult<Vec<Value>> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))?;
        Ok(state.records.clone())
    }
}
