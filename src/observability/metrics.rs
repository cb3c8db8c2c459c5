//! Engine counters
//!
//! Counters only, monotonic, reset on process start. Relaxed atomics are
//! enough: counters are never used to order other memory.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one dataset.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    batches_accepted: AtomicU64,
    batches_rejected: AtomicU64,
    items_accepted: AtomicU64,
    items_rejected: AtomicU64,
    views_rendered: AtomicU64,
    views_failed: AtomicU64,
    store_failures: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted batch of `items` items.
    pub fn record_accepted(&self, items: usize) {
        self.batches_accepted.fetch_add(1, Ordering::Relaxed);
        self.items_accepted.fetch_add(items as u64, Ordering::Relaxed);
    }

    /// Records a rejected batch of `items` items.
    pub fn record_rejected(&self, items: usize) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
        self.items_rejected.fetch_add(items as u64, Ordering::Relaxed);
    }

    pub fn increment_views_rendered(&self) {
        self.views_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_views_failed(&self) {
        self.views_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_accepted: self.batches_accepted.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            items_accepted: self.items_accepted.load(Ordering::Relaxed),
            items_rejected: self.items_rejected.load(Ordering::Relaxed),
            views_rendered: self.views_rendered.load(Ordering::Relaxed),
            views_failed: self.views_failed.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub batches_accepted: u64,
    pub batches_rejected: u64,
    pub items_accepted: u64,
    pub items_rejected: u64,
    pub views_rendered: u64,
    pub views_failed: u64,
    pub store_failures: u64,
}
