//! Dataset facade
//!
//! Write path: size check → validate → stage stats → commit records and
//! stats together → swap in staged stats.
//!
//! Read path: look up view → read records → transform → render.
//!
//! Writes are serialized by the stats lock, which is held from staging
//! until the staged copy is swapped in. Reads never take it.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::errors::{QueryError, QueryResult, StoreError, WriteError, WriteResult};
use super::response::ViewResponse;
use super::store::RecordStore;
use crate::observability::{Event, Logger, MetricsRegistry, MetricsSnapshot};
use crate::pipeline::ViewQuery;
use crate::render::ViewRenderer;
use crate::schema::{SchemaStore, ViewDefinition};
use crate::stats::{StatsAggregator, StatsSnapshot};
use crate::validator::BatchValidator;

/// Default cap on the number of items in one write batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10_000;

/// Tunables of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOptions {
    /// Largest accepted batch
    pub max_batch_size: usize,
    /// Row limit used when neither the view nor the request sets one
    pub default_view_limit: Option<u64>,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            default_view_limit: None,
        }
    }
}

/// A configured dataset: schema, store, statistics and counters.
pub struct Dataset {
    schema: SchemaStore,
    store: Arc<dyn RecordStore>,
    stats: Mutex<StatsAggregator>,
    metrics: MetricsRegistry,
    options: DatasetOptions,
}

impl Dataset {
    /// Opens a dataset over `store`, rebuilding statistics from the records
    /// it already holds.
    pub fn open(schema: SchemaStore, store: Arc<dyn RecordStore>) -> Result<Self, StoreError> {
        Self::with_options(schema, store, DatasetOptions::default())
    }

    pub fn with_options(
        schema: SchemaStore,
        store: Arc<dyn RecordStore>,
        options: DatasetOptions,
    ) -> Result<Self, StoreError> {
        let mut stats = StatsAggregator::new(schema.declared_paths());
        let existing = store.records()?;
        if !existing.is_empty() {
            stats.rebuild(&existing);
        }

        Ok(Self {
            schema,
            store,
            stats: Mutex::new(stats),
            metrics: MetricsRegistry::new(),
            options,
        })
    }

    pub fn schema(&self) -> &SchemaStore {
        &self.schema
    }

    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Validates and persists a batch as a unit.
    ///
    /// # Errors
    ///
    /// - `BatchTooLarge` before any validation
    /// - `Validation` listing every failing item
    /// - `Store` if the store fails; statistics are then unchanged
    pub fn push_items(&self, batch: &[Value]) -> WriteResult<()> {
        let batch_id = Uuid::new_v4().to_string();
        let size = batch.len().to_string();

        if batch.len() > self.options.max_batch_size {
            self.metrics.record_rejected(batch.len());
            Logger::event(
                Event::BatchRejected,
                &[
                    ("batch_id", batch_id.as_str()),
                    ("items", size.as_str()),
                    ("reason", "batch too large"),
                ],
            );
            return Err(WriteError::BatchTooLarge {
                size: batch.len(),
                max: self.options.max_batch_size,
            });
        }

        if let Err(e) = BatchValidator::new(&self.schema).validate(batch) {
            self.metrics.record_rejected(batch.len());
            let positions = e
                .positions()
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(",");
            Logger::event(
                Event::BatchRejected,
                &[
                    ("batch_id", batch_id.as_str()),
                    ("items", size.as_str()),
                    ("positions", positions.as_str()),
                ],
            );
            return Err(e.into());
        }

        if batch.is_empty() {
            return Ok(());
        }

        let mut stats = self
            .stats
            .lock()
            .map_err(|_| StoreError::Internal("stats lock poisoned".to_string()))?;
        let staged = stats.stage(batch, Utc::now());

        if let Err(e) = self.store.commit(batch, &staged.snapshot()) {
            self.metrics.increment_store_failures();
            Logger::event(
                Event::StoreFailed,
                &[("batch_id", batch_id.as_str()), ("reason", e.to_string().as_str())],
            );
            return Err(e.into());
        }

        *stats = staged;
        let item_count = stats.item_count().to_string();
        drop(stats);

        self.metrics.record_accepted(batch.len());
        Logger::event(
            Event::BatchAccepted,
            &[("batch_id", batch_id.as_str()), ("items", size.as_str())],
        );
        Logger::event(
            Event::StatsCommitted,
            &[("batch_id", batch_id.as_str()), ("item_count", item_count.as_str())],
        );
        Ok(())
    }

    /// Renders a page of the named view over all stored records.
    pub fn query_view(&self, name: &str, query: &ViewQuery) -> QueryResult<ViewResponse> {
        let Some(view) = self.schema.view(name) else {
            self.metrics.increment_views_failed();
            Logger::event(Event::ViewFailed, &[("view", name), ("reason", "unknown view")]);
            return Err(QueryError::UnknownView(name.to_string()));
        };

        let records = match self.store.records() {
            Ok(records) => records,
            Err(e) => {
                self.metrics.increment_views_failed();
                self.metrics.increment_store_failures();
                let reason = e.to_string();
                Logger::event(Event::ViewFailed, &[("view", name), ("reason", reason.as_str())]);
                return Err(e.into());
            }
        };

        let mut query = query.clone();
        if query.limit.is_none() && view.plan().limit().is_none() {
            query.limit = self.options.default_view_limit;
        }

        let response = render_view(view, &records, &query);
        self.metrics.increment_views_rendered();
        Logger::event(
            Event::ViewRendered,
            &[
                ("view", name),
                ("rows", response.table.row_count().to_string().as_str()),
                ("total", response.total.to_string().as_str()),
            ],
        );
        Ok(response)
    }

    /// Current statistics.
    pub fn stats_snapshot(&self) -> Result<StatsSnapshot, StoreError> {
        let stats = self
            .stats
            .lock()
            .map_err(|_| StoreError::Internal("stats lock poisoned".to_string()))?;
        Ok(stats.snapshot())
    }

    /// Recomputes statistics from every stored record.
    pub fn rebuild_stats(&self) -> Result<StatsSnapshot, StoreError> {
        let mut stats = self
            .stats
            .lock()
            .map_err(|_| StoreError::Internal("stats lock poisoned".to_string()))?;
        let records = self.store.records()?;
        stats.rebuild(&records);
        Ok(stats.snapshot())
    }
}

/// Transforms and renders `records` for `view`. Pure.
pub fn render_view(view: &ViewDefinition, records: &[Value], query: &ViewQuery) -> ViewResponse {
    let page = view.plan().run_page(records, query);
    let columns = view.plan().columns_for(query);
    let table = ViewRenderer::render(&page.rows, view.display(), &columns);

    ViewResponse {
        view: view.name().to_string(),
        title: view.title().to_string(),
        description: view.description().map(str::to_string),
        table,
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }
}
