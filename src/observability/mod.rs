//! Observability subsystem
//!
//! - Structured logging (one JSON line per event)
//! - Typed events
//! - Monotonic counters
//!
//! # Principles
//!
//! 1. Observability is read-only: it never changes a result
//! 2. No async or background threads
//! 3. Deterministic output
//!
//! ```ignore
//! use dataset_engine::observability::{Event, Logger, MetricsRegistry};
//!
//! Logger::event(Event::ViewRendered, &[("view", "overview"), ("rows", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_views_rendered();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
