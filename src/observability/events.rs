//! Observable engine events

use std::fmt;

use super::logger::Severity;

/// Events written to the structured log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Dataset schema document loaded and checked
    SchemaLoaded,
    /// Engine config file loaded
    ConfigLoaded,
    /// Write batch validated and persisted
    BatchAccepted,
    /// Write batch rejected (validation or size)
    BatchRejected,
    /// Statistics committed together with a batch
    StatsCommitted,
    /// View query answered
    ViewRendered,
    /// View query failed
    ViewFailed,
    /// Record store reported a failure
    StoreFailed,
}

impl Event {
    pub const ALL: [Event; 8] = [
        Event::SchemaLoaded,
        Event::ConfigLoaded,
        Event::BatchAccepted,
        Event::BatchRejected,
        Event::StatsCommitted,
        Event::ViewRendered,
        Event::ViewFailed,
        Event::StoreFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::BatchAccepted => "BATCH_ACCEPTED",
            Event::BatchRejected => "BATCH_REJECTED",
            Event::StatsCommitted => "STATS_COMMITTED",
            Event::ViewRendered => "VIEW_RENDERED",
            Event::ViewFailed => "VIEW_FAILED",
            Event::StoreFailed => "STORE_FAILED",
        }
    }

    /// Severity used when the caller does not pick one.
    pub fn severity(&self) -> Severity {
        match self {
            Event::StatsCommitted => Severity::Trace,
            Event::BatchRejected | Event::ViewFailed => Severity::Warn,
            Event::StoreFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
