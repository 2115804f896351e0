//! Port for archiving execution events.
//!
//! Separate from `tracing`-based diagnostics: tracing carries human-readable
//! operation logs, while this port writes each [`ExecutionEvent`] as a
//! machine-readable record (e.g. one JSONL line).

use prism_domain::ExecutionEvent;

/// Archive for execution events.
///
/// `log` is synchronous and non-fallible; write failures are dropped.
pub trait EventLogger: Send + Sync {
    fn log(&self, event: &ExecutionEvent);
}

/// No-op implementation for tests and when archiving is disabled.
pub struct NoEventLogger;

impl EventLogger for NoEventLogger {
    fn log(&self, _event: &ExecutionEvent) {}
}
