//! Port for agent invocation telemetry.
//!
//! The orchestrator and agents report [`ExecutionEvent`]s through an
//! [`EventSink`]. Recording is fire-and-forget and never fails the caller.

use prism_domain::ExecutionEvent;

pub trait EventSink: Send + Sync {
    fn record(&self, event: ExecutionEvent);
}

/// Discards every event
pub struct NoEventSink;

impl EventSink for NoEventSink {
    fn record(&self, _event: ExecutionEvent) {}
}
