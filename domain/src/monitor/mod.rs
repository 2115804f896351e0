//! Monitoring domain
//!
//! [`ExecutionEvent`]s are emitted at every agent invocation boundary.
//! [`AgentStatistics`] is the running tally kept per agent and
//! [`ExecutionGraph`] is derived on demand from retained events.

pub mod event;
pub mod graph;
pub mod statistics;

pub use event::{EventType, ExecutionEvent, ORCHESTRATOR_ID};
pub use graph::{ExecutionGraph, GraphEdge};
pub use statistics::{AgentStatistics, StatisticsSnapshot};
