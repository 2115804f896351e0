//! Output formatter trait

use prism_application::MonitorStatistics;
use prism_domain::{ExecutionEvent, ExecutionGraph, OrchestrationResult, OutputFormat};

/// Trait for formatting orchestration results and monitor views
pub trait OutputFormatter {
    /// Format one orchestration result
    fn format(&self, result: &OrchestrationResult, format: OutputFormat) -> String;

    /// Format per-agent statistics
    fn format_statistics(&self, stats: &MonitorStatistics) -> String;

    /// Format the caller -> callee graph
    fn format_graph(&self, graph: &ExecutionGraph) -> String;

    /// Format the retained event log
    fn format_events(&self, events: &[ExecutionEvent]) -> String;
}
