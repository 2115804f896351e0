//! Instrumented tool access for agents.

use crate::ports::event_sink::EventSink;
use crate::ports::tool::Tool;
use prism_domain::{AgentId, ExecutionEvent, ToolResponse};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A tool bound to its calling agent.
///
/// Each call is reported as Start/End/Error events with the agent as
/// caller, so the execution graph shows `agent -> tool` edges.
#[derive(Clone)]
pub struct ToolClient {
    tool: Arc<dyn Tool>,
    sink: Arc<dyn EventSink>,
    caller: AgentId,
}

impl ToolClient {
    pub fn new(tool: Arc<dyn Tool>, sink: Arc<dyn EventSink>, caller: AgentId) -> Self {
        Self { tool, sink, caller }
    }

    pub fn name(&self) -> &str {
        self.tool.name()
    }

    pub async fn run(&self, action: &str, params: Map<String, Value>) -> ToolResponse {
        let tool = self.tool.name().to_string();
        self.sink.record(
            ExecutionEvent::start(tool.as_str(), self.caller.as_str()).with("action", action),
        );
        let started = Instant::now();

        let response = self.tool.run(action, &params).await;

        let elapsed = started.elapsed().as_millis() as u64;
        debug!(
            tool = %tool,
            action,
            status = ?response.status,
            elapsed_ms = elapsed,
            "Tool call finished"
        );
        let event = if response.is_success() {
            ExecutionEvent::end(tool.as_str(), elapsed)
        } else {
            ExecutionEvent::error(
                tool.as_str(),
                elapsed,
                "TOOL_ERROR",
                response.message().unwrap_or("tool call failed"),
            )
        };
        self.sink.record(event.with("action", action));
        response
    }
}
