//! Execution events.

use crate::agent::entities::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Caller id used for invocations made by the orchestrator itself.
pub const ORCHESTRATOR_ID: &str = "orchestrator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Start,
    End,
    Error,
    /// One per orchestration call, after the result is built
    Query,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Start => "start",
            EventType::End => "end",
            EventType::Error => "error",
            EventType::Query => "query",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one invocation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub agent_id: AgentId,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ExecutionEvent {
    pub fn new(agent_id: impl Into<AgentId>, event_type: EventType) -> Self {
        Self {
            agent_id: agent_id.into(),
            event_type,
            timestamp: Utc::now(),
            metadata: Map::new(),
        }
    }

    pub fn start(agent_id: impl Into<AgentId>, caller: &str) -> Self {
        Self::new(agent_id, EventType::Start).with("caller", caller)
    }

    pub fn end(agent_id: impl Into<AgentId>, duration_ms: u64) -> Self {
        Self::new(agent_id, EventType::End).with("duration_ms", duration_ms)
    }

    pub fn error(
        agent_id: impl Into<AgentId>,
        duration_ms: u64,
        code: &str,
        message: &str,
    ) -> Self {
        Self::new(agent_id, EventType::Error)
            .with("duration_ms", duration_ms)
            .with("code", code)
            .with("message", message)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn caller(&self) -> Option<&str> {
        self.metadata.get("caller").and_then(Value::as_str)
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.metadata.get("duration_ms").and_then(Value::as_u64)
    }

    /// End and Error events close an invocation
    pub fn is_completion(&self) -> bool {
        matches!(self.event_type, EventType::End | EventType::Error)
    }
}
