//! Team configuration - the immutable settings the agent factory consumes.
//!
//! [`TeamConfig`] is built once at startup (by the infrastructure config
//! loader or by tests) and passed by reference into
//! [`AgentFactory`](crate::factory::AgentFactory). Nothing reads the
//! environment after that.

use prism_domain::{AgentId, ProcessingMode, RouteTable};
use std::time::Duration;

/// Default model for both LLM-backed agents
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Model ids per LLM-backed agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub nlu: String,
    pub sql: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            nlu: DEFAULT_MODEL.to_string(),
            sql: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Collaborate-mode fan-out set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaborateSettings {
    /// Agents dispatched concurrently; merged in registry order
    pub agents: Vec<AgentId>,
    /// Run NLU once before the fan-out and share its output
    pub shared_nlu: bool,
}

impl Default for CollaborateSettings {
    fn default() -> Self {
        Self {
            agents: vec![AgentId::from("sql_generation"), AgentId::from("visualization")],
            shared_nlu: true,
        }
    }
}

/// SQL generation and execution limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSettings {
    /// Row cap used in prompts and fallback SQL
    pub max_rows: usize,
    /// Per-query execution timeout
    pub query_timeout: Duration,
    /// SQL dialect named in prompts
    pub dialect: String,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            max_rows: 100,
            query_timeout: Duration::from_secs(30),
            dialect: "SQLite".to_string(),
        }
    }
}

/// Monitor ring buffer and stream settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Ring buffer capacity; oldest events are evicted beyond it
    pub capacity: usize,
    /// Idle interval before a stream yields a keepalive
    pub keepalive: Duration,
    /// Completions averaged for the rolling latency
    pub rolling_window: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            capacity: 1000,
            keepalive: Duration::from_secs(15),
            rolling_window: 20,
        }
    }
}

/// Everything the factory needs to assemble a team.
#[derive(Debug, Clone, Default)]
pub struct TeamConfig {
    pub default_mode: ProcessingMode,
    pub models: ModelSettings,
    pub routes: RouteTable,
    pub collaborate: CollaborateSettings,
    /// Overall deadline per orchestration call
    pub deadline: Option<Duration>,
    pub execution: ExecutionSettings,
    pub monitor: MonitorSettings,
}

impl TeamConfig {
    // ==================== Builder Methods ====================

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_collaborate(mut self, collaborate: CollaborateSettings) -> Self {
        self.collaborate = collaborate;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_monitor(mut self, monitor: MonitorSettings) -> Self {
        self.monitor = monitor;
        self
    }
}
