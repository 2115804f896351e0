//! Orchestrator - processing-mode state machine over the agent registry.
//!
//! [`Orchestrator::process`] is the single inbound operation. It always
//! returns an [`OrchestrationResult`]: blank queries, missing agents, agent
//! failures, panics and an exceeded deadline all end up as error results
//! carrying whatever `per_agent` outcomes were collected.
//!
//! A per-query mode override is applied through [`ModeGuard`], which
//! restores the prior mode on every exit path. Overrides are not reentrant:
//! serialize overriding calls per orchestrator, or give each session its
//! own orchestrator.

mod dispatch;
mod guard;
mod registry;

pub use guard::ModeGuard;
pub use registry::{AgentRegistry, RegistryError};

use crate::config::{CollaborateSettings, TeamConfig};
use crate::ports::event_sink::{EventSink, NoEventSink};
use dispatch::{Dispatched, Dispatcher, Invoker, Trace, panic_message};
use futures::FutureExt;
use guard::lock_mode;
use prism_domain::util::truncate_str;
use prism_domain::{
    AgentContext, AgentInput, ErrorInfo, EventType, ExecutionEvent, ORCHESTRATOR_ID,
    OrchestrationResult, ProcessingMode, Query, ResultMetadata, RouteTable, keys,
};
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Longest query text copied into the summary event
const SUMMARY_QUERY_BYTES: usize = 200;

pub struct Orchestrator {
    registry: AgentRegistry,
    routes: RouteTable,
    collaborate: CollaborateSettings,
    deadline: Option<Duration>,
    mode: Mutex<ProcessingMode>,
    sink: Arc<dyn EventSink>,
}

impl Orchestrator {
    pub fn new(registry: AgentRegistry) -> Self {
        Self {
            registry,
            routes: RouteTable::default(),
            collaborate: CollaborateSettings::default(),
            deadline: None,
            mode: Mutex::new(ProcessingMode::default()),
            sink: Arc::new(NoEventSink),
        }
    }

    /// Orchestrator configured from `config`, reporting to `sink`
    pub fn from_config(
        registry: AgentRegistry,
        config: &TeamConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self::new(registry)
            .with_mode(config.default_mode)
            .with_routes(config.routes.clone())
            .with_collaborate(config.collaborate.clone())
            .with_deadline(config.deadline)
            .with_sink(sink)
    }

    // ==================== Builder Methods ====================

    pub fn with_mode(self, mode: ProcessingMode) -> Self {
        *lock_mode(&self.mode) = mode;
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

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    // ==================== Accessors ====================

    pub fn mode(&self) -> ProcessingMode {
        *lock_mode(&self.mode)
    }

    /// Switch the active mode. Identity transitions are allowed.
    pub fn set_mode(&self, mode: ProcessingMode) {
        let mut current = lock_mode(&self.mode);
        let previous = *current;
        if previous != mode {
            info!(from = %previous, to = %mode, "Processing mode changed");
        }
        *current = mode;
    }

    /// Parse and switch the active mode; unknown names are `INVALID_MODE`
    pub fn set_mode_str(&self, mode: &str) -> Result<ProcessingMode, ErrorInfo> {
        let parsed: ProcessingMode = mode.parse().map_err(|e| ErrorInfo::from(&e))?;
        self.set_mode(parsed);
        Ok(parsed)
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    // ==================== Processing ====================

    pub async fn process(&self, query: &Query) -> OrchestrationResult {
        let started = Instant::now();
        let _guard = query
            .mode_override()
            .map(|mode| ModeGuard::acquire(&self.mode, mode));
        let mode = self.mode();

        let mut result = if query.is_blank() {
            OrchestrationResult::failure(
                mode,
                ErrorInfo::invalid_input("Query text is empty"),
                Vec::new(),
            )
        } else {
            info!(mode = %mode, "Processing query");
            self.dispatch(mode, query).await
        };
        result.metadata.elapsed_ms = started.elapsed().as_millis() as u64;

        self.emit_summary(query, &result);
        result
    }

    async fn dispatch(&self, mode: ProcessingMode, query: &Query) -> OrchestrationResult {
        let trace = Trace::default();
        let dispatcher = Dispatcher {
            registry: &self.registry,
            routes: &self.routes,
            collaborate: &self.collaborate,
            invoker: Invoker::new(self.sink.clone(), trace.clone()),
        };
        let input = AgentInput::text(query.text());
        let mut context = AgentContext::new().with(keys::QUERY, json!(query.text()));
        if query.explain() {
            context = context.with(keys::EXPLAIN, json!(true));
        }

        let run = AssertUnwindSafe(dispatcher.run(mode, input, context)).catch_unwind();
        let outcome = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, run).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        mode = %mode,
                        deadline_ms = deadline.as_millis() as u64,
                        "Orchestration deadline exceeded"
                    );
                    Ok(Dispatched::failed(
                        ErrorInfo::timeout(deadline.as_millis()),
                        ResultMetadata::default(),
                    ))
                }
            },
            None => run.await,
        };

        let dispatched = outcome.unwrap_or_else(|panic| {
            let message = panic_message(&*panic);
            warn!(mode = %mode, panic = %message, "Dispatch panicked");
            Dispatched::failed(
                ErrorInfo::agent_error(format!("Dispatch panicked: {}", message)),
                ResultMetadata::default(),
            )
        });
        dispatched.into_result(mode, trace.snapshot())
    }

    /// Best-effort summary event; a failing sink never fails the call.
    fn emit_summary(&self, query: &Query, result: &OrchestrationResult) {
        let event = ExecutionEvent::new(ORCHESTRATOR_ID, EventType::Query)
            .with("mode_used", result.mode_used.as_str())
            .with("query_text", truncate_str(query.text(), SUMMARY_QUERY_BYTES))
            .with("status", if result.is_success() { "success" } else { "error" })
            .with("elapsed_ms", result.metadata.elapsed_ms);
        let recorded = std::panic::catch_unwind(AssertUnwindSafe(|| self.sink.record(event)));
        if recorded.is_err() {
            warn!("Event sink panicked while recording query summary");
        }
    }
}
