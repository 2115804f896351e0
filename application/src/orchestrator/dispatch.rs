//! Dispatch rules for the three processing modes.
//!
//! Every agent call goes through [`Invoker::invoke`], which reports
//! Start/End/Error events, converts a panicking agent into `AGENT_ERROR`
//! and appends the outcome to the call's [`Trace`].

use super::registry::AgentRegistry;
use crate::config::CollaborateSettings;
use crate::ports::agent::Agent;
use crate::ports::event_sink::EventSink;
use futures::FutureExt;
use futures::future::join_all;
use prism_domain::{
    AgentContext, AgentId, AgentInput, AgentOutcome, AgentResult, AgentRole, ErrorInfo,
    ErrorKind, ExecutionEvent, MergeConflict, ORCHESTRATOR_ID, OrchestrationResult, ProcessingMode,
    ResultMetadata, RouteTable, SCHEMA_CONTEXT_NEED, keys,
};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Coordinate pipeline order. Schema runs only when NLU asks for it.
const PIPELINE: [AgentRole; 5] = [
    AgentRole::Nlu,
    AgentRole::Schema,
    AgentRole::SqlGeneration,
    AgentRole::Execution,
    AgentRole::Visualization,
];

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Per-call outcome log.
///
/// Shared with the deadline wrapper so outcomes collected before a timeout
/// survive it.
#[derive(Clone, Default)]
pub(crate) struct Trace(Arc<Mutex<Vec<AgentOutcome>>>);

impl Trace {
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AgentOutcome>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, outcome: AgentOutcome) {
        self.lock().push(outcome);
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    /// Stable-sorts outcomes from `start` on by `key`
    fn sort_tail_by_key<K: Ord>(&self, start: usize, key: impl FnMut(&AgentOutcome) -> K) {
        let mut outcomes = self.lock();
        if start < outcomes.len() {
            outcomes[start..].sort_by_key(key);
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<AgentOutcome> {
        self.lock().clone()
    }
}

#[derive(Clone)]
pub(crate) struct Invoker {
    sink: Arc<dyn EventSink>,
    trace: Trace,
}

impl Invoker {
    pub(crate) fn new(sink: Arc<dyn EventSink>, trace: Trace) -> Self {
        Self { sink, trace }
    }

    pub(crate) async fn invoke(
        &self,
        agent: &Arc<dyn Agent>,
        input: &AgentInput,
        context: &AgentContext,
    ) -> AgentResult {
        let id = agent.id().clone();
        self.sink
            .record(ExecutionEvent::start(id.clone(), ORCHESTRATOR_ID));
        let started = Instant::now();

        let result = match AssertUnwindSafe(agent.process(input, context))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(&*panic);
                warn!(agent = %id, panic = %message, "Agent panicked");
                AgentResult::error(ErrorInfo::agent_error(format!(
                    "Agent {} panicked: {}",
                    id, message
                )))
            }
        };

        let elapsed = started.elapsed().as_millis() as u64;
        let event = match &result {
            AgentResult::Success { .. } => ExecutionEvent::end(id.clone(), elapsed),
            AgentResult::Error { error } => ExecutionEvent::error(
                id.clone(),
                elapsed,
                error.code.as_str(),
                &error.message,
            ),
        };
        self.sink.record(event);
        debug!(agent = %id, status = result.status_str(), elapsed_ms = elapsed, "Agent finished");

        self.trace.push(AgentOutcome {
            agent_id: id,
            result: result.clone(),
        });
        result
    }

    /// Record an outcome for an agent that could not be invoked
    fn record_unavailable(&self, id: &AgentId) -> ErrorInfo {
        let error = ErrorInfo::agent_unavailable(id);
        self.trace.push(AgentOutcome {
            agent_id: id.clone(),
            result: AgentResult::error(error.clone()),
        });
        error
    }
}

/// Mode-independent result of one dispatch, before `per_agent` is attached.
pub(crate) struct Dispatched {
    result: Result<Value, ErrorInfo>,
    metadata: ResultMetadata,
}

impl Dispatched {
    fn ok(result: Value, metadata: ResultMetadata) -> Self {
        Self {
            result: Ok(result),
            metadata,
        }
    }

    pub(crate) fn failed(error: ErrorInfo, metadata: ResultMetadata) -> Self {
        Self {
            result: Err(error),
            metadata,
        }
    }

    pub(crate) fn into_result(
        self,
        mode: ProcessingMode,
        per_agent: Vec<AgentOutcome>,
    ) -> OrchestrationResult {
        let result = match self.result {
            Ok(value) => OrchestrationResult::success(mode, value, per_agent),
            Err(error) => OrchestrationResult::failure(mode, error, per_agent),
        };
        result.with_metadata(self.metadata)
    }
}

pub(crate) struct Dispatcher<'a> {
    pub(crate) registry: &'a AgentRegistry,
    pub(crate) routes: &'a RouteTable,
    pub(crate) collaborate: &'a CollaborateSettings,
    pub(crate) invoker: Invoker,
}

impl Dispatcher<'_> {
    pub(crate) async fn run(
        &self,
        mode: ProcessingMode,
        input: AgentInput,
        context: AgentContext,
    ) -> Dispatched {
        match mode {
            ProcessingMode::Route => self.route(&input, context).await,
            ProcessingMode::Coordinate => self.coordinate(&input, context).await,
            ProcessingMode::Collaborate => self.collaborate(&input, context).await,
        }
    }

    /// Run NLU and merge its payload into `context`.
    async fn understand(
        &self,
        input: &AgentInput,
        context: &mut AgentContext,
    ) -> Result<(), ErrorInfo> {
        let nlu = match self.registry.by_role(AgentRole::Nlu) {
            Some(agent) => agent,
            None => {
                return Err(self
                    .invoker
                    .record_unavailable(&AgentId::from(AgentRole::Nlu.default_id())));
            }
        };
        match self.invoker.invoke(nlu, input, context).await {
            AgentResult::Success { payload } => {
                context.insert(nlu.descriptor().output_key(), payload);
                Ok(())
            }
            AgentResult::Error { error } => Err(error),
        }
    }

    // ==================== Route ====================

    async fn route(&self, input: &AgentInput, mut context: AgentContext) -> Dispatched {
        let mut metadata = ResultMetadata::default();
        if let Err(error) = self.understand(input, &mut context).await {
            return Dispatched::failed(error, metadata);
        }

        let intent = context.intent().unwrap_or_default();
        let chain = self.routes.resolve(intent);
        info!(intent = %intent, route = %chain, "Routing query");
        metadata.intent = Some(intent);
        metadata.route = chain.agents().to_vec();

        let mut last = Value::Null;
        for id in chain.agents() {
            let Some(agent) = self.registry.get(id.as_str()) else {
                let error = self.invoker.record_unavailable(id);
                return Dispatched::failed(error, metadata);
            };
            match self.invoker.invoke(agent, input, &context).await {
                AgentResult::Success { payload } => {
                    context.insert(agent.descriptor().output_key(), payload.clone());
                    last = payload;
                }
                AgentResult::Error { error } => return Dispatched::failed(error, metadata),
            }
        }
        Dispatched::ok(last, metadata)
    }

    // ==================== Coordinate ====================

    async fn coordinate(&self, input: &AgentInput, mut context: AgentContext) -> Dispatched {
        let mut metadata = ResultMetadata::default();
        let mut stages = Map::new();

        for role in PIPELINE {
            if role == AgentRole::Schema && !needs_schema(&context) {
                debug!("Schema stage skipped; NLU did not request schema");
                continue;
            }
            let Some(agent) = self.registry.by_role(role) else {
                if role == AgentRole::Schema {
                    warn!("Schema requested but no schema agent is registered");
                    continue;
                }
                let error = self
                    .invoker
                    .record_unavailable(&AgentId::from(role.default_id()));
                return Dispatched::failed(error, metadata);
            };

            metadata.route.push(agent.id().clone());
            match self.invoker.invoke(agent, input, &context).await {
                AgentResult::Success { payload } => {
                    let key = agent.descriptor().output_key();
                    context.insert(key, payload.clone());
                    stages.insert(key.to_string(), payload);
                    if role == AgentRole::Nlu {
                        metadata.intent = context.intent();
                    }
                }
                AgentResult::Error { error } => {
                    info!(agent = %agent.id(), code = %error.code, "Pipeline halted");
                    return Dispatched::failed(error, metadata);
                }
            }
        }
        Dispatched::ok(Value::Object(stages), metadata)
    }

    // ==================== Collaborate ====================

    async fn collaborate(&self, input: &AgentInput, mut context: AgentContext) -> Dispatched {
        let mut metadata = ResultMetadata::default();

        if self.collaborate.shared_nlu {
            if self.registry.by_role(AgentRole::Nlu).is_some() {
                match self.understand(input, &mut context).await {
                    Ok(()) => metadata.intent = context.intent(),
                    Err(error) => warn!(
                        code = %error.code,
                        "Shared NLU failed; collaborating without intent"
                    ),
                }
            } else {
                warn!("No NLU agent registered; collaborating without shared intent");
            }
        }

        if self.collaborate.agents.is_empty() {
            return Dispatched::failed(
                ErrorInfo::agent_error("No agents configured for collaborate mode"),
                metadata,
            );
        }

        let mut targets: Vec<(usize, &Arc<dyn Agent>)> = Vec::new();
        let mut failures: Vec<(usize, ErrorInfo)> = Vec::new();
        let mut missing: Vec<&AgentId> = Vec::new();
        for id in &self.collaborate.agents {
            match self
                .registry
                .position(id.as_str())
                .zip(self.registry.get(id.as_str()))
            {
                Some(found) => targets.push(found),
                None if missing.contains(&id) => {}
                None => {
                    missing.push(id);
                    failures.push((usize::MAX, self.invoker.record_unavailable(id)));
                }
            }
        }
        targets.sort_by_key(|(position, _)| *position);
        targets.dedup_by_key(|(position, _)| *position);
        let dispatched = targets.len() + missing.len();
        metadata.route = targets.iter().map(|(_, a)| a.id().clone()).collect();
        info!(agents = targets.len(), "Collaborating");

        let fanout_start = self.invoker.trace.len();
        let results = join_all(
            targets
                .iter()
                .map(|(_, agent)| self.invoker.invoke(agent, input, &context)),
        )
        .await;
        // Completion order is arbitrary; report outcomes in registry order.
        self.invoker.trace.sort_tail_by_key(fanout_start, |o| {
            self.registry
                .position(o.agent_id.as_str())
                .unwrap_or(usize::MAX)
        });

        let mut merged = Map::new();
        let mut owners: BTreeMap<&str, &AgentId> = BTreeMap::new();
        for ((position, agent), result) in targets.iter().zip(results) {
            match result {
                AgentResult::Success { payload } => {
                    let key = agent.descriptor().output_key();
                    if let Some(kept) = owners.get(key) {
                        warn!(key, kept = %kept, dropped = %agent.id(), "Merge conflict");
                        metadata.merge_conflicts.push(MergeConflict {
                            key: key.to_string(),
                            kept: (*kept).clone(),
                            dropped: agent.id().clone(),
                        });
                    } else {
                        owners.insert(key, agent.id());
                        merged.insert(key.to_string(), payload);
                    }
                }
                AgentResult::Error { error } => failures.push((*position, error)),
            }
        }

        if owners.is_empty() {
            failures.sort_by_key(|(position, _)| *position);
            let message = format!("All {} collaborating agents failed", dispatched);
            let mut error = if targets.is_empty() {
                ErrorInfo::new(ErrorKind::AgentUnavailable, message)
            } else {
                ErrorInfo::agent_error(message)
            };
            if let Some((_, first)) = failures.into_iter().next() {
                error = error.with_cause(first);
            }
            return Dispatched::failed(error, metadata);
        }
        Dispatched::ok(Value::Object(merged), metadata)
    }
}

fn needs_schema(context: &AgentContext) -> bool {
    context
        .get(keys::NLU)
        .and_then(|nlu| nlu.get("context_needs"))
        .and_then(Value::as_array)
        .is_some_and(|needs| {
            needs
                .iter()
                .any(|need| need.as_str() == Some(SCHEMA_CONTEXT_NEED))
        })
}
