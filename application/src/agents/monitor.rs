//! Monitor agent - bounded event log, running statistics and event stream.
//!
//! The monitor is the team's [`EventSink`]. Every recorded event is
//! appended to a ring buffer (oldest evicted at capacity), folded into
//! per-agent [`AgentStatistics`], archived through the [`EventLogger`] port
//! and announced to stream subscribers.
//!
//! Read operations (`events`, `get_execution_graph`, `get_agent_statistics`,
//! `get_event_stream`) never mutate state.

use crate::config::MonitorSettings;
use crate::ports::agent::Agent;
use crate::ports::event_logger::{EventLogger, NoEventLogger};
use crate::ports::event_sink::EventSink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use prism_domain::{
    AgentContext, AgentDescriptor, AgentId, AgentInput, AgentResult, AgentRole, AgentStatistics,
    ErrorInfo, EventType, ExecutionEvent, ExecutionGraph, StatisticsSnapshot,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Item yielded by [`MonitorAgent::get_event_stream`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StreamItem {
    Event { seq: u64, event: ExecutionEvent },
    Keepalive { timestamp: DateTime<Utc> },
}

/// Where a new subscriber's cursor starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStart {
    /// Oldest retained event
    Replay,
    /// Only events recorded after subscribing
    Live,
}

/// Statistics across all agents plus the per-agent breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorStatistics {
    pub total_events: u64,
    pub retained_events: usize,
    pub evicted_events: u64,
    pub queries: u64,
    pub queries_by_mode: BTreeMap<String, u64>,
    pub agents: BTreeMap<String, StatisticsSnapshot>,
}

struct MonitorState {
    log: VecDeque<(u64, ExecutionEvent)>,
    next_seq: u64,
    stats: BTreeMap<AgentId, AgentStatistics>,
    queries: u64,
    queries_by_mode: BTreeMap<String, u64>,
}

impl MonitorState {
    fn first_seq(&self) -> u64 {
        self.log.front().map(|(seq, _)| *seq).unwrap_or(self.next_seq)
    }

    fn event_at(&self, seq: u64) -> Option<&ExecutionEvent> {
        let offset = seq.checked_sub(self.first_seq())?;
        self.log.get(usize::try_from(offset).ok()?).map(|(_, e)| e)
    }
}

pub struct MonitorAgent {
    descriptor: AgentDescriptor,
    settings: MonitorSettings,
    state: Mutex<MonitorState>,
    notify: Notify,
    logger: Arc<dyn EventLogger>,
}

impl MonitorAgent {
    pub fn new(settings: MonitorSettings) -> Self {
        Self::with_logger(settings, Arc::new(NoEventLogger))
    }

    pub fn with_logger(settings: MonitorSettings, logger: Arc<dyn EventLogger>) -> Self {
        let capacity = settings.capacity.max(1);
        Self {
            descriptor: AgentDescriptor::for_role(AgentRole::Monitor),
            state: Mutex::new(MonitorState {
                log: VecDeque::with_capacity(capacity),
                next_seq: 0,
                stats: BTreeMap::new(),
                queries: 0,
                queries_by_mode: BTreeMap::new(),
            }),
            settings: MonitorSettings {
                capacity,
                ..settings
            },
            notify: Notify::new(),
            logger,
        }
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.settings.capacity
    }

    /// Retained events, oldest first
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.state().log.iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn agent_events(&self, agent_id: &str) -> Vec<ExecutionEvent> {
        self.state()
            .log
            .iter()
            .filter(|(_, e)| e.agent_id == agent_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Caller → callee graph over the retained log
    pub fn get_execution_graph(&self) -> ExecutionGraph {
        let state = self.state();
        ExecutionGraph::from_events(state.log.iter().map(|(_, e)| e))
    }

    pub fn get_agent_statistics(&self) -> MonitorStatistics {
        let state = self.state();
        let total = state.next_seq;
        MonitorStatistics {
            total_events: total,
            retained_events: state.log.len(),
            evicted_events: total - state.log.len() as u64,
            queries: state.queries,
            queries_by_mode: state.queries_by_mode.clone(),
            agents: state
                .stats
                .iter()
                .map(|(id, s)| (id.to_string(), s.snapshot()))
                .collect(),
        }
    }

    /// Per-subscriber stream of events with keepalives when idle.
    ///
    /// Each stream keeps its own cursor into the shared log; a slow
    /// subscriber whose cursor was evicted skips ahead to the oldest
    /// retained event. The stream never ends.
    pub fn get_event_stream(
        self: &Arc<Self>,
        start: StreamStart,
    ) -> impl Stream<Item = StreamItem> + Send + 'static {
        let cursor = match start {
            StreamStart::Replay => self.state().first_seq(),
            StreamStart::Live => self.state().next_seq,
        };
        futures::stream::unfold(
            (Arc::clone(self), cursor),
            |(monitor, cursor)| async move {
                let (item, next) = monitor.next_item(cursor).await;
                Some((item, (monitor, next)))
            },
        )
    }

    fn poll_log(&self, cursor: u64) -> Option<(u64, ExecutionEvent)> {
        let state = self.state();
        let seq = cursor.max(state.first_seq());
        state.event_at(seq).map(|e| (seq, e.clone()))
    }

    async fn next_item(&self, cursor: u64) -> (StreamItem, u64) {
        loop {
            // Register interest before checking so a record() in between is not missed
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some((seq, event)) = self.poll_log(cursor) {
                return (StreamItem::Event { seq, event }, seq + 1);
            }

            if tokio::time::timeout(self.settings.keepalive, notified)
                .await
                .is_err()
            {
                return (
                    StreamItem::Keepalive {
                        timestamp: Utc::now(),
                    },
                    cursor,
                );
            }
        }
    }

    fn run_command(&self, command: &str, args: &Value) -> AgentResult {
        match command {
            "get_events" => {
                let start = args.get("start").and_then(Value::as_u64).unwrap_or(0) as usize;
                let limit = args
                    .get("limit")
                    .and_then(Value::as_u64)
                    .map(|l| l as usize)
                    .unwrap_or(usize::MAX);
                let events: Vec<ExecutionEvent> =
                    self.events().into_iter().skip(start).take(limit).collect();
                AgentResult::success(json!({ "count": events.len(), "events": events }))
            }
            "get_agent_events" => match args.get("agent_id").and_then(Value::as_str) {
                Some(id) => {
                    let events = self.agent_events(id);
                    AgentResult::success(json!({ "agent_id": id, "events": events }))
                }
                None => AgentResult::error(ErrorInfo::invalid_input(
                    "get_agent_events requires 'agent_id'",
                )),
            },
            "get_statistics" => to_payload(&self.get_agent_statistics()),
            "get_execution_graph" => to_payload(&self.get_execution_graph()),
            other => AgentResult::error(
                ErrorInfo::invalid_input(format!("Unknown monitor command: {}", other))
                    .with_details(json!({
                        "valid_commands": [
                            "get_events",
                            "get_agent_events",
                            "get_statistics",
                            "get_execution_graph",
                        ]
                    })),
            ),
        }
    }
}

fn to_payload<T: Serialize>(value: &T) -> AgentResult {
    match serde_json::to_value(value) {
        Ok(payload) => AgentResult::success(payload),
        Err(e) => AgentResult::error(ErrorInfo::agent_error(e.to_string())),
    }
}

impl EventSink for MonitorAgent {
    fn record(&self, event: ExecutionEvent) {
        self.logger.log(&event);
        {
            let mut state = self.state();
            match event.event_type {
                EventType::Start => state
                    .stats
                    .entry(event.agent_id.clone())
                    .or_insert_with(|| AgentStatistics::new(self.settings.rolling_window))
                    .record_start(),
                EventType::End | EventType::Error => {
                    let success = event.event_type == EventType::End;
                    let latency = event.duration_ms().unwrap_or(0);
                    state
                        .stats
                        .entry(event.agent_id.clone())
                        .or_insert_with(|| AgentStatistics::new(self.settings.rolling_window))
                        .record_completion(success, latency);
                }
                EventType::Query => {
                    state.queries += 1;
                    let mode = event
                        .metadata
                        .get("mode_used")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string();
                    *state.queries_by_mode.entry(mode).or_default() += 1;
                }
            }

            if state.log.len() == self.settings.capacity {
                state.log.pop_front();
            }
            let seq = state.next_seq;
            state.log.push_back((seq, event));
            state.next_seq += 1;
        }
        self.notify.notify_waiters();
    }
}

#[async_trait]
impl Agent for MonitorAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    /// Accepts a command name as text, or `{"command": ..., ...args}`.
    async fn process(&self, input: &AgentInput, _context: &AgentContext) -> AgentResult {
        match input {
            AgentInput::Text(command) => self.run_command(command.trim(), &Value::Null),
            AgentInput::Structured(args) => match args.get("command").and_then(Value::as_str) {
                Some(command) => self.run_command(command, args),
                None => AgentResult::error(ErrorInfo::invalid_input(
                    "monitor input requires a 'command'",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use prism_domain::ORCHESTRATOR_ID;
    use std::time::Duration;

    fn monitor(capacity: usize) -> Arc<MonitorAgent> {
        Arc::new(MonitorAgent::new(MonitorSettings {
            capacity,
            keepalive: Duration::from_millis(20),
            rolling_window: 5,
        }))
    }

    fn invocation(monitor: &MonitorAgent, agent: &str, ok: bool, ms: u64) {
        monitor.record(ExecutionEvent::start(agent, ORCHESTRATOR_ID));
        if ok {
            monitor.record(ExecutionEvent::end(agent, ms));
        } else {
            monitor.record(ExecutionEvent::error(agent, ms, "AGENT_ERROR", "boom"));
        }
    }

    #[tokio::test]
    async fn test_ring_buffer_evicts_oldest() {
        let monitor = monitor(10);
        for i in 0..15u64 {
            monitor.record(ExecutionEvent::new("nlu", EventType::Start).with("i", i));
        }

        let replay: Vec<StreamItem> = monitor
            .get_event_stream(StreamStart::Replay)
            .take(10)
            .collect()
            .await;
        let indices: Vec<u64> = replay
            .iter()
            .filter_map(|item| match item {
                StreamItem::Event { event, .. } => event.metadata["i"].as_u64(),
                StreamItem::Keepalive { .. } => None,
            })
            .collect();
        assert_eq!(indices, (5..15).collect::<Vec<_>>());

        // Nothing beyond the retained window: next item is a keepalive
        let mut stream = Box::pin(monitor.get_event_stream(StreamStart::Replay).skip(10));
        assert!(matches!(stream.next().await, Some(StreamItem::Keepalive { .. })));

        let stats = monitor.get_agent_statistics();
        assert_eq!(stats.total_events, 15);
        assert_eq!(stats.retained_events, 10);
        assert_eq!(stats.evicted_events, 5);
        // Running totals survive eviction
        assert_eq!(stats.agents["nlu"].invocations, 15);
    }

    #[tokio::test]
    async fn test_live_stream_receives_new_events() {
        let monitor = monitor(100);
        invocation(&monitor, "nlu", true, 3);

        let mut stream = Box::pin(monitor.get_event_stream(StreamStart::Live));
        let producer = Arc::clone(&monitor);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            producer.record(ExecutionEvent::start("execution", ORCHESTRATOR_ID));
        });

        loop {
            match stream.next().await {
                Some(StreamItem::Event { seq, event }) => {
                    assert_eq!(seq, 2);
                    assert_eq!(event.agent_id, "execution");
                    break;
                }
                Some(StreamItem::Keepalive { .. }) => continue,
                None => panic!("stream ended"),
            }
        }
    }

    #[tokio::test]
    async fn test_subscribers_have_independent_cursors() {
        let monitor = monitor(100);
        invocation(&monitor, "nlu", true, 1);

        let mut a = Box::pin(monitor.get_event_stream(StreamStart::Replay));
        let mut b = Box::pin(monitor.get_event_stream(StreamStart::Replay));
        assert!(matches!(a.next().await, Some(StreamItem::Event { seq: 0, .. })));
        assert!(matches!(a.next().await, Some(StreamItem::Event { seq: 1, .. })));
        assert!(matches!(b.next().await, Some(StreamItem::Event { seq: 0, .. })));
    }

    #[tokio::test]
    async fn test_statistics_and_graph() {
        let monitor = monitor(100);
        invocation(&monitor, "nlu", true, 10);
        invocation(&monitor, "sql_generation", true, 30);
        invocation(&monitor, "sql_generation", false, 10);
        monitor.record(ExecutionEvent::start("database", "execution"));
        monitor.record(
            ExecutionEvent::new(ORCHESTRATOR_ID, EventType::Query).with("mode_used", "route"),
        );

        let stats = monitor.get_agent_statistics();
        let sql = &stats.agents["sql_generation"];
        assert_eq!(sql.invocations, 2);
        assert_eq!(sql.errors, 1);
        assert_eq!(sql.avg_latency_ms, 20.0);
        assert_eq!(stats.queries, 1);
        assert_eq!(stats.queries_by_mode["route"], 1);
        assert_eq!(stats.agents["database"].in_flight, 1);

        let graph = monitor.get_execution_graph();
        assert_eq!(graph.edge("orchestrator", "sql_generation").map(|e| e.count), Some(2));
        assert_eq!(graph.edge("execution", "database").map(|e| e.count), Some(1));
    }

    #[tokio::test]
    async fn test_read_operations_do_not_mutate() {
        let monitor = monitor(100);
        invocation(&monitor, "nlu", true, 1);
        let before = monitor.events();
        let _ = monitor.get_execution_graph();
        let _ = monitor.get_agent_statistics();
        let _ = monitor.process(&AgentInput::text("get_statistics"), &AgentContext::new()).await;
        assert_eq!(monitor.events(), before);
    }

    #[tokio::test]
    async fn test_process_commands() {
        let monitor = monitor(100);
        invocation(&monitor, "nlu", true, 1);
        invocation(&monitor, "execution", false, 1);

        let ctx = AgentContext::new();
        let r = monitor
            .process(
                &AgentInput::Structured(json!({
                    "command": "get_agent_events",
                    "agent_id": "execution",
                })),
                &ctx,
            )
            .await;
        assert_eq!(r.payload().unwrap()["events"].as_array().unwrap().len(), 2);

        let r = monitor
            .process(
                &AgentInput::Structured(json!({"command": "get_events", "start": 1, "limit": 2})),
                &ctx,
            )
            .await;
        assert_eq!(r.payload().unwrap()["count"], 2);

        let r = monitor.process(&AgentInput::text("get_execution_graph"), &ctx).await;
        assert!(r.payload().unwrap()["edges"].is_array());

        let r = monitor.process(&AgentInput::text("reboot"), &ctx).await;
        assert!(!r.is_success());
        assert!(r.error_info().unwrap().details.is_some());
    }
}
