//! Test doubles shared by agent and orchestrator tests.

use crate::ports::agent::Agent;
use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use crate::ports::tool::Tool;
use async_trait::async_trait;
use prism_domain::{AgentContext, AgentDescriptor, AgentInput, AgentResult, ToolResponse};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Gateway returning canned text, optionally per model
pub struct StubGateway {
    default: Result<String, GatewayError>,
    by_model: HashMap<String, String>,
    /// Served in order before any other reply
    queued: Mutex<VecDeque<String>>,
    calls: Arc<AtomicUsize>,
}

impl StubGateway {
    pub fn replying(text: &str) -> Self {
        Self {
            default: Ok(text.to_string()),
            by_model: HashMap::new(),
            queued: Mutex::new(VecDeque::new()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            default: Err(GatewayError::ConnectionError("stub offline".to_string())),
            by_model: HashMap::new(),
            queued: Mutex::new(VecDeque::new()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every call as if no model were configured
    pub fn unavailable(mut self) -> Self {
        self.default = Err(GatewayError::ModelNotAvailable("stub".to_string()));
        self
    }

    /// Answer the next calls with `replies`, one each, then fall back
    pub fn with_replies(self, replies: &[&str]) -> Self {
        self.queued
            .lock()
            .unwrap()
            .extend(replies.iter().map(|r| r.to_string()));
        self
    }

    pub fn with_model_reply(mut self, model: &str, text: &str) -> Self {
        self.by_model.insert(model.to_string(), text.to_string());
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

struct StubSession {
    model: String,
    reply: Result<String, GatewayError>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LlmSession for StubSession {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, _content: &str) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

#[async_trait]
impl LlmGateway for StubGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &str,
        _system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        let queued = self.queued.lock().unwrap().pop_front();
        let reply = match (queued, self.by_model.get(model)) {
            (Some(text), _) => Ok(text),
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => self.default.clone(),
        };
        Ok(Box::new(StubSession {
            model: model.to_string(),
            reply,
            calls: self.calls.clone(),
        }))
    }

    async fn available_models(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self.by_model.keys().cloned().collect())
    }
}

/// Tool answering from a per-action table and recording every call
pub struct StubTool {
    name: String,
    responses: HashMap<String, ToolResponse>,
    calls: Arc<Mutex<Vec<String>>>,
    params: Arc<Mutex<Vec<Map<String, Value>>>>,
    delay: Option<Duration>,
}

impl StubTool {
    const ACTIONS: &'static [&'static str] = &[
        "list_tables",
        "get_table_schema",
        "get_schema_diagram",
        "map_user_terms",
        "execute_query",
        "explain_query",
    ];

    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            params: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn on(mut self, action: &str, response: ToolResponse) -> Self {
        self.responses.insert(action.to_string(), response);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    pub fn params(&self) -> Arc<Mutex<Vec<Map<String, Value>>>> {
        self.params.clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn valid_actions(&self) -> &'static [&'static str] {
        Self::ACTIONS
    }

    async fn run(&self, action: &str, params: &Map<String, Value>) -> ToolResponse {
        self.calls.lock().unwrap().push(action.to_string());
        self.params.lock().unwrap().push(params.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.responses.get(action) {
            Some(response) => response.clone(),
            None => ToolResponse::unknown_action(action, Self::ACTIONS),
        }
    }
}

/// What a [`SpyAgent`] does when invoked
#[derive(Clone)]
pub enum SpyBehavior {
    Reply(AgentResult),
    Sleep(Duration, AgentResult),
    Panic,
}

/// Agent with a fixed behavior and an invocation counter
pub struct SpyAgent {
    descriptor: AgentDescriptor,
    behavior: SpyBehavior,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<AgentContext>>>,
}

impl SpyAgent {
    pub fn new(descriptor: AgentDescriptor, behavior: SpyBehavior) -> Self {
        Self {
            descriptor,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying(descriptor: AgentDescriptor, payload: Value) -> Self {
        Self::new(descriptor, SpyBehavior::Reply(AgentResult::success(payload)))
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Contexts the agent was invoked with
    pub fn seen(&self) -> Arc<Mutex<Vec<AgentContext>>> {
        self.seen.clone()
    }
}

#[async_trait]
impl Agent for SpyAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn process(&self, _input: &AgentInput, context: &AgentContext) -> AgentResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(context.clone());
        match &self.behavior {
            SpyBehavior::Reply(result) => result.clone(),
            SpyBehavior::Sleep(delay, result) => {
                tokio::time::sleep(*delay).await;
                result.clone()
            }
            SpyBehavior::Panic => panic!("spy agent panicked"),
        }
    }
}
