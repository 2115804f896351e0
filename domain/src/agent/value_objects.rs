//! Agent domain value objects - the uniform `process` contract.
//!
//! # Contract types
//! - [`AgentInput`] - what an agent receives (query text or structured data)
//! - [`AgentContext`] - accumulated outputs of earlier stages, keyed by output key
//! - [`AgentResult`] - success/error envelope produced by every call

use crate::core::error::ErrorInfo;
use crate::nlu::entities::Intent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known context keys
pub mod keys {
    pub const NLU: &str = "nlu";
    pub const SCHEMA: &str = "schema";
    pub const SQL: &str = "sql";
    pub const EXECUTION: &str = "execution";
    pub const VISUALIZATION: &str = "visualization";
    /// Original query text, always present during orchestration
    pub const QUERY: &str = "query";
    /// Set to `true` to bypass the schema cache
    pub const REFRESH_SCHEMA: &str = "refresh_schema";
    /// Overrides the database connection target for tools
    pub const CONNECTION: &str = "connection";
    /// Set to `true` to attach the query plan to execution results
    pub const EXPLAIN: &str = "explain";
}

/// Input handed to an agent: either the query text or structured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentInput {
    Text(String),
    Structured(Value),
}

impl AgentInput {
    pub fn text(text: impl Into<String>) -> Self {
        AgentInput::Text(text.into())
    }

    /// Blank text, `null`, or an empty object/array
    pub fn is_empty(&self) -> bool {
        match self {
            AgentInput::Text(t) => t.trim().is_empty(),
            AgentInput::Structured(Value::Null) => true,
            AgentInput::Structured(Value::Object(m)) => m.is_empty(),
            AgentInput::Structured(Value::Array(a)) => a.is_empty(),
            AgentInput::Structured(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AgentInput::Text(t) => Some(t),
            AgentInput::Structured(v) => v.as_str(),
        }
    }
}

impl From<&str> for AgentInput {
    fn from(s: &str) -> Self {
        AgentInput::Text(s.to_string())
    }
}

/// Shared context passed between agents.
///
/// Each completed stage stores its payload under its output key, so stage N
/// sees everything stages 1..N-1 produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentContext(Map<String, Value>);

impl AgentContext {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Query text stored by the orchestrator
    pub fn query_text(&self) -> Option<&str> {
        self.get(keys::QUERY).and_then(Value::as_str)
    }

    /// Intent classified by the NLU stage, if it ran
    pub fn intent(&self) -> Option<Intent> {
        self.get(keys::NLU)
            .and_then(|nlu| nlu.get("intent"))
            .and_then(Value::as_str)
            .map(Intent::from_label)
    }

    /// Entity values extracted by the NLU stage
    pub fn entity_values(&self) -> Vec<String> {
        self.get(keys::NLU)
            .and_then(|nlu| nlu.get("entities"))
            .and_then(Value::as_array)
            .map(|entities| {
                entities
                    .iter()
                    .filter_map(|e| e.get("value"))
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// SQL text produced by the SQL-generation stage
    pub fn sql_text(&self) -> Option<&str> {
        self.get(keys::SQL)
            .and_then(|sql| sql.get("sql"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Table names known from the schema stage
    pub fn schema_tables(&self) -> Vec<String> {
        self.get(keys::SCHEMA)
            .and_then(|s| s.get("tables"))
            .and_then(Value::as_array)
            .map(|tables| {
                tables
                    .iter()
                    .filter_map(|t| t.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

impl From<Map<String, Value>> for AgentContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Uniform result of every `process` call.
///
/// Never partially populated: success carries a payload and no error,
/// failure carries an error and no payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AgentResult {
    Success { payload: Value },
    Error { error: ErrorInfo },
}

impl AgentResult {
    pub fn success(payload: Value) -> Self {
        AgentResult::Success { payload }
    }

    pub fn error(error: ErrorInfo) -> Self {
        AgentResult::Error { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentResult::Success { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            AgentResult::Success { payload } => Some(payload),
            AgentResult::Error { .. } => None,
        }
    }

    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match self {
            AgentResult::Success { .. } => None,
            AgentResult::Error { error } => Some(error),
        }
    }

    pub fn status_str(&self) -> &'static str {
        if self.is_success() { "success" } else { "error" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_agent_input_emptiness() {
        assert!(AgentInput::text("  ").is_empty());
        assert!(AgentInput::Structured(Value::Null).is_empty());
        assert!(AgentInput::Structured(json!({})).is_empty());
        assert!(!AgentInput::Structured(json!({"sql": "SELECT 1"})).is_empty());
        assert!(!AgentInput::from("list users").is_empty());
    }

    #[test]
    fn test_agent_result_serialization_is_never_partial() {
        let ok = serde_json::to_value(AgentResult::success(json!({"sql": "SELECT 1"}))).unwrap();
        assert_eq!(ok["status"], "success");
        assert!(ok.get("error").is_none());

        let err = serde_json::to_value(AgentResult::error(ErrorInfo::invalid_input("empty")))
            .unwrap();
        assert_eq!(err["status"], "error");
        assert_eq!(err["error"]["code"], "INVALID_INPUT");
        assert!(err.get("payload").is_none());
    }

    #[test]
    fn test_agent_result_accessors() {
        let r = AgentResult::error(ErrorInfo::agent_error("boom"));
        assert!(!r.is_success());
        assert!(r.payload().is_none());
        assert_eq!(r.error_info().unwrap().code, ErrorKind::AgentError);
        assert_eq!(r.status_str(), "error");
    }

    #[test]
    fn test_context_helpers() {
        let ctx = AgentContext::new()
            .with(keys::QUERY, json!("list users"))
            .with(
                keys::NLU,
                json!({"intent": "data_retrieval", "entities": [{"value": "users"}, {"value": 3}]}),
            )
            .with(keys::SQL, json!({"sql": "SELECT * FROM users"}))
            .with(keys::SCHEMA, json!({"tables": [{"name": "users"}, {"name": "orders"}]}));

        assert_eq!(ctx.query_text(), Some("list users"));
        assert_eq!(ctx.intent(), Some(Intent::DataRetrieval));
        assert_eq!(ctx.entity_values(), vec!["users".to_string(), "3".to_string()]);
        assert_eq!(ctx.sql_text(), Some("SELECT * FROM users"));
        assert_eq!(ctx.schema_tables(), vec!["users", "orders"]);
        assert!(!ctx.flag(keys::REFRESH_SCHEMA));
    }
}
