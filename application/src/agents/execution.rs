//! Execution agent - runs generated SQL through the database tool.

use super::tool_client::ToolClient;
use crate::ports::agent::{Agent, reject_empty_input};
use async_trait::async_trait;
use prism_domain::sql::analyze_performance;
use prism_domain::{
    AgentContext, AgentDescriptor, AgentInput, AgentResult, AgentRole, CONNECTION_PARAM,
    ErrorInfo, keys,
};
use serde_json::{Map, Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct ExecutionAgent {
    descriptor: AgentDescriptor,
    tool: ToolClient,
    query_timeout: Duration,
}

impl ExecutionAgent {
    pub fn new(tool: ToolClient, query_timeout: Duration) -> Self {
        Self {
            descriptor: AgentDescriptor::for_role(AgentRole::Execution),
            tool,
            query_timeout,
        }
    }

    /// SQL passed directly as structured input wins over context
    fn sql_to_run<'a>(input: &'a AgentInput, context: &'a AgentContext) -> Option<&'a str> {
        let direct = match input {
            AgentInput::Structured(v) => v.get("sql").and_then(Value::as_str),
            AgentInput::Text(_) => None,
        };
        direct.or_else(|| context.sql_text())
    }

    fn explain_requested(input: &AgentInput, context: &AgentContext) -> bool {
        let direct = match input {
            AgentInput::Structured(v) => v.get(keys::EXPLAIN).and_then(Value::as_bool),
            AgentInput::Text(_) => None,
        };
        direct.unwrap_or_else(|| context.flag(keys::EXPLAIN))
    }

    /// Plan steps, or the reason there is none. Never fails the run.
    async fn query_plan(&self, sql: &str, connection: Option<&Value>) -> Result<Value, String> {
        let mut params = Map::new();
        params.insert("query".to_string(), Value::String(sql.to_string()));
        if let Some(conn) = connection {
            params.insert(CONNECTION_PARAM.to_string(), conn.clone());
        }
        let response = self.tool.run("explain_query", params).await;
        if response.is_success() {
            Ok(response.get("plan").cloned().unwrap_or_else(|| json!([])))
        } else {
            Err(response.message().unwrap_or("explain failed").to_string())
        }
    }
}

#[async_trait]
impl Agent for ExecutionAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn process(&self, input: &AgentInput, context: &AgentContext) -> AgentResult {
        if let Some(rejected) = reject_empty_input(&self.descriptor, input) {
            return rejected;
        }
        let Some(sql) = Self::sql_to_run(input, context) else {
            return AgentResult::error(ErrorInfo::invalid_input(
                "No SQL to execute: run sql_generation first or pass {\"sql\": ...}",
            ));
        };

        let connection = context.get(keys::CONNECTION).filter(|c| c.is_string());
        let mut params = Map::new();
        params.insert("query".to_string(), Value::String(sql.to_string()));
        if let Some(conn) = connection {
            params.insert(CONNECTION_PARAM.to_string(), conn.clone());
        }

        let started = Instant::now();
        let response =
            match tokio::time::timeout(self.query_timeout, self.tool.run("execute_query", params))
                .await
            {
                Ok(response) => response,
                Err(_) => {
                    warn!(
                        sql = %sql,
                        timeout_ms = self.query_timeout.as_millis() as u64,
                        "Query timed out"
                    );
                    return AgentResult::error(ErrorInfo::agent_error(format!(
                        "Query timed out after {}ms",
                        self.query_timeout.as_millis()
                    )));
                }
            };
        let elapsed = started.elapsed();

        if !response.is_success() {
            return AgentResult::error(
                ErrorInfo::agent_error("Query execution failed")
                    .with_cause(response.to_error_info(self.tool.name())),
            );
        }

        let performance = analyze_performance(sql, elapsed);
        debug!(
            rating = %performance.rating,
            elapsed_ms = elapsed.as_millis() as u64,
            "Query executed"
        );

        let mut payload = json!({
            "sql": sql,
            "execution_time_ms": elapsed.as_millis() as u64,
            "performance": performance,
        });
        if let (Some(obj), Value::Object(fields)) =
            (payload.as_object_mut(), response.into_payload())
        {
            for key in ["columns", "rows", "row_count", "truncated", "rows_affected"] {
                if let Some(value) = fields.get(key) {
                    obj.insert(key.to_string(), value.clone());
                }
            }
        }

        if Self::explain_requested(input, context) {
            match self.query_plan(sql, connection).await {
                Ok(plan) => payload["query_plan"] = plan,
                Err(reason) => {
                    warn!(sql = %sql, reason = %reason, "Query plan unavailable");
                    payload["query_plan_error"] = Value::String(reason);
                }
            }
        }
        AgentResult::success(payload)
    }
}
