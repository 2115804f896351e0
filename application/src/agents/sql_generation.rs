//! SQL-generation agent.

use super::schema::summarize_schema;
use crate::ports::agent::{Agent, reject_empty_input};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use async_trait::async_trait;
use prism_domain::sql::{extract_sql, is_read_only, validate_sql};
use prism_domain::{
    AgentContext, AgentDescriptor, AgentInput, AgentResult, AgentRole, ErrorInfo, ParseError,
    PromptTemplate, SqlValidation, keys,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

const LLM_CONFIDENCE: f64 = 0.9;
const FIXED_CONFIDENCE: f64 = 0.7;
const UNVERIFIED_CONFIDENCE: f64 = 0.4;
const FALLBACK_CONFIDENCE: f64 = 0.3;

pub struct SqlGenerationAgent {
    descriptor: AgentDescriptor,
    gateway: Arc<dyn LlmGateway>,
    model: String,
    dialect: String,
    max_rows: usize,
}

impl SqlGenerationAgent {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        model: impl Into<String>,
        dialect: impl Into<String>,
        max_rows: usize,
    ) -> Self {
        Self {
            descriptor: AgentDescriptor::for_role(AgentRole::SqlGeneration),
            gateway,
            model: model.into(),
            dialect: dialect.into(),
            max_rows,
        }
    }

    /// `SELECT * FROM <table> LIMIT n` for the first schema table the
    /// question or its entities mention.
    fn fallback_sql(&self, text: &str, context: &AgentContext) -> Option<String> {
        let mut terms: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        terms.extend(context.entity_values().iter().map(|v| v.to_lowercase()));

        context
            .schema_tables()
            .into_iter()
            .find(|table| {
                let name = table.to_lowercase();
                let singular = name.strip_suffix('s').unwrap_or(&name);
                terms.iter().any(|t| *t == name || t == singular)
            })
            .map(|table| format!("SELECT * FROM {} LIMIT {}", table, self.max_rows))
    }
}

#[async_trait]
impl Agent for SqlGenerationAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn process(&self, input: &AgentInput, context: &AgentContext) -> AgentResult {
        if let Some(rejected) = reject_empty_input(&self.descriptor, input) {
            return rejected;
        }
        let Some(text) = input.as_text().or_else(|| context.query_text()) else {
            return AgentResult::error(ErrorInfo::invalid_input(
                "SQL generation input must be text",
            ));
        };

        let schema = context.get(keys::SCHEMA).map(summarize_schema);
        let prompt = PromptTemplate::sql_query(
            text,
            context.intent(),
            &context.entity_values(),
            schema.as_deref().filter(|s| !s.is_empty()),
            self.max_rows,
        );

        let response = match self
            .gateway
            .generate(&self.model, &PromptTemplate::sql_system(&self.dialect), &prompt)
            .await
        {
            Ok(response) => response,
            // no model configured: answer from the schema alone when possible
            Err(GatewayError::ModelNotAvailable(model)) => {
                return self.recover(text, context, ParseError::ModelUnavailable(model));
            }
            Err(e) => {
                return AgentResult::error(ErrorInfo::agent_error(format!(
                    "SQL generation failed: {}",
                    e
                )));
            }
        };

        match extract_sql(&response) {
            Ok(sql) => self.check_and_fix(sql, context).await,
            Err(parse_error) => self.recover(text, context, parse_error),
        }
    }
}

impl SqlGenerationAgent {
    /// Validate `sql` against the schema in `context`. A query that fails
    /// gets one repair round through the model and is validated again.
    async fn check_and_fix(&self, sql: String, context: &AgentContext) -> AgentResult {
        let schema = context.get(keys::SCHEMA).unwrap_or(&Value::Null);
        let validation = validate_sql(&sql, schema);
        if validation.is_valid {
            debug!(sql = %sql, checked = validation.checked, "Generated SQL");
            return AgentResult::success(sql_payload(&sql, LLM_CONFIDENCE, "llm", &validation));
        }

        let problems = validation.descriptions();
        warn!(sql = %sql, problems = ?problems, "Generated SQL failed schema checks");
        let prompt = PromptTemplate::sql_fix(&sql, &problems, &summarize_schema(schema));
        let fixed = match self
            .gateway
            .generate(&self.model, &PromptTemplate::sql_system(&self.dialect), &prompt)
            .await
        {
            Ok(response) => extract_sql(&response).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match fixed {
            Ok(fixed) => {
                let revalidation = validate_sql(&fixed, schema);
                let confidence = if revalidation.is_valid {
                    FIXED_CONFIDENCE
                } else {
                    UNVERIFIED_CONFIDENCE
                };
                debug!(sql = %fixed, valid = revalidation.is_valid, "Repaired SQL");
                let mut payload = sql_payload(&fixed, confidence, "llm_fixed", &revalidation);
                payload["original_sql"] = Value::String(sql);
                AgentResult::success(payload)
            }
            Err(reason) => {
                warn!(reason = %reason, "SQL repair failed, keeping the generated query");
                let mut payload = sql_payload(&sql, UNVERIFIED_CONFIDENCE, "llm", &validation);
                payload["warning"] = Value::String(format!("SQL repair failed: {}", reason));
                AgentResult::success(payload)
            }
        }
    }

    fn recover(&self, text: &str, context: &AgentContext, error: ParseError) -> AgentResult {
        match self.fallback_sql(text, context) {
            Some(sql) => {
                warn!(error = %error, sql = %sql, "Unusable SQL response, using fallback query");
                AgentResult::success(json!({
                    "sql": sql,
                    "read_only": true,
                    "confidence": FALLBACK_CONFIDENCE,
                    "source": "fallback",
                    "warning": error.to_string(),
                }))
            }
            None => AgentResult::error(ErrorInfo::parse_error(format!(
                "Could not extract SQL from model response: {}",
                error
            ))),
        }
    }
}

fn sql_payload(sql: &str, confidence: f64, source: &str, validation: &SqlValidation) -> Value {
    json!({
        "sql": sql,
        "read_only": is_read_only(sql),
        "confidence": confidence,
        "source": source,
        "validation": validation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::StubGateway;
    use prism_domain::ErrorKind;

    fn agent(gateway: StubGateway) -> SqlGenerationAgent {
        SqlGenerationAgent::new(Arc::new(gateway), "sql-model", "SQLite", 25)
    }

    fn schema_ctx() -> AgentContext {
        AgentContext::new().with(
            keys::SCHEMA,
            json!({"tables": [
                {"name": "orders", "columns": []},
                {"name": "users", "columns": []},
            ]}),
        )
    }

    #[tokio::test]
    async fn test_extracts_sql_from_fence() {
        let agent = agent(StubGateway::replying("```sql\nSELECT name FROM users;\n```"));
        let r = agent.process(&AgentInput::text("user names"), &schema_ctx()).await;
        let payload = r.payload().unwrap();
        assert_eq!(payload["sql"], "SELECT name FROM users");
        assert_eq!(payload["read_only"], true);
        assert_eq!(payload["source"], "llm");
    }

    #[tokio::test]
    async fn test_multiple_statements_trigger_fallback() {
        let agent = agent(StubGateway::replying("```sql\nSELECT 1; SELECT 2;\n```"));
        let r = agent
            .process(&AgentInput::text("Show me a list of all users"), &schema_ctx())
            .await;
        let payload = r.payload().unwrap();
        assert_eq!(payload["sql"], "SELECT * FROM users LIMIT 25");
        assert_eq!(payload["confidence"], 0.3);
        assert_eq!(payload["source"], "fallback");
    }

    #[tokio::test]
    async fn test_singular_term_matches_table() {
        let agent = agent(StubGateway::replying("no idea"));
        let r = agent.process(&AgentInput::text("latest order"), &schema_ctx()).await;
        assert_eq!(r.payload().unwrap()["sql"], "SELECT * FROM orders LIMIT 25");
    }

    #[tokio::test]
    async fn test_parse_error_without_matching_table() {
        let agent = agent(StubGateway::replying("no idea"));
        let r = agent.process(&AgentInput::text("weather tomorrow"), &schema_ctx()).await;
        assert_eq!(r.error_info().unwrap().code, ErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_unavailable_model_uses_fallback() {
        let agent = SqlGenerationAgent::new(
            Arc::new(StubGateway::failing().unavailable()),
            "sql-model",
            "SQLite",
            25,
        );
        let r = agent.process(&AgentInput::text("list users"), &schema_ctx()).await;
        assert_eq!(r.payload().unwrap()["sql"], "SELECT * FROM users LIMIT 25");

        let r = agent.process(&AgentInput::text("weather"), &schema_ctx()).await;
        assert_eq!(r.error_info().unwrap().code, ErrorKind::ParseError);
    }

    fn columns_ctx() -> AgentContext {
        AgentContext::new().with(
            keys::SCHEMA,
            json!({"tables": [{
                "name": "customers",
                "columns": [{"name": "id"}, {"name": "email"}],
            }]}),
        )
    }

    #[tokio::test]
    async fn test_valid_sql_is_not_repaired() {
        let gateway = StubGateway::replying("```sql\nSELECT email FROM customers\n```");
        let calls = gateway.calls();
        let r = agent(gateway).process(&AgentInput::text("emails"), &columns_ctx()).await;

        let payload = r.payload().unwrap();
        assert_eq!(payload["sql"], "SELECT email FROM customers");
        assert_eq!(payload["validation"]["is_valid"], true);
        assert_eq!(payload["validation"]["checked"], true);
        assert!(payload.get("original_sql").is_none());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_sql_is_repaired_and_revalidated() {
        let gateway = StubGateway::failing().with_replies(&[
            "```sql\nSELECT email FROM users\n```",
            "```sql\nSELECT email FROM customers\n```",
        ]);
        let calls = gateway.calls();
        let r = agent(gateway).process(&AgentInput::text("emails"), &columns_ctx()).await;

        let payload = r.payload().unwrap();
        assert_eq!(payload["sql"], "SELECT email FROM customers");
        assert_eq!(payload["original_sql"], "SELECT email FROM users");
        assert_eq!(payload["source"], "llm_fixed");
        assert_eq!(payload["confidence"], 0.7);
        assert_eq!(payload["validation"]["is_valid"], true);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_repair_keeps_generated_sql() {
        let gateway = StubGateway::failing().with_replies(&["SELECT phone FROM customers"]);
        let r = agent(gateway).process(&AgentInput::text("phones"), &columns_ctx()).await;

        let payload = r.payload().unwrap();
        assert_eq!(payload["sql"], "SELECT phone FROM customers");
        assert_eq!(payload["confidence"], 0.4);
        assert_eq!(payload["validation"]["is_valid"], false);
        assert_eq!(payload["validation"]["errors"][0]["type"], "unknown_column");
        assert!(payload["warning"].as_str().unwrap().starts_with("SQL repair failed"));
    }

    #[tokio::test]
    async fn test_gateway_failure_is_agent_error() {
        let agent = agent(StubGateway::failing());
        let r = agent.process(&AgentInput::text("list users"), &schema_ctx()).await;
        let err = r.error_info().unwrap();
        assert_eq!(err.code, ErrorKind::AgentError);
        assert!(err.message.starts_with("SQL generation failed"));
    }
}
