//! Schema agent - schema snapshot with caching and user-term mapping.

use super::tool_client::ToolClient;
use crate::ports::agent::Agent;
use async_trait::async_trait;
use prism_domain::sql::join_paths;
use prism_domain::{
    AgentContext, AgentDescriptor, AgentInput, AgentResult, AgentRole, CONNECTION_PARAM,
    ErrorInfo, Relationship, keys,
};
use serde_json::{Map, Value, json};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

pub struct SchemaAgent {
    descriptor: AgentDescriptor,
    tool: ToolClient,
    /// (connection override, snapshot)
    cache: Mutex<Option<(Option<String>, Value)>>,
}

impl SchemaAgent {
    pub fn new(tool: ToolClient) -> Self {
        Self {
            descriptor: AgentDescriptor::for_role(AgentRole::Schema),
            tool,
            cache: Mutex::new(None),
        }
    }

    fn cached(&self, connection: &Option<String>) -> Option<Value> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .as_ref()
            .filter(|(conn, _)| conn == connection)
            .map(|(_, snapshot)| snapshot.clone())
    }

    fn store(&self, connection: Option<String>, snapshot: Value) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = Some((connection, snapshot));
    }

    fn base_params(connection: &Option<String>) -> Map<String, Value> {
        let mut params = Map::new();
        if let Some(conn) = connection {
            params.insert(CONNECTION_PARAM.to_string(), Value::String(conn.clone()));
        }
        params
    }

    async fn snapshot(
        &self,
        connection: &Option<String>,
        refresh: bool,
    ) -> Result<(Value, bool), ErrorInfo> {
        if !refresh && let Some(snapshot) = self.cached(connection) {
            return Ok((snapshot, true));
        }

        let response = self
            .tool
            .run("get_schema_diagram", Self::base_params(connection))
            .await;
        if !response.is_success() {
            return Err(ErrorInfo::agent_error("Schema introspection failed")
                .with_cause(response.to_error_info(self.tool.name())));
        }

        let tables = response.get("tables").cloned().unwrap_or_else(|| json!([]));
        let relationships = response
            .get("relationships")
            .cloned()
            .unwrap_or_else(|| json!([]));
        let snapshot = json!({
            "join_paths": join_paths_for(&tables, &relationships),
            "tables": tables,
            "relationships": relationships,
            "schema_version": response.get("schema_version").cloned().unwrap_or(Value::Null),
        });
        // The lock is not held across the tool call; concurrent misses both fetch
        self.store(connection.clone(), snapshot.clone());
        Ok((snapshot, false))
    }

    async fn map_terms(&self, connection: &Option<String>, terms: Vec<String>) -> Value {
        if terms.is_empty() {
            return json!({});
        }
        let mut params = Self::base_params(connection);
        params.insert("terms".to_string(), json!(terms));
        let response = self.tool.run("map_user_terms", params).await;
        if response.is_success() {
            response.get("mappings").cloned().unwrap_or_else(|| json!({}))
        } else {
            warn!(
                agent = %self.descriptor.id,
                error = response.message().unwrap_or_default(),
                "Term mapping failed, continuing without mappings"
            );
            json!({})
        }
    }
}

/// Foreign-key join paths between every connected pair of snapshot tables.
fn join_paths_for(tables: &Value, relationships: &Value) -> Value {
    let names: Vec<String> = tables
        .as_array()
        .map(|tables| {
            tables
                .iter()
                .filter_map(|t| t.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let relationships: Vec<Relationship> = match serde_json::from_value(relationships.clone()) {
        Ok(relationships) => relationships,
        Err(e) => {
            warn!(error = %e, "Unreadable relationships; no join paths");
            Vec::new()
        }
    };
    serde_json::to_value(join_paths(&names, &relationships)).unwrap_or_else(|_| json!({}))
}

/// Compact `table(col, col)` lines for prompts.
pub fn summarize_schema(schema: &Value) -> String {
    let Some(tables) = schema.get("tables").and_then(Value::as_array) else {
        return String::new();
    };
    tables
        .iter()
        .filter_map(|table| {
            let name = table.get("name").and_then(Value::as_str)?;
            let columns: Vec<String> = table
                .get("columns")
                .and_then(Value::as_array)
                .map(|cols| {
                    cols.iter()
                        .filter_map(|c| {
                            let col = c.get("name").and_then(Value::as_str)?;
                            Some(match c.get("type").and_then(Value::as_str) {
                                Some(ty) if !ty.is_empty() => format!("{} {}", col, ty),
                                _ => col.to_string(),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            Some(format!("{}({})", name, columns.join(", ")))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Agent for SchemaAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn process(&self, _input: &AgentInput, context: &AgentContext) -> AgentResult {
        let connection = context
            .get(keys::CONNECTION)
            .and_then(Value::as_str)
            .map(str::to_string);
        let refresh = context.flag(keys::REFRESH_SCHEMA);

        let (mut snapshot, cached) = match self.snapshot(&connection, refresh).await {
            Ok(found) => found,
            Err(error) => return AgentResult::error(error),
        };
        debug!(cached, refresh, "Schema snapshot ready");

        let mappings = self.map_terms(&connection, context.entity_values()).await;
        if let Some(obj) = snapshot.as_object_mut() {
            obj.insert("term_mappings".to_string(), mappings);
            obj.insert("cached".to_string(), Value::Bool(cached));
        }
        AgentResult::success(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::StubTool;
    use crate::ports::event_sink::NoEventSink;
    use prism_domain::{ErrorKind, ToolResponse};
    use std::sync::Arc;

    fn diagram() -> ToolResponse {
        ToolResponse::success()
            .with(
                "tables",
                json!([{
                    "name": "users",
                    "columns": [
                        {"name": "id", "type": "INTEGER"},
                        {"name": "email", "type": "TEXT"},
                    ],
                }]),
            )
            .with("relationships", json!([]))
            .with("schema_version", 3)
    }

    fn agent(tool: StubTool) -> SchemaAgent {
        SchemaAgent::new(ToolClient::new(
            Arc::new(tool),
            Arc::new(NoEventSink),
            "schema".into(),
        ))
    }

    #[tokio::test]
    async fn test_snapshot_is_cached_until_refresh() {
        let tool = StubTool::new("schema")
            .on("get_schema_diagram", diagram())
            .on("map_user_terms", ToolResponse::success().with("mappings", json!({})));
        let calls = tool.calls();
        let agent = agent(tool);
        let input = AgentInput::text("users");

        let first = agent.process(&input, &AgentContext::new()).await;
        assert_eq!(first.payload().unwrap()["cached"], false);
        assert_eq!(first.payload().unwrap()["schema_version"], 3);

        let second = agent.process(&input, &AgentContext::new()).await;
        assert_eq!(second.payload().unwrap()["cached"], true);

        let refreshed = agent
            .process(&input, &AgentContext::new().with(keys::REFRESH_SCHEMA, json!(true)))
            .await;
        assert_eq!(refreshed.payload().unwrap()["cached"], false);
        assert_eq!(calls.lock().unwrap().iter().filter(|a| *a == "get_schema_diagram").count(), 2);
    }

    #[tokio::test]
    async fn test_term_mapping_from_entities() {
        let tool = StubTool::new("schema").on("get_schema_diagram", diagram()).on(
            "map_user_terms",
            ToolResponse::success().with("mappings", json!({"customers": [{"table": "users"}]})),
        );
        let agent = agent(tool);
        let ctx =
            AgentContext::new().with(keys::NLU, json!({"entities": [{"value": "customers"}]}));
        let r = agent.process(&AgentInput::text("customers"), &ctx).await;
        assert_eq!(r.payload().unwrap()["term_mappings"]["customers"][0]["table"], "users");
    }

    #[tokio::test]
    async fn test_tool_error_becomes_agent_error_with_tool_cause() {
        let tool = StubTool::new("schema")
            .on("get_schema_diagram", ToolResponse::error("unable to open database"));
        let r = agent(tool).process(&AgentInput::text("x"), &AgentContext::new()).await;
        let err = r.error_info().unwrap();
        assert_eq!(err.code, ErrorKind::AgentError);
        assert_eq!(err.root_cause().code, ErrorKind::ToolError);
    }

    #[tokio::test]
    async fn test_snapshot_carries_join_paths() {
        let tool = StubTool::new("schema").on(
            "get_schema_diagram",
            ToolResponse::success()
                .with("tables", json!([{"name": "customers"}, {"name": "orders"}]))
                .with(
                    "relationships",
                    json!([{
                        "from_table": "orders",
                        "from_column": "customer_id",
                        "to_table": "customers",
                        "to_column": "id",
                    }]),
                ),
        );
        let r = agent(tool).process(&AgentInput::text("orders"), &AgentContext::new()).await;
        let paths = &r.payload().unwrap()["join_paths"];
        assert_eq!(paths["customers"]["orders"][0]["on"], "orders.customer_id = customers.id");
        assert_eq!(paths["orders"]["customers"][0]["to"], "customers");
    }

    #[test]
    fn test_summarize_schema() {
        let schema = json!({"tables": [{
            "name": "users",
            "columns": [{"name": "id", "type": "INTEGER"}, {"name": "email"}],
        }]});
        assert_eq!(summarize_schema(&schema), "users(id INTEGER, email)");
        assert_eq!(summarize_schema(&json!({})), "");
    }
}
