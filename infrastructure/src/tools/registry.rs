//! Tool Registry
//!
//! The [`ToolRegistry`] holds the enabled tools by name and implements
//! [`ToolLocator`], which is how the agent factory resolves them.
//!
//! # Usage
//!
//! ```ignore
//! use prism_infrastructure::tools::ToolRegistry;
//!
//! let registry = ToolRegistry::from_config(&file_config);
//! assert!(registry.tool("database").is_some());
//! ```
//!
//! Both SQL tools share one [`ConnectionHandle`], so they always introspect
//! and query the same target.

use super::connection::ConnectionHandle;
use super::database::{DatabaseTool, QueryLimits};
use super::schema::SchemaTool;
use crate::config::FileConfig;
use prism_application::{DATABASE_TOOL, SCHEMA_TOOL, Tool, ToolLocator};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name; a later tool with the same
    /// name replaces the earlier one.
    pub fn register<T: Tool + 'static>(self, tool: T) -> Self {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        let name = tool.name().to_string();
        debug!(tool = %name, actions = ?tool.valid_actions(), "Registered tool");
        self.tools.insert(name, tool);
        self
    }

    /// Registry with the tools `[tools].enabled` names, sharing one
    /// connection to `[database].url`. No connection is opened here.
    pub fn from_config(config: &FileConfig) -> Self {
        let connection = Arc::new(ConnectionHandle::new(
            config.database.url.clone(),
            config.database.pool_size,
        ));
        let mut registry = Self::new();
        if config.tools.is_enabled(SCHEMA_TOOL) {
            registry = registry.register(SchemaTool::new(connection.clone()));
        }
        if config.tools.is_enabled(DATABASE_TOOL) {
            registry = registry.register(DatabaseTool::new(
                connection,
                QueryLimits {
                    max_rows: config.tools.max_rows,
                    allow_writes: config.tools.allow_writes,
                },
            ));
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolLocator for ToolRegistry {
    fn tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::introspect::fixtures::shop_db;
    use serde_json::{Map, Value, json};

    #[test]
    fn test_from_config_respects_enabled() {
        let config = FileConfig::default();
        let registry = ToolRegistry::from_config(&config);
        assert_eq!(registry.names(), vec!["database", "schema"]);

        let mut config = FileConfig::default();
        config.tools.enabled = vec!["schema".to_string()];
        let registry = ToolRegistry::from_config(&config);
        assert_eq!(registry.len(), 1);
        assert!(registry.tool(DATABASE_TOOL).is_none());
        assert!(registry.tool(SCHEMA_TOOL).is_some());
    }

    #[tokio::test]
    async fn test_tools_share_the_configured_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FileConfig::default();
        config.database.url = format!("sqlite://{}", shop_db(&dir).display());
        config.tools.max_rows = 1;
        let registry = ToolRegistry::from_config(&config);

        let schema = registry.tool(SCHEMA_TOOL).unwrap();
        let tables = schema.run("list_tables", &Map::new()).await;
        assert_eq!(tables.get("tables"), Some(&json!(["customers", "orders"])));

        let database = registry.tool(DATABASE_TOOL).unwrap();
        let mut params = Map::new();
        params.insert("query".to_string(), Value::from("SELECT name FROM customers"));
        let rows = database.run("execute_query", &params).await;
        assert_eq!(rows.get("truncated"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_missing_database_is_error_response() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FileConfig::default();
        config.database.url = dir.path().join("missing.db").display().to_string();
        let registry = ToolRegistry::from_config(&config);

        let response = registry
            .tool(SCHEMA_TOOL)
            .unwrap()
            .run("get_schema_diagram", &Map::new())
            .await;
        assert!(!response.is_success());
        assert!(response.message().unwrap().contains("not found"));
    }
}
