//! Tool configuration from TOML (`[tools]` section)
//!
//! ```toml
//! [tools]
//! enabled = ["schema", "database"]
//! allow_writes = false
//! max_rows = 100
//! query_timeout_seconds = 30
//! dialect = "SQLite"
//! ```

use prism_application::{DATABASE_TOOL, ExecutionSettings, SCHEMA_TOOL};
use prism_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Every tool this build can provide
pub const KNOWN_TOOLS: &[&str] = &[SCHEMA_TOOL, DATABASE_TOOL];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Tools registered at startup
    pub enabled: Vec<String>,
    /// Permit non-read statements through `execute_query`
    pub allow_writes: bool,
    /// Row cap for query results, prompts and fallback SQL
    pub max_rows: usize,
    /// Per-query execution timeout
    pub query_timeout_seconds: u64,
    /// SQL dialect named in prompts
    pub dialect: String,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        let execution = ExecutionSettings::default();
        Self {
            enabled: KNOWN_TOOLS.iter().map(|t| t.to_string()).collect(),
            allow_writes: false,
            max_rows: execution.max_rows,
            query_timeout_seconds: execution.query_timeout.as_secs(),
            dialect: execution.dialect,
        }
    }
}

impl FileToolsConfig {
    pub fn is_enabled(&self, tool: &str) -> bool {
        self.enabled.iter().any(|t| t.trim() == tool)
    }

    /// Names in `enabled` that no tool answers to
    pub fn unknown_tools(&self) -> Vec<ConfigIssue> {
        self.enabled
            .iter()
            .filter(|t| !KNOWN_TOOLS.contains(&t.trim()))
            .map(|t| {
                ConfigIssue::warning(
                    ConfigIssueCode::UnknownTool,
                    format!(
                        "tools.enabled: unknown tool '{}', expected one of {}",
                        t,
                        KNOWN_TOOLS.join(", ")
                    ),
                )
            })
            .collect()
    }

    pub fn to_execution_settings(&self) -> ExecutionSettings {
        ExecutionSettings {
            max_rows: self.max_rows,
            query_timeout: Duration::from_secs(self.query_timeout_seconds.max(1)),
            dialect: self.dialect.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_both_tools() {
        let config = FileToolsConfig::default();
        assert!(config.is_enabled("schema"));
        assert!(config.is_enabled("database"));
        assert!(config.unknown_tools().is_empty());
        assert_eq!(config.to_execution_settings(), ExecutionSettings::default());
    }

    #[test]
    fn test_unknown_tool_warning() {
        let config = FileToolsConfig {
            enabled: vec!["database".to_string(), "web_search".to_string()],
            ..Default::default()
        };
        let issues = config.unknown_tools();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::UnknownTool);
        assert!(!config.is_enabled("schema"));
    }
}
