//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! [`FileConfig::to_team_config`] turns them into the immutable
//! [`TeamConfig`] the agent factory consumes.

mod database;
mod llm;
mod models;
mod monitor;
mod output;
mod routes;
mod team;
mod tools;

pub use database::FileDatabaseConfig;
pub use llm::{FileLlmConfig, LlmProvider};
pub use models::FileModelsConfig;
pub use monitor::FileMonitorConfig;
pub use output::FileOutputConfig;
pub use routes::FileRoutesConfig;
pub use team::FileTeamConfig;
pub use tools::{FileToolsConfig, KNOWN_TOOLS};

use prism_application::{DATABASE_TOOL, SCHEMA_TOOL, TeamConfig};
use prism_domain::{AgentRole, ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard configuration errors; the team cannot be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("monitor.capacity cannot be 0")]
    ZeroCapacity,

    #[error("database.pool_size cannot be 0")]
    ZeroPoolSize,

    #[error("tools.max_rows cannot be 0")]
    ZeroMaxRows,

    #[error("models.{0} cannot be empty")]
    EmptyModelName(&'static str),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Processing mode, collaborate set, deadline
    pub team: FileTeamConfig,
    /// Model per LLM-backed agent
    pub models: FileModelsConfig,
    /// Intent to agent-chain table
    pub routes: FileRoutesConfig,
    /// Enabled tools and execution limits
    pub tools: FileToolsConfig,
    /// Connection target for the SQL tools
    pub database: FileDatabaseConfig,
    /// Event log and statistics
    pub monitor: FileMonitorConfig,
    /// LLM provider settings
    pub llm: FileLlmConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Reject configurations that cannot work at all.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.monitor.capacity == 0 {
            return Err(ConfigValidationError::ZeroCapacity);
        }
        if self.database.pool_size == 0 {
            return Err(ConfigValidationError::ZeroPoolSize);
        }
        if self.tools.max_rows == 0 {
            return Err(ConfigValidationError::ZeroMaxRows);
        }
        let models = self.models.to_settings();
        if models.nlu.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName("nlu"));
        }
        if models.sql.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName("sql"));
        }
        Ok(())
    }

    /// Agent ids the factory will build with the enabled tools
    fn buildable_agents(&self) -> Vec<&'static str> {
        [
            (AgentRole::Nlu, None),
            (AgentRole::Schema, Some(SCHEMA_TOOL)),
            (AgentRole::SqlGeneration, None),
            (AgentRole::Execution, Some(DATABASE_TOOL)),
            (AgentRole::Visualization, None),
            (AgentRole::Monitor, None),
        ]
        .into_iter()
        .filter(|(_, tool)| tool.is_none_or(|t| self.tools.is_enabled(t)))
        .map(|(role, _)| role.default_id())
        .collect()
    }

    /// Build the team configuration, collecting every non-fatal issue.
    ///
    /// Invalid values fall back to their defaults.
    pub fn to_team_config(&self) -> (TeamConfig, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let (default_mode, mode_issues) = self.team.parse_mode();
        issues.extend(mode_issues);
        let (collaborate, collaborate_issues) = self.team.parse_collaborate();
        issues.extend(collaborate_issues);
        let (routes, route_issues) = self.routes.to_route_table();
        issues.extend(route_issues);
        issues.extend(self.tools.unknown_tools());

        let buildable = self.buildable_agents();
        let referenced = routes
            .referenced_agents()
            .into_iter()
            .map(|id| ("routes", id.as_str().to_string()))
            .chain(
                collaborate
                    .agents
                    .iter()
                    .map(|id| ("team.collaborate_agents", id.as_str().to_string())),
            );
        for (field, id) in referenced {
            if !buildable.contains(&id.as_str()) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::UnavailableAgent,
                    format!(
                        "{}: agent '{}' will not be available; \
                         queries reaching it fail with AGENT_UNAVAILABLE",
                        field, id
                    ),
                ));
            }
        }

        let config = TeamConfig {
            default_mode,
            models: self.models.to_settings(),
            routes,
            collaborate,
            deadline: self.team.deadline(),
            execution: self.tools.to_execution_settings(),
            monitor: self.monitor.to_settings(),
        };
        (config, issues)
    }
}
