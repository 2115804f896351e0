//! Team configuration from TOML (`[team]` section)
//!
//! ```toml
//! [team]
//! default_mode = "coordinate"          # route | coordinate | collaborate
//! collaborate_agents = ["sql_generation", "visualization"]
//! collaborate_shared_nlu = true
//! deadline_seconds = 60
//! ```

use prism_application::CollaborateSettings;
use prism_domain::{AgentId, ConfigIssue, ConfigIssueCode, ProcessingMode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTeamConfig {
    /// Mode used when a query carries no override
    pub default_mode: String,
    /// Agents dispatched concurrently in collaborate mode
    pub collaborate_agents: Vec<String>,
    /// Run NLU once before the collaborate fan-out
    pub collaborate_shared_nlu: bool,
    /// Overall deadline per query; unset means none
    pub deadline_seconds: Option<u64>,
}

impl Default for FileTeamConfig {
    fn default() -> Self {
        let collaborate = CollaborateSettings::default();
        Self {
            default_mode: ProcessingMode::default().as_str().to_string(),
            collaborate_agents: collaborate
                .agents
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            collaborate_shared_nlu: collaborate.shared_nlu,
            deadline_seconds: None,
        }
    }
}

impl FileTeamConfig {
    /// Parse `default_mode`, falling back to route on unknown values
    pub fn parse_mode(&self) -> (ProcessingMode, Vec<ConfigIssue>) {
        match self.default_mode.parse() {
            Ok(mode) => (mode, Vec::new()),
            Err(_) => (
                ProcessingMode::default(),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidMode,
                    format!(
                        "team.default_mode: unknown value '{}', falling back to '{}'",
                        self.default_mode,
                        ProcessingMode::default()
                    ),
                )],
            ),
        }
    }

    pub fn parse_collaborate(&self) -> (CollaborateSettings, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let agents = self
            .collaborate_agents
            .iter()
            .filter_map(|name| {
                let name = name.trim();
                if name.is_empty() {
                    issues.push(ConfigIssue::warning(
                        ConfigIssueCode::InvalidAgent,
                        "team.collaborate_agents: empty agent id ignored",
                    ));
                    None
                } else {
                    Some(AgentId::from(name))
                }
            })
            .collect();
        (
            CollaborateSettings {
                agents,
                shared_nlu: self.collaborate_shared_nlu,
            },
            issues,
        )
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
