//! Agent factory - assembles a team from an immutable [`TeamConfig`].

use crate::agents::{
    ExecutionAgent, MonitorAgent, NluAgent, SchemaAgent, SqlGenerationAgent, ToolClient,
    VisualizationAgent,
};
use crate::config::TeamConfig;
use crate::orchestrator::{AgentRegistry, Orchestrator, RegistryError};
use crate::ports::agent::Agent;
use crate::ports::event_logger::{EventLogger, NoEventLogger};
use crate::ports::event_sink::EventSink;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::tool::{DATABASE_TOOL, SCHEMA_TOOL, ToolLocator};
use prism_domain::{AgentId, AgentRole};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("Monitor capacity must be greater than zero")]
    ZeroCapacity,

    #[error("Model name for the {0} agent is empty")]
    EmptyModel(&'static str),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// An assembled team: the orchestrator plus the monitor it reports to.
pub struct AgentTeam {
    pub orchestrator: Arc<Orchestrator>,
    pub monitor: Arc<MonitorAgent>,
}

pub struct AgentFactory<'a> {
    config: &'a TeamConfig,
    gateway: Arc<dyn LlmGateway>,
    tools: &'a dyn ToolLocator,
    logger: Arc<dyn EventLogger>,
}

impl<'a> AgentFactory<'a> {
    pub fn new(
        config: &'a TeamConfig,
        gateway: Arc<dyn LlmGateway>,
        tools: &'a dyn ToolLocator,
    ) -> Self {
        Self {
            config,
            gateway,
            tools,
            logger: Arc::new(NoEventLogger),
        }
    }

    /// Archive monitor events through `logger`
    pub fn with_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.logger = logger;
        self
    }

    fn validate(&self) -> Result<(), FactoryError> {
        if self.config.monitor.capacity == 0 {
            return Err(FactoryError::ZeroCapacity);
        }
        if self.config.models.nlu.trim().is_empty() {
            return Err(FactoryError::EmptyModel("nlu"));
        }
        if self.config.models.sql.trim().is_empty() {
            return Err(FactoryError::EmptyModel("sql_generation"));
        }
        Ok(())
    }

    /// Tool bound to `role`'s default id, or `None` when the tool is disabled
    fn tool_client(
        &self,
        tool: &str,
        role: AgentRole,
        sink: &Arc<dyn EventSink>,
    ) -> Option<ToolClient> {
        match self.tools.tool(tool) {
            Some(tool) => Some(ToolClient::new(
                tool,
                sink.clone(),
                AgentId::from(role.default_id()),
            )),
            None => {
                warn!(agent = role.default_id(), tool, "Tool disabled; agent not built");
                None
            }
        }
    }

    pub fn build(&self) -> Result<AgentTeam, FactoryError> {
        self.validate()?;

        let monitor = Arc::new(MonitorAgent::with_logger(
            self.config.monitor.clone(),
            self.logger.clone(),
        ));
        let sink: Arc<dyn EventSink> = monitor.clone();
        let execution = &self.config.execution;

        let mut agents: Vec<Arc<dyn Agent>> = vec![Arc::new(NluAgent::new(
            self.gateway.clone(),
            self.config.models.nlu.clone(),
        ))];
        if let Some(client) = self.tool_client(SCHEMA_TOOL, AgentRole::Schema, &sink) {
            agents.push(Arc::new(SchemaAgent::new(client)));
        }
        agents.push(Arc::new(SqlGenerationAgent::new(
            self.gateway.clone(),
            self.config.models.sql.clone(),
            execution.dialect.clone(),
            execution.max_rows,
        )));
        if let Some(client) = self.tool_client(DATABASE_TOOL, AgentRole::Execution, &sink) {
            agents.push(Arc::new(ExecutionAgent::new(client, execution.query_timeout)));
        }
        agents.push(Arc::new(VisualizationAgent::new()));
        agents.push(monitor.clone());

        let mut registry = AgentRegistry::new();
        for agent in agents {
            registry.register(agent)?;
        }

        for id in self.config.routes.referenced_agents() {
            if registry.get(id.as_str()).is_none() {
                warn!(agent = %id, "Route refers to an agent that is not available");
            }
        }
        for id in &self.config.collaborate.agents {
            if registry.get(id.as_str()).is_none() {
                warn!(agent = %id, "Collaborate set refers to an agent that is not available");
            }
        }

        info!(
            agents = registry.len(),
            mode = %self.config.default_mode,
            "Agent team assembled"
        );
        let orchestrator = Orchestrator::from_config(registry, self.config, sink);
        Ok(AgentTeam {
            orchestrator: Arc::new(orchestrator),
            monitor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{StubGateway, StubTool};
    use crate::config::MonitorSettings;
    use crate::ports::tool::Tool;
    use prism_domain::{ErrorKind, ProcessingMode, Query, ToolResponse};
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Tools(HashMap<String, Arc<dyn Tool>>);

    impl Tools {
        fn with(mut self, tool: StubTool) -> Self {
            self.0.insert(tool.name().to_string(), Arc::new(tool));
            self
        }
    }

    impl ToolLocator for Tools {
        fn tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
            self.0.get(name).cloned()
        }

        fn names(&self) -> Vec<String> {
            self.0.keys().cloned().collect()
        }
    }

    fn gateway() -> Arc<dyn LlmGateway> {
        Arc::new(StubGateway::replying(
            r#"{"intent": "data_retrieval", "confidence": 0.9}"#,
        ))
    }

    #[test]
    fn test_builds_full_team() {
        let config = TeamConfig::default().with_mode(ProcessingMode::Coordinate);
        let tools = Tools::default()
            .with(StubTool::new("schema"))
            .with(StubTool::new("database"));
        let team = AgentFactory::new(&config, gateway(), &tools).build().unwrap();

        let ids: Vec<&str> = team
            .orchestrator
            .registry()
            .ids()
            .into_iter()
            .map(AgentId::as_str)
            .collect();
        assert_eq!(
            ids,
            vec!["nlu", "schema", "sql_generation", "execution", "visualization", "monitor"]
        );
        assert_eq!(team.orchestrator.mode(), ProcessingMode::Coordinate);
    }

    fn models(config: &mut TeamConfig) -> Arc<dyn LlmGateway> {
        config.models.nlu = "nlu-model".to_string();
        config.models.sql = "sql-model".to_string();
        Arc::new(
            StubGateway::failing()
                .with_model_reply("nlu-model", r#"{"intent": "data_retrieval", "confidence": 0.9}"#)
                .with_model_reply("sql-model", "SELECT 1"),
        )
    }

    #[tokio::test]
    async fn test_disabled_tool_skips_agent() {
        let mut config = TeamConfig::default();
        let gateway = models(&mut config);
        let tools = Tools::default().with(StubTool::new("schema"));
        let team = AgentFactory::new(&config, gateway, &tools).build().unwrap();

        assert!(team.orchestrator.registry().get("execution").is_none());
        let result = team.orchestrator.process(&Query::new("list users")).await;
        assert_eq!(result.error.as_ref().unwrap().code, ErrorKind::AgentUnavailable);
        assert!(result.agent_result("sql_generation").unwrap().is_success());
    }

    #[tokio::test]
    async fn test_team_reports_to_monitor() {
        let mut config = TeamConfig::default();
        let gateway = models(&mut config);
        let tools = Tools::default().with(StubTool::new("database").on(
            "execute_query",
            ToolResponse::success().with("rows", json!([])),
        ));

        let team = AgentFactory::new(&config, gateway, &tools).build().unwrap();
        let result = team.orchestrator.process(&Query::new("list users")).await;

        assert!(result.is_success(), "{:?}", result.error);
        let stats = team.monitor.get_agent_statistics();
        assert_eq!(stats.queries, 1);
        assert_eq!(stats.agents["database"].invocations, 1);
        assert_eq!(stats.agents["execution"].successes, 1);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let tools = Tools::default();
        let config = TeamConfig::default().with_monitor(MonitorSettings {
            capacity: 0,
            ..MonitorSettings::default()
        });
        let err = AgentFactory::new(&config, gateway(), &tools).build().err().unwrap();
        assert_eq!(err, FactoryError::ZeroCapacity);

        let mut config = TeamConfig::default();
        config.models.sql = " ".to_string();
        let err = AgentFactory::new(&config, gateway(), &tools).build().err().unwrap();
        assert_eq!(err, FactoryError::EmptyModel("sql_generation"));
    }
}
