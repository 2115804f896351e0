//! Application layer for prism
//!
//! This crate contains the agent team, the orchestrator, port definitions
//! and team configuration. It depends only on the domain layer.

pub mod agents;
pub mod config;
pub mod factory;
pub mod orchestrator;
pub mod ports;

// Re-export commonly used types
pub use agents::{
    ExecutionAgent, MonitorAgent, MonitorStatistics, NluAgent, SchemaAgent, SqlGenerationAgent,
    StreamItem, StreamStart, ToolClient, VisualizationAgent,
};
pub use config::{
    CollaborateSettings, DEFAULT_MODEL, ExecutionSettings, ModelSettings, MonitorSettings,
    TeamConfig,
};
pub use factory::{AgentFactory, AgentTeam, FactoryError};
pub use orchestrator::{AgentRegistry, ModeGuard, Orchestrator, RegistryError};
pub use ports::{
    agent::Agent,
    event_logger::{EventLogger, NoEventLogger},
    event_sink::{EventSink, NoEventSink},
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    tool::{DATABASE_TOOL, SCHEMA_TOOL, Tool, ToolLocator},
};
