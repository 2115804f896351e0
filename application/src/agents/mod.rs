//! Agent implementations
//!
//! One type per [`AgentRole`](prism_domain::AgentRole). LLM-backed agents
//! take an [`LlmGateway`](crate::ports::llm_gateway::LlmGateway); tool-backed
//! agents take a [`ToolClient`] so every tool call is observed.

pub mod execution;
pub mod monitor;
pub mod nlu;
pub mod schema;
pub mod sql_generation;
pub mod tool_client;
pub mod visualization;

#[cfg(test)]
pub(crate) mod test_support;

pub use execution::ExecutionAgent;
pub use monitor::{MonitorAgent, MonitorStatistics, StreamItem, StreamStart};
pub use nlu::NluAgent;
pub use schema::{SchemaAgent, summarize_schema};
pub use sql_generation::SqlGenerationAgent;
pub use tool_client::ToolClient;
pub use visualization::VisualizationAgent;
