//! Infrastructure layer for prism
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: SQLite tools, LLM gateways, the JSONL
//! event archive and configuration file loading.

pub mod config;
pub mod llm;
pub mod logging;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileDatabaseConfig, FileLlmConfig,
    FileModelsConfig, FileMonitorConfig, FileOutputConfig, FileRoutesConfig, FileTeamConfig,
    FileToolsConfig, LlmProvider,
};
pub use llm::{OfflineGateway, gateway_from_config};
pub use logging::JsonlEventLogger;
pub use tools::{
    ConnectionHandle, DatabaseTool, QueryLimits, SchemaTool, SqlToolError, ToolRegistry,
};
