//! Domain layer for prism
//!
//! This crate contains the core types and pure logic of the multi-agent
//! natural-language-to-SQL system. It has no dependencies on I/O, the async
//! runtime or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Agents
//!
//! Every agent exposes one operation, `process(input, context) -> AgentResult`.
//! [`AgentResult`] is either a payload or an [`ErrorInfo`], never both.
//!
//! ## Processing modes
//!
//! - **Route** (default): classify intent, run one chain from the [`RouteTable`]
//! - **Coordinate**: sequential pipeline, halts on the first error
//! - **Collaborate**: concurrent fan-out, deterministic namespaced merge
//!
//! ## Tools
//!
//! Tools return a [`ToolResponse`] (`{status, ...}`) and never fail past
//! their boundary. Each tool accepts a closed set of actions.

pub mod agent;
pub mod config;
pub mod core;
pub mod monitor;
pub mod nlu;
pub mod orchestration;
pub mod prompt;
pub mod sql;
pub mod tool;
pub mod util;
pub mod visualization;

// Re-export commonly used types
pub use agent::{
    AgentContext, AgentDescriptor, AgentId, AgentInput, AgentResult, AgentRole, Capability, keys,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{
    error::{DomainError, ErrorInfo, ErrorKind},
    query::Query,
};
pub use monitor::{
    AgentStatistics, EventType, ExecutionEvent, ExecutionGraph, GraphEdge, ORCHESTRATOR_ID,
    StatisticsSnapshot,
};
pub use nlu::{Ambiguity, Entity, Intent, NluOutput, ParseError, SCHEMA_CONTEXT_NEED};
pub use orchestration::{
    AgentOutcome, MergeConflict, OrchestrationResult, OrchestrationStatus, ProcessingMode,
    ResultMetadata, RouteChain, RouteTable,
};
pub use prompt::PromptTemplate;
pub use sql::{JoinStep, PerformanceRating, PerformanceReport, Relationship, SqlValidation};
pub use tool::{CONNECTION_PARAM, DatabaseAction, SchemaAction, ToolResponse, ToolStatus};
pub use visualization::{ChartConfig, ChartRecommendation, ChartType, DataAnalysis};
