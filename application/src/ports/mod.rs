//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent;
pub mod event_logger;
pub mod event_sink;
pub mod llm_gateway;
pub mod tool;
