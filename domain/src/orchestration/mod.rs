//! Orchestration domain
//!
//! Processing modes, route tables and the result envelope produced by
//! one orchestration run. Dispatch itself lives in the application layer.

pub mod mode;
pub mod routing;
pub mod value_objects;

pub use mode::ProcessingMode;
pub use routing::{RouteChain, RouteTable};
pub use value_objects::{
    AgentOutcome, MergeConflict, OrchestrationResult, OrchestrationStatus, ResultMetadata,
};
