//! Agent domain module
//!
//! Identity ([`AgentDescriptor`]) and the uniform `process` contract types
//! ([`AgentInput`], [`AgentContext`], [`AgentResult`]).

pub mod entities;
pub mod value_objects;

pub use entities::{AgentDescriptor, AgentId, AgentRole, Capability};
pub use value_objects::{AgentContext, AgentInput, AgentResult, keys};
