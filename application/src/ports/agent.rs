//! Agent port
//!
//! The single contract every team member implements. Failures are values:
//! `process` returns [`AgentResult::Error`] instead of panicking or
//! returning `Err`. A panic is a contract violation that the orchestrator
//! converts to `AGENT_ERROR` at its dispatch boundary.

use async_trait::async_trait;
use prism_domain::{AgentContext, AgentDescriptor, AgentId, AgentInput, AgentResult, ErrorInfo};

#[async_trait]
pub trait Agent: Send + Sync {
    fn descriptor(&self) -> &AgentDescriptor;

    async fn process(&self, input: &AgentInput, context: &AgentContext) -> AgentResult;

    fn id(&self) -> &AgentId {
        &self.descriptor().id
    }
}

/// `INVALID_INPUT` result for text-bearing roles given empty input.
///
/// Called first thing in `process`, before any model or tool call.
pub fn reject_empty_input(descriptor: &AgentDescriptor, input: &AgentInput) -> Option<AgentResult> {
    (descriptor.role.requires_text_input() && input.is_empty()).then(|| {
        AgentResult::error(ErrorInfo::invalid_input(format!(
            "{} requires non-empty input",
            descriptor.id
        )))
    })
}
