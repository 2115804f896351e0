//! Agent registry - insertion-ordered, keyed by stable id.

use crate::ports::agent::Agent;
use prism_domain::{AgentId, AgentRole};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Agent already registered: {0}")]
    Duplicate(AgentId),
}

/// Registered agents in insertion order.
///
/// Insertion order is the merge precedence for collaborate mode.
#[derive(Default, Clone)]
pub struct AgentRegistry {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Arc<dyn Agent>) -> Result<(), RegistryError> {
        if self.get(agent.id().as_str()).is_some() {
            return Err(RegistryError::Duplicate(agent.id().clone()));
        }
        self.agents.push(agent);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.id() == id)
    }

    /// First registered agent with `role`
    pub fn by_role(&self, role: AgentRole) -> Option<&Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.descriptor().role == role)
    }

    /// Insertion index of `id`
    pub fn position(&self, id: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.id() == id)
    }

    pub fn ids(&self) -> Vec<&AgentId> {
        self.agents.iter().map(|a| a.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Agent>> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
