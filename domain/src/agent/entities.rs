//! Agent domain entities - identity, role and capabilities of team members.
//!
//! An [`AgentDescriptor`] is created once by the factory from configuration
//! and never changes afterwards. The orchestrator's registry owns it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identifier of a registered agent (e.g. `"sql_generation"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for AgentId {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The specialist role an agent plays in the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Nlu,
    Schema,
    SqlGeneration,
    Execution,
    Visualization,
    Monitor,
}

impl AgentRole {
    /// Id used when configuration does not name the agent explicitly
    pub fn default_id(&self) -> &'static str {
        match self {
            AgentRole::Nlu => "nlu",
            AgentRole::Schema => "schema",
            AgentRole::SqlGeneration => "sql_generation",
            AgentRole::Execution => "execution",
            AgentRole::Visualization => "visualization",
            AgentRole::Monitor => "monitor",
        }
    }

    /// Key under which this role's payload is stored in the shared context
    /// and in collaborate-mode merged results.
    pub fn output_key(&self) -> &'static str {
        match self {
            AgentRole::Nlu => "nlu",
            AgentRole::Schema => "schema",
            AgentRole::SqlGeneration => "sql",
            AgentRole::Execution => "execution",
            AgentRole::Visualization => "visualization",
            AgentRole::Monitor => "monitor",
        }
    }

    /// Roles whose input must be non-empty text
    pub fn requires_text_input(&self) -> bool {
        matches!(
            self,
            AgentRole::Nlu | AgentRole::SqlGeneration | AgentRole::Execution
        )
    }

    pub fn default_capabilities(&self) -> BTreeSet<Capability> {
        let caps: &[Capability] = match self {
            AgentRole::Nlu => &[Capability::IntentClassification, Capability::EntityExtraction],
            AgentRole::Schema => &[Capability::SchemaIntrospection, Capability::TermMapping],
            AgentRole::SqlGeneration => &[Capability::SqlGeneration],
            AgentRole::Execution => &[Capability::SqlExecution],
            AgentRole::Visualization => &[Capability::ChartRecommendation],
            AgentRole::Monitor => &[Capability::Monitoring],
        };
        caps.iter().copied().collect()
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_id())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nlu" => Ok(AgentRole::Nlu),
            "schema" => Ok(AgentRole::Schema),
            "sql_generation" | "sql" => Ok(AgentRole::SqlGeneration),
            "execution" => Ok(AgentRole::Execution),
            "visualization" | "viz" => Ok(AgentRole::Visualization),
            "monitor" => Ok(AgentRole::Monitor),
            _ => Err(format!("Invalid AgentRole: {}", s)),
        }
    }
}

/// A capability an agent advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    IntentClassification,
    EntityExtraction,
    SchemaIntrospection,
    TermMapping,
    SqlGeneration,
    SqlExecution,
    ChartRecommendation,
    Monitoring,
}

/// Identity card of a registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: AgentId,
    pub role: AgentRole,
    pub capabilities: BTreeSet<Capability>,
}

impl AgentDescriptor {
    /// Descriptor with the role's default capabilities
    pub fn new(id: impl Into<AgentId>, role: AgentRole) -> Self {
        Self {
            id: id.into(),
            role,
            capabilities: role.default_capabilities(),
        }
    }

    /// Descriptor using the role's default id
    pub fn for_role(role: AgentRole) -> Self {
        Self::new(role.default_id(), role)
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn output_key(&self) -> &'static str {
        self.role.output_key()
    }
}
