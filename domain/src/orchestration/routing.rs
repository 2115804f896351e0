//! Route-mode intent → agent chain mapping.

use crate::agent::entities::AgentId;
use crate::core::error::DomainError;
use crate::nlu::entities::Intent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Ordered agents invoked for one route, e.g. `sql_generation>execution`.
///
/// Each link receives the previous links' outputs in its context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteChain(Vec<AgentId>);

impl RouteChain {
    pub fn new(agents: Vec<AgentId>) -> Result<Self, DomainError> {
        if agents.is_empty() {
            return Err(DomainError::InvalidRoute("route chain is empty".into()));
        }
        Ok(Self(agents))
    }

    pub fn agents(&self) -> &[AgentId] {
        &self.0
    }

    pub fn first(&self) -> &AgentId {
        &self.0[0]
    }
}

impl FromStr for RouteChain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let agents: Vec<AgentId> = s
            .split(['>', ','])
            .map(|part| part.trim_matches(|c: char| c.is_whitespace() || c == '-'))
            .filter(|part| !part.is_empty())
            .map(AgentId::from)
            .collect();
        Self::new(agents).map_err(|_| DomainError::InvalidRoute(format!("'{}'", s)))
    }
}

impl TryFrom<String> for RouteChain {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RouteChain> for String {
    fn from(chain: RouteChain) -> Self {
        chain.to_string()
    }
}

impl fmt::Display for RouteChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.0.iter().map(AgentId::as_str).collect();
        f.write_str(&parts.join(">"))
    }
}

/// Static intent → chain table with a default for unmapped intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: BTreeMap<Intent, RouteChain>,
    default: RouteChain,
}

impl RouteTable {
    pub fn new(default: RouteChain) -> Self {
        Self {
            routes: BTreeMap::new(),
            default,
        }
    }

    pub fn with_route(mut self, intent: Intent, chain: RouteChain) -> Self {
        self.routes.insert(intent, chain);
        self
    }

    pub fn set_route(&mut self, intent: Intent, chain: RouteChain) {
        self.routes.insert(intent, chain);
    }

    pub fn set_default(&mut self, chain: RouteChain) {
        self.default = chain;
    }

    /// Chain for `intent`; `Unknown` and unmapped intents use the default.
    pub fn resolve(&self, intent: Intent) -> &RouteChain {
        self.routes.get(&intent).unwrap_or(&self.default)
    }

    pub fn default_chain(&self) -> &RouteChain {
        &self.default
    }

    pub fn routes(&self) -> impl Iterator<Item = (&Intent, &RouteChain)> {
        self.routes.iter()
    }

    /// Every agent id any route refers to
    pub fn referenced_agents(&self) -> Vec<&AgentId> {
        let mut ids: Vec<&AgentId> = self
            .routes
            .values()
            .chain(std::iter::once(&self.default))
            .flat_map(|c| c.agents())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

fn chain(ids: &[&str]) -> RouteChain {
    RouteChain(ids.iter().map(|id| AgentId::from(*id)).collect())
}

impl Default for RouteTable {
    fn default() -> Self {
        let retrieval = chain(&["sql_generation", "execution"]);
        let charted = chain(&["sql_generation", "execution", "visualization"]);
        RouteTable::new(chain(&["sql_generation"]))
            .with_route(Intent::DataRetrieval, retrieval.clone())
            .with_route(Intent::ReportGeneration, retrieval.clone())
            .with_route(Intent::Aggregation, retrieval.clone())
            .with_route(Intent::Comparison, retrieval)
            .with_route(Intent::TrendAnalysis, charted.clone())
            .with_route(Intent::Prediction, charted.clone())
            .with_route(Intent::AnomalyDetection, charted)
    }
}
