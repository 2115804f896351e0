//! Processing mode definitions for the orchestrator.
//!
//! Defines [`ProcessingMode`], the dispatch strategy an orchestrator applies
//! to each query:
//! - Route: classify once, hand the query to a single agent chain
//! - Coordinate: run the fixed NLU → Schema → SQL → Execution → Visualization pipeline
//! - Collaborate: fan the query out to several agents and merge their payloads

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch strategy for the agent team.
///
/// Exactly one mode is active per orchestrator at any instant. A query may
/// carry an override that applies to that call only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Route: NLU picks exactly one target chain via the route table
    #[default]
    Route,
    /// Coordinate: sequential pipeline, halts on the first failing stage
    Coordinate,
    /// Collaborate: concurrent fan-out, deterministic merge
    Collaborate,
}

impl ProcessingMode {
    /// All modes, in declaration order
    pub const ALL: [ProcessingMode; 3] = [
        ProcessingMode::Route,
        ProcessingMode::Coordinate,
        ProcessingMode::Collaborate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Route => "route",
            ProcessingMode::Coordinate => "coordinate",
            ProcessingMode::Collaborate => "collaborate",
        }
    }

    /// Get a human-readable description of this mode
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingMode::Route => "Route: classify intent, dispatch to one agent chain",
            ProcessingMode::Coordinate => {
                "Coordinate: NLU → Schema → SQL → Execution → Visualization pipeline"
            }
            ProcessingMode::Collaborate => {
                "Collaborate: concurrent fan-out with namespaced merge"
            }
        }
    }

    /// Whether agents in this mode may run concurrently
    pub fn is_concurrent(&self) -> bool {
        matches!(self, ProcessingMode::Collaborate)
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProcessingMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "route" | "r" => Ok(ProcessingMode::Route),
            "coordinate" | "coord" | "c" => Ok(ProcessingMode::Coordinate),
            "collaborate" | "collab" => Ok(ProcessingMode::Collaborate),
            _ => Err(DomainError::InvalidMode(s.to_string())),
        }
    }
}
