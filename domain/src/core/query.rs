//! Query value object

use crate::orchestration::mode::ProcessingMode;
use serde::{Deserialize, Serialize};

/// A natural-language question submitted for one orchestration run (Value Object)
///
/// Blank text is representable; the orchestrator rejects it with
/// `INVALID_INPUT` before any agent runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode_override: Option<ProcessingMode>,
    /// Attach the query plan to the execution result
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    explain: bool,
}

impl Query {
    /// Create a query that runs in the orchestrator's active mode
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode_override: None,
            explain: false,
        }
    }

    /// Run this query in `mode`, restoring the orchestrator's mode afterwards
    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode_override = Some(mode);
        self
    }

    /// Ask the execution agent for the query plan as well
    pub fn with_explain(mut self) -> Self {
        self.explain = true;
        self
    }

    pub fn explain(&self) -> bool {
        self.explain
    }

    /// Get the query text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the per-call mode override
    pub fn mode_override(&self) -> Option<ProcessingMode> {
        self.mode_override
    }

    /// True when the text is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Query::new(s)
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Query::new(s)
    }
}
