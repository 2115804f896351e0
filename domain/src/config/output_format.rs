//! Output format value object

use serde::{Deserialize, Serialize};

/// How an orchestration result is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Result plus every agent's outcome
    Full,
    /// Aggregated result only (default)
    #[default]
    Result,
    /// The whole envelope as JSON
    Json,
}
