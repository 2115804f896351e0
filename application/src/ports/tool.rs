//! Tool port
//!
//! Tools are the I/O capabilities agents invoke. `run` has no error channel:
//! every failure comes back as a `{status: "error"}` [`ToolResponse`].

use async_trait::async_trait;
use prism_domain::ToolResponse;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Registry name of the schema introspection tool
pub const SCHEMA_TOOL: &str = "schema";
/// Registry name of the SQL execution tool
pub const DATABASE_TOOL: &str = "database";

#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable registry name
    fn name(&self) -> &str;

    /// Closed set of accepted actions
    fn valid_actions(&self) -> &'static [&'static str];

    /// Run one action. Unknown actions return `valid_actions`.
    async fn run(&self, action: &str, params: &Map<String, Value>) -> ToolResponse;
}

/// Resolves enabled tools by name
pub trait ToolLocator: Send + Sync {
    fn tool(&self, name: &str) -> Option<Arc<dyn Tool>>;

    /// Names of all enabled tools
    fn names(&self) -> Vec<String>;
}
