//! Tool domain module
//!
//! Tools are the I/O capabilities agents invoke (schema introspection, SQL
//! execution). The wire contract is `run(action, params) -> {status, ...}`:
//!
//! - [`ToolResponse`] - `status` plus flattened fields, never an `Err`
//! - [`SchemaAction`] / [`DatabaseAction`] - each tool's closed action set
//!
//! Unknown actions produce `{status: "error", valid_actions: [...]}`.

pub mod actions;
pub mod value_objects;

pub use actions::{CONNECTION_PARAM, DatabaseAction, SchemaAction};
pub use value_objects::{ToolResponse, ToolStatus};
