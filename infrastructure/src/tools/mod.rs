//! Tool implementations for the agent team
//!
//! - `schema`: catalog introspection and user-term mapping
//! - `database`: SQL execution with row caps and write protection
//!
//! Both run against SQLite through a shared, lazily built connection pool.

mod connection;
mod database;
mod introspect;
mod registry;
mod schema;

pub use connection::{ConnectionHandle, DbPool, SqlToolError};
pub use database::{DatabaseTool, QueryLimits};
pub use registry::ToolRegistry;
pub use schema::SchemaTool;
