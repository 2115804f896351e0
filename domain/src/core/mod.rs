//! Core domain concepts shared across all subdomains.
//!
//! - [`query::Query`] - a question submitted for one orchestration run
//! - [`error::ErrorInfo`] / [`error::ErrorKind`] - the user-visible error taxonomy
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod query;
