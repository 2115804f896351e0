//! SQL text handling: extraction from LLM output, statement classification,
//! schema validation, join paths and post-execution performance analysis.

pub mod extract;
pub mod join_paths;
pub mod performance;
pub mod validate;

pub use extract::{extract_sql, is_read_only, split_statements};
pub use join_paths::{JoinPaths, JoinStep, Relationship, join_paths};
pub use performance::{PerformanceRating, PerformanceReport, analyze_performance};
pub use validate::{IssueKind, SchemaCatalog, SqlValidation, ValidationIssue, validate_sql};
