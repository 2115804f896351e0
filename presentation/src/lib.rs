//! Presentation layer for prism
//!
//! This crate contains the CLI definition and the console formatters for
//! orchestration results, statistics, the execution graph and events.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, ModeArg, OutputArg};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
