//! CLI command definitions

use clap::{Parser, ValueEnum};
use prism_domain::{OutputFormat, ProcessingMode};
use std::path::PathBuf;

/// Processing mode for a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// NLU classifies the intent; one agent chain handles it
    Route,
    /// Every stage in order, stopping at the first failure
    Coordinate,
    /// Configured agents run concurrently; outputs are merged
    Collaborate,
}

impl From<ModeArg> for ProcessingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Route => ProcessingMode::Route,
            ModeArg::Coordinate => ProcessingMode::Coordinate,
            ModeArg::Collaborate => ProcessingMode::Collaborate,
        }
    }
}

/// Output format for orchestration results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    /// Result plus each agent's outcome
    Full,
    /// Only the aggregated result
    Result,
    /// The whole result envelope as JSON
    Json,
}

impl From<OutputArg> for OutputFormat {
    fn from(format: OutputArg) -> Self {
        match format {
            OutputArg::Full => OutputFormat::Full,
            OutputArg::Result => OutputFormat::Result,
            OutputArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for prism
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about = "Ask your database questions in plain language")]
#[command(long_about = r#"
Prism answers natural-language questions about a SQLite database with a
team of agents: NLU, Schema, SQL generation, Execution and Visualization,
observed by a Monitor.

Processing modes:
  route        NLU classifies the intent; one agent chain handles it
  coordinate   every stage runs in order, stopping at the first failure
  collaborate  configured agents run concurrently and their outputs merge

Configuration files are loaded from (in priority order):
1. PRISM_<SECTION>__<KEY>              Environment
2. --config <path>                     Explicit config file
3. ./prism.toml                        Project-level config
4. ~/.config/prism/config.toml         Global config

Example:
  prism "How many orders did each customer place?"
  prism --mode coordinate --output full "Show monthly revenue trend"
  prism --stats --graph "Top 5 products by sales"
  prism --explain --output json "Orders per customer"
"#)]
pub struct Cli {
    /// The question to ask (not required with --show-config)
    pub question: Option<String>,

    /// Processing mode for this run (defaults to team.default_mode)
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Output format (defaults to output.format, then "result")
    #[arg(short, long, value_enum)]
    pub output: Option<OutputArg>,

    /// Attach the SQLite query plan to the execution result
    #[arg(long)]
    pub explain: bool,

    /// Print per-agent statistics after the run
    #[arg(long)]
    pub stats: bool,

    /// Print the agent call graph after the run
    #[arg(long)]
    pub graph: bool,

    /// Print the monitor's event log after the run
    #[arg(long)]
    pub events: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command() {
        let cli = Cli::try_parse_from([
            "prism",
            "--mode",
            "collaborate",
            "-o",
            "json",
            "--stats",
            "--explain",
            "-vv",
            "list customers",
        ])
        .unwrap();
        assert_eq!(cli.question.as_deref(), Some("list customers"));
        assert_eq!(cli.mode.map(ProcessingMode::from), Some(ProcessingMode::Collaborate));
        assert_eq!(cli.output.map(OutputFormat::from), Some(OutputFormat::Json));
        assert!(cli.stats);
        assert!(cli.explain);
        assert!(!cli.graph);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["prism", "--mode", "swarm", "q"]).is_err());
    }

    #[test]
    fn test_show_config_needs_no_question() {
        let cli = Cli::try_parse_from(["prism", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.question.is_none());
    }
}
