//! CLI entrypoint for prism
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use prism_application::{AgentFactory, EventLogger, NoEventLogger};
use prism_domain::{OutputFormat, Query};
use prism_infrastructure::{ConfigLoader, JsonlEventLogger, ToolRegistry, gateway_from_config};
use prism_presentation::{Cli, ConsoleFormatter};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    config.validate().context("Invalid configuration")?;

    let (team_config, issues) = config.to_team_config();
    for issue in &issues {
        warn!(code = ?issue.code, "{}", issue);
    }

    let Some(question) = cli.question else {
        bail!("A question is required, e.g. prism \"How many customers signed up last month?\"");
    };

    ConsoleFormatter::set_color(config.output.color);
    info!("Starting prism");

    // === Dependency Injection ===
    let gateway = gateway_from_config(&config.llm);
    let tools = ToolRegistry::from_config(&config);
    let logger: Arc<dyn EventLogger> = match &config.monitor.event_log {
        Some(path) => match JsonlEventLogger::new(path) {
            Some(logger) => Arc::new(logger),
            None => {
                warn!(path = %path.display(), "Cannot open event log; events are not archived");
                Arc::new(NoEventLogger)
            }
        },
        None => Arc::new(NoEventLogger),
    };

    let team = AgentFactory::new(&team_config, gateway, &tools)
        .with_logger(logger)
        .build()
        .context("Failed to assemble the agent team")?;

    let mut query = Query::new(question);
    if let Some(mode) = cli.mode {
        query = query.with_mode(mode.into());
    }
    if cli.explain {
        query = query.with_explain();
    }
    let result = team.orchestrator.process(&query).await;

    let format = cli
        .output
        .map(OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();
    println!("{}", ConsoleFormatter::render(&result, format));

    if cli.stats {
        println!("{}", ConsoleFormatter::format_statistics(&team.monitor.get_agent_statistics()));
    }
    if cli.graph {
        println!("{}", ConsoleFormatter::format_graph(&team.monitor.get_execution_graph()));
    }
    if cli.events {
        println!("{}", ConsoleFormatter::format_events(&team.monitor.events()));
    }

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
