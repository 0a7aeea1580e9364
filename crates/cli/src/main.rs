//! PolicyQA CLI
//!
//! Main entry point for the policyqa command-line tool.
//! Answers employee questions from internal policy documents.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ClassifyCommand, CleanCommand, IngestCommand, StatsCommand};
use policyqa_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// PolicyQA - grounded answers from internal policy documents
#[derive(Parser, Debug)]
#[command(name = "policyqa")]
#[command(about = "Grounded answers from internal policy documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "POLICYQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "POLICYQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Generative provider (ollama, gemini)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the policy documents into the index
    Ingest(IngestCommand),

    /// Ask a question about company policies
    Ask(AskCommand),

    /// Show which department a question is routed to
    Classify(ClassifyCommand),

    /// Show index statistics
    Stats(StatsCommand),

    /// Remove every entry from the index
    Clean(CleanCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest(_) => "ingest",
            Commands::Ask(_) => "ask",
            Commands::Classify(_) => "classify",
            Commands::Stats(_) => "stats",
            Commands::Clean(_) => "clean",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let mut config = AppConfig::default();
    if let Some(workspace) = cli.workspace {
        config.workspace = workspace;
    }
    config.config_file = cli.config;

    let config = config
        .apply_file_and_env()
        .context("Failed to load configuration")?
        .with_overrides(
            cli.provider,
            cli.model,
            cli.log_level,
            cli.verbose,
            cli.no_color,
            cli.json_logs,
        );

    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        config.log_format(),
    )?;

    tracing::info!("PolicyQA starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_state_dir()?;

    let command_name = cli.command.name();
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Classify(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Clean(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("policyqa {} failed", command_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_global_flags() {
        let cli = Cli::parse_from([
            "policyqa",
            "ask",
            "Como configuro a VPN?",
            "--json",
            "--provider",
            "gemini",
        ]);

        assert_eq!(cli.provider.as_deref(), Some("gemini"));
        match cli.command {
            Commands::Ask(cmd) => {
                assert_eq!(cmd.question.as_deref(), Some("Como configuro a VPN?"));
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ingest_rebuild() {
        let cli = Cli::parse_from(["policyqa", "ingest", "--rebuild"]);
        assert_eq!(cli.command.name(), "ingest");
        assert!(matches!(cli.command, Commands::Ingest(IngestCommand { rebuild: true, .. })));
    }
}
