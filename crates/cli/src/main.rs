//! Magnet CLI
//!
//! Main entry point for the magnet command-line tool.
//! Plans and runs incremental syncs of knowledge sources into a chunk store.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ChunkCommand, PlanCommand, PromptsCommand, SyncCommand};
use magnet_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Magnet - incremental knowledge source sync and chunking
#[derive(Parser, Debug)]
#[command(name = "magnet")]
#[command(about = "Incremental knowledge source sync and chunking", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "MAGNET_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MAGNET_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// LLM provider used for chunk transformation (openai, ollama)
    #[arg(short, long, global = true, env = "MAGNET_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "MAGNET_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show what a sync would add and delete
    Plan(PlanCommand),

    /// Chunk a single record and print the documents
    Chunk(ChunkCommand),

    /// Incrementally sync a source into a collection
    Sync(SyncCommand),

    /// List or show prompt templates
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;

    // An explicit --config wins over the default .magnet/config.yaml
    if let Some(path) = &cli.config {
        config = config.merge_yaml(path)?;
    }

    let mut config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.log_json |= cli.log_json;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Magnet CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_magnet_dir()?;

    let command_name = match &cli.command {
        Commands::Plan(_) => "plan",
        Commands::Chunk(_) => "chunk",
        Commands::Sync(_) => "sync",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Plan(cmd) => cmd.execute(&config).await,
        Commands::Chunk(cmd) => cmd.execute(&config).await,
        Commands::Sync(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
