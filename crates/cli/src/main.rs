//! Wayfinder CLI
//!
//! Main entry point for the wayfinder command-line tool.
//! Resolves retrieval context from internal and web sources and runs the
//! asynchronous web search workers.

mod commands;
mod services;

use clap::{Parser, Subcommand};
use commands::{QueueCommand, ResolveCommand, SubmitCommand, WorkerCommand};
use std::path::PathBuf;
use wayfinder_core::{config::AppConfig, logging, AppResult};

/// Wayfinder - retrieval source routing and web search pipeline
#[derive(Parser, Debug)]
#[command(name = "wayfinder")]
#[command(about = "Retrieval source routing and context fusion", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "WAYFINDER_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "WAYFINDER_CONFIG")]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve fused context for a query
    Resolve(ResolveCommand),

    /// Queue a web search
    Submit(SubmitCommand),

    /// Run the web search worker pool
    Worker(WorkerCommand),

    /// Inspect the web search queue
    Queue(QueueCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration for the selected workspace, then apply CLI overrides
    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    config.validate()?;

    tracing::info!("Wayfinder CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Search provider: {}", config.search.provider);

    config.ensure_wayfinder_dir()?;

    let command_name = match &cli.command {
        Commands::Resolve(_) => "resolve",
        Commands::Submit(_) => "submit",
        Commands::Worker(_) => "worker",
        Commands::Queue(_) => "queue",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Resolve(cmd) => cmd.execute(&config).await,
        Commands::Submit(cmd) => cmd.execute(&config).await,
        Commands::Worker(cmd) => cmd.execute(&config).await,
        Commands::Queue(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
