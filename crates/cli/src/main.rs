//! CareGuide CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP gateway
//! - `ask`: Answer a single question
//! - `history`: Show the most recent exchanges
//! - `reindex`: Rebuild the knowledge index from the manual
//! - `status`: Show configuration and index state
//! - `doctor`: Diagnose backends and files

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod bootstrap;
mod commands;

#[derive(Parser)]
#[command(
    name = "careguide",
    about = "CareGuide — grounded assistant for family caregivers of people with dementia",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config.toml (defaults to ~/.careguide/config.toml)
    #[arg(short, long, global = true, env = "CAREGUIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question
    Ask {
        /// The caregiver's question
        #[arg(short, long)]
        message: String,
    },

    /// Show the most recent exchanges
    History {
        /// How many exchanges to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Rebuild the knowledge index, ignoring the cache
    Reindex,

    /// Show configuration and index state
    Status,

    /// Diagnose backends and files
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask { message } => commands::ask::run(config_path, &message).await?,
        Commands::History { limit } => commands::history::run(config_path, limit).await?,
        Commands::Reindex => commands::reindex::run(config_path).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
