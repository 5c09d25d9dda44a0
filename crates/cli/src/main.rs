//! pagetrack CLI — the main entry point.
//!
//! Commands:
//! - `init`    — Write a default config file
//! - `status`  — Show the effective configuration
//! - `doctor`  — Diagnose config and collector reachability
//! - `replay`  — Feed a command buffer through a live tracker

use clap::{Parser, Subcommand};
use pagetrack_config::TrackerConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "pagetrack",
    about = "pagetrack — command-queue activity tracker",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Show the effective configuration
    Status,

    /// Diagnose configuration and collector health
    Doctor,

    /// Attach a tracker to a command buffer and deliver it
    Replay {
        /// JSON file holding the pre-existing buffer (array of wire commands)
        #[arg(short, long)]
        buffer: Option<PathBuf>,

        /// JSON file holding element attribute maps to auto-seed from
        #[arg(short, long)]
        seed: Option<PathBuf>,

        /// Read further wire commands from stdin, one JSON value per line
        #[arg(long)]
        stdin: bool,

        /// Override the collector endpoint
        #[arg(short, long, env = "PAGETRACK_ENDPOINT")]
        endpoint: Option<String>,

        /// Seconds to wait for in-flight deliveries before exiting
        #[arg(short, long, default_value_t = 10)]
        wait: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config may be broken; `doctor` reports that itself.
    let logging = TrackerConfig::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        logging.level
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Replay {
            buffer,
            seed,
            stdin,
            endpoint,
            wait,
        } => {
            commands::replay::run(commands::replay::ReplayArgs {
                buffer,
                seed,
                stdin,
                endpoint,
                wait,
            })
            .await?
        }
    }

    Ok(())
}
