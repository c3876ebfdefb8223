//! Glide CLI: smooth scrolling for discrete mouse wheels.
//!
//! Usage:
//!   glide run [OPTIONS]        Intercept wheel events and scroll smoothly
//!   glide devices [--all]      List input devices and their relevance
//!   glide check                Check system capabilities
//!   glide simulate [OPTIONS]   Print the frames a burst of ticks produces
//!   glide config [--write]     Show or write the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use glide_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "glide",
    about = "Smooth, momentum-based scrolling for mouse wheels",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the per-user config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Intercept wheel events and scroll smoothly until Ctrl+C
    Run {
        /// Do not take exclusive access to relevant devices
        #[arg(long)]
        no_grab: bool,

        /// Jump by whole ticks instead of animating
        #[arg(long)]
        rounded: bool,
    },

    /// List input devices
    Devices {
        /// Include devices that are not pointing devices
        #[arg(long)]
        all: bool,
    },

    /// Check system capabilities
    Check,

    /// Replay a burst of wheel ticks through the animator offline
    Simulate {
        /// Number of ticks in the burst
        #[arg(long, default_value = "3")]
        ticks: u32,

        /// Time between ticks (ms)
        #[arg(long, default_value = "40")]
        interval_ms: u64,

        /// Ticks per wheel event (negative scrolls down)
        #[arg(long, default_value = "1", allow_hyphen_values = true)]
        detents: i32,

        /// Parameter override, e.g. --param friction=1.5 (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Print frames as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write it to the configuration file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    glide_common::logging::init_logging(&logging);
    tracing::debug!(path = ?cli.config, "Configuration loaded");

    match cli.command {
        Commands::Run { no_grab, rounded } => commands::run::run(config, no_grab, rounded).await,
        Commands::Devices { all } => commands::devices::run(&config, all),
        Commands::Check => commands::check::run(&config),
        Commands::Simulate {
            ticks,
            interval_ms,
            detents,
            params,
            json,
        } => commands::simulate::run(&config, ticks, interval_ms, detents, &params, json),
        Commands::Config { write } => commands::config::run(&config, cli.config, write),
    }
}
