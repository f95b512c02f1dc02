//! Binary entry point for feedgc.
//!
//! Runs the Feed garbage collectors against a file-backed store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use commands::{cmd_gc, cmd_gc_actions, cmd_status};
use feedgc::config::FeedGcConfig;
use feedgc::observability::{self, LoggingConfig, RequestContext, enter_request_context};
use std::path::PathBuf;
use std::process::ExitCode;

/// Feedgc - garbage collection for Feed stream storage.
#[derive(Parser)]
#[command(name = "feedgc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Sweep unreachable content from the content store.
    Gc {
        /// Data directory (overrides config).
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Accessible content IDs (comma-separated).
        #[arg(short, long, value_delimiter = ',')]
        accessible: Vec<String>,

        /// Reserved content IDs (comma-separated).
        #[arg(short, long, value_delimiter = ',')]
        reserved: Vec<String>,

        /// Keep every shared-state entry.
        #[arg(long)]
        keep_shared_states: bool,

        /// Deferrals tolerated before the sweep is forced.
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Rewrite the dismiss journal, dropping actions on missing content.
    GcActions {
        /// Data directory (overrides config).
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Content IDs that still exist (comma-separated).
        #[arg(long, value_delimiter = ',')]
        valid: Vec<String>,
    },

    /// Show entry counts for a store.
    Status {
        /// Data directory (overrides config).
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(config.logging.as_ref(), cli.verbose);
    if let Err(e) = observability::init(logging) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    let _request = enter_request_context(RequestContext::new());
    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: FeedGcConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Gc {
            data_dir,
            accessible,
            reserved,
            keep_shared_states,
            max_attempts,
        } => {
            let mut config = with_data_dir(config, data_dir);
            if keep_shared_states {
                config = config.with_keep_shared_states(true);
            }
            if let Some(attempts) = max_attempts {
                config = config.with_maximum_gc_attempts(attempts);
            }
            cmd_gc(config, accessible, reserved)
        },

        Commands::GcActions { data_dir, valid } => {
            cmd_gc_actions(with_data_dir(config, data_dir), valid)
        },

        Commands::Status { data_dir } => cmd_status(with_data_dir(config, data_dir)),
    }
}

fn with_data_dir(config: FeedGcConfig, data_dir: Option<PathBuf>) -> FeedGcConfig {
    match data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    }
}

/// Loads configuration: explicit file, `FEEDGC_CONFIG_PATH`, or the default
/// location, then environment overrides.
fn load_config(path: Option<&str>) -> Result<FeedGcConfig, Box<dyn std::error::Error>> {
    if let Some(config_path) = path {
        return Ok(FeedGcConfig::load_from_file(std::path::Path::new(config_path))?
            .with_env_overrides());
    }

    if let Ok(config_path) = std::env::var("FEEDGC_CONFIG_PATH") {
        if !config_path.trim().is_empty() {
            return Ok(
                FeedGcConfig::load_from_file(std::path::Path::new(&config_path))?
                    .with_env_overrides(),
            );
        }
    }

    Ok(FeedGcConfig::load_default().with_env_overrides())
}
