//! Tally - billing events to warehouse tables
//!
//! # Usage
//!
//! ```bash
//! # Full run: fetch, flatten, export, load
//! tally sync --config tally.toml
//! tally sync --start-date 2023-07-01 --max-continuations 10
//!
//! # Fetch only and print the raw events
//! tally pull --output compact
//!
//! # Validate config and show the first request URL (no network)
//! tally check
//! ```
//!
//! The Stripe key is read from `--token`, then `STRIPE_TOKEN` (a `.env`
//! file in the working directory is honoured), then `[stripe] token`.

mod cmd;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tally_config::{Config, LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Tally - billing events to warehouse tables
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch events, export TSV and JSON, then load the TSV
    Sync(cmd::sync::SyncArgs),

    /// Fetch events and print them as JSON
    Pull(cmd::pull::PullArgs),

    /// Validate configuration and print the first request URL
    Check(cmd::check::CheckArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let log_level = resolve_log_level(cli.log_level, &config);
    init_logging(log_level, config.log.format)?;

    match cli.command {
        Command::Sync(args) => cmd::sync::run(args, &config).await,
        Command::Pull(args) => cmd::pull::run(args, &config).await,
        Command::Check(args) => cmd::check::run(args, &config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).with_context(|| match path {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "invalid default configuration".to_string(),
    })
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<LogLevel>, config: &Config) -> LogLevel {
    cli_level.unwrap_or(config.log.level)
}

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so stdout stays clean for `pull` output.
fn init_logging(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level.as_str())
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
