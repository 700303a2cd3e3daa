//! Pull command - fetch events without exporting
//!
//! Prints the raw events (not flattened) as a JSON array.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tally_config::Config;
use tally_connectors::Connector;

use super::{StripeArgs, build_stripe};

/// Pull command arguments
#[derive(Args, Debug)]
pub struct PullArgs {
    #[command(flatten)]
    pub stripe: StripeArgs,

    /// Output format: json (default), compact
    #[arg(short, long, default_value = "json")]
    pub output: String,
}

/// Run the pull command
pub async fn run(args: PullArgs, config: &Config) -> Result<ExitCode> {
    let stripe = build_stripe(config, &args.stripe)?;

    tracing::info!(
        connector = "stripe",
        category = stripe.category().unwrap_or_default(),
        start_ts = stripe.start_ts().unwrap_or_default(),
        "pulling events"
    );

    let events = stripe
        .pull()
        .await
        .context("failed to pull from Stripe")?;

    match args.output.as_str() {
        "compact" => println!("{}", serde_json::to_string(&events)?),
        "json" => println!("{}", serde_json::to_string_pretty(&events)?),
        other => anyhow::bail!("unknown output format '{}', expected json or compact", other),
    }

    Ok(ExitCode::SUCCESS)
}
