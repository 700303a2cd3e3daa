//! Command implementations for the tally CLI

pub mod check;
pub mod pull;
pub mod sync;

use anyhow::{Context, Result};
use clap::Args;
use tally_config::Config;
use tally_connectors::{Stripe, StripeConnectorConfig};

/// Stripe flags shared by every command; each overrides `[stripe]`
#[derive(Args, Debug, Default)]
pub struct StripeArgs {
    /// Stripe secret key
    #[arg(long, env = "STRIPE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Lower bound of the time window (YYYY-MM-DD). Default: now minus lead time
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<String>,

    /// Event type selector, e.g. customer.subscription.*
    #[arg(long)]
    pub selector: Option<String>,

    /// Additional pages to follow after the first
    #[arg(long, value_name = "N")]
    pub max_continuations: Option<u32>,
}

/// Merge `[stripe]` with command-line overrides and validate the result
pub fn stripe_settings(config: &Config, args: &StripeArgs) -> Result<StripeConnectorConfig> {
    let mut settings = StripeConnectorConfig::from_toml(&config.stripe_value())
        .context("invalid [stripe] configuration")?;

    if let Some(ref token) = args.token {
        settings.token = Some(token.clone());
    }
    if let Some(ref date) = args.start_date {
        settings.start_date = Some(date.clone());
    }
    if let Some(ref selector) = args.selector {
        settings.category = selector.clone();
    }
    if let Some(n) = args.max_continuations {
        settings.max_continuations = n;
    }

    settings.validate().context("invalid Stripe settings")?;
    Ok(settings)
}

/// Build a ready-to-fetch Stripe connector
pub fn build_stripe(config: &Config, args: &StripeArgs) -> Result<Stripe> {
    let settings = stripe_settings(config, args)?;
    Stripe::from_config(&settings).context("failed to create Stripe connector")
}
