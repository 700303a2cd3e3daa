//! Check command - validate configuration without touching the network

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tally_config::Config;
use tally_connectors::query::decode_nested;
use tally_connectors::{Stripe, StripeConnectorConfig};
use tally_transform::FieldTypeMap;

use super::{StripeArgs, stripe_settings};

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub stripe: StripeArgs,
}

/// Run the check command
///
/// Prints the first request URL and its decoded parameters. A missing
/// token is reported and makes the check fail, but the URL is still shown.
pub fn run(args: CheckArgs, config: &Config) -> Result<ExitCode> {
    let settings = stripe_settings(config, &args.stripe)?;
    let has_token = settings.token.as_deref().is_some_and(|t| !t.is_empty());

    // The URL does not depend on the key, so any non-empty one will do
    let probe = StripeConnectorConfig {
        token: Some("sk_check".to_string()),
        ..settings
    };
    let stripe = Stripe::from_config(&probe).context("failed to create Stripe connector")?;
    let url = stripe.build_url(None)?;

    println!("request: GET {}", url);
    if let Some((_, query)) = url.split_once('?') {
        println!("{}", serde_json::to_string_pretty(&decode_nested(query))?);
    }
    println!("continuations: {}", probe.max_continuations);

    if let Some(ref path) = config.export.field_types {
        let types = FieldTypeMap::from_file(path)
            .with_context(|| format!("failed to load field types from {}", path.display()))?;
        println!("field types: {} fields from {}", types.len(), path.display());
    }

    println!(
        "export: {}.tsv, {}.json",
        config.export.stem, config.export.stem
    );
    match (config.load.enabled, config.load.program.as_deref()) {
        (true, Some(program)) => println!(
            "load: {} into {}.{}",
            program, config.load.dataset, config.load.table
        ),
        _ => println!("load: disabled"),
    }

    if !has_token {
        eprintln!("error: no Stripe token (use --token, STRIPE_TOKEN or [stripe] token)");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
