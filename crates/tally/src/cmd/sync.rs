//! Sync command - the full fetch, export and load run

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tally_config::Config;
use tally_pipeline::{LoadOutcome, LoadTarget, Pipeline, TransformOptions};
use tally_sinks::{CommandLoader, Exporter, Loader, NullLoader};
use tally_transform::{FieldTypeMap, FlattenOptions};

use super::{StripeArgs, build_stripe};

/// Sync command arguments
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub stripe: StripeArgs,

    /// Output path without extension (overrides [export] stem)
    #[arg(short, long, value_name = "STEM")]
    pub output: Option<String>,

    /// Field type file for coercion (overrides [export] field_types)
    #[arg(long, value_name = "PATH")]
    pub field_types: Option<PathBuf>,

    /// Skip the load step even if [load] is enabled
    #[arg(long)]
    pub no_load: bool,
}

/// Run the sync command
///
/// Exits non-zero if the load step fails, after the export files are written.
pub async fn run(args: SyncArgs, config: &Config) -> Result<ExitCode> {
    let stripe = build_stripe(config, &args.stripe)?;
    let transform = transform_options(&args, config)?;
    let exporter = Exporter::new(args.output.as_deref().unwrap_or(&config.export.stem));
    let loader = build_loader(&args, config)?;
    let target = LoadTarget {
        dataset: config.load.dataset.clone(),
        table: config.load.table.clone(),
        bucket: config.load.bucket.clone(),
    };

    let pipeline = Pipeline::new(stripe, transform, exporter, loader, target);
    let summary = pipeline.run().await.context("sync failed")?;

    println!(
        "fetched {} events, exported {} records",
        summary.events, summary.records
    );
    println!("  tsv:  {}", summary.tsv.display());
    println!("  json: {}", summary.json.display());
    if summary.coercion_warnings > 0 {
        println!("  {} fields omitted by type coercion", summary.coercion_warnings);
    }

    match summary.load {
        LoadOutcome::Loaded { loader } => {
            println!("  load: ok ({})", loader);
            Ok(ExitCode::SUCCESS)
        }
        LoadOutcome::Failed { loader, error } => {
            eprintln!("load failed ({}): {}", loader, error);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn transform_options(args: &SyncArgs, config: &Config) -> Result<TransformOptions> {
    let flatten = FlattenOptions::default()
        .with_separator(config.export.separator.clone())
        .with_max_depth(config.export.max_depth);
    flatten.validate()?;

    let field_types = match args.field_types.as_ref().or(config.export.field_types.as_ref()) {
        Some(path) => Some(
            FieldTypeMap::from_file(path)
                .with_context(|| format!("failed to load field types from {}", path.display()))?,
        ),
        None => None,
    };

    Ok(TransformOptions {
        flatten,
        field_types,
    })
}

fn build_loader(args: &SyncArgs, config: &Config) -> Result<Box<dyn Loader>> {
    if args.no_load || !config.load.enabled {
        return Ok(Box::new(NullLoader));
    }

    let program = config
        .load
        .program
        .clone()
        .context("[load] is enabled but no program is set")?;
    Ok(Box::new(CommandLoader::new(program, config.load.args.clone())?))
}
