//! Configuration validation
//!
//! Checks the sections owned by this crate:
//! - Export stem and flattening options are usable
//! - An enabled loader names a program and a destination
//!
//! `[stripe]` is validated by the connector when it parses the section.

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_export(config)?;
    validate_load(config)?;
    Ok(())
}

fn validate_export(config: &Config) -> Result<()> {
    let export = &config.export;

    if export.stem.trim().is_empty() {
        return Err(ConfigError::invalid_value("export", "stem", "must not be empty"));
    }

    if export.separator.is_empty() {
        return Err(ConfigError::invalid_value(
            "export",
            "separator",
            "must not be empty",
        ));
    }

    if export.max_depth == 0 {
        return Err(ConfigError::invalid_value(
            "export",
            "max_depth",
            "must be at least 1",
        ));
    }

    Ok(())
}

fn validate_load(config: &Config) -> Result<()> {
    let load = &config.load;
    if !load.enabled {
        return Ok(());
    }

    match load.program.as_deref() {
        Some(program) if !program.trim().is_empty() => {}
        _ => return Err(ConfigError::missing_field("load", "program")),
    }

    for (field, value) in [
        ("dataset", &load.dataset),
        ("table", &load.table),
        ("bucket", &load.bucket),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::invalid_value("load", field, "must not be empty"));
        }
    }

    Ok(())
}
