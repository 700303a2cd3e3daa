//! Tally Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid configuration: every section is optional.
//!
//! # Parsing
//!
//! ```
//! use tally_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[export]\nstem = \"out/subscriptions\"").unwrap();
//! assert_eq!(config.export.stem, "out/subscriptions");
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//!
//! [stripe]
//! category = "customer.subscription.*"
//! start_date = "2023-07-01"
//! max_continuations = 10
//!
//! [export]
//! stem = "exports/output"
//! field_types = "schemas/subscriptions.json"
//!
//! [load]
//! enabled = true
//! program = "scripts/bq-load.sh"
//! args = ["{bucket}", "{dataset}.{table}", "{file}"]
//! ```
//!
//! The `[stripe]` section is kept as raw TOML here and parsed by the
//! connector crate, which owns its schema.

mod error;
mod export;
mod load;
mod logging;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use export::ExportConfig;
pub use load::LoadConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Raw Stripe connector settings
    pub stripe: toml::Table,

    /// File export settings
    pub export: ExportConfig,

    /// Warehouse load settings
    pub load: LoadConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Load from a file if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// The `[stripe]` section as a TOML value for the connector parser
    pub fn stripe_value(&self) -> toml::Value {
        toml::Value::Table(self.stripe.clone())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
