//! Connector configuration types
//!
//! Each connector defines its own config struct here.
//! Configs are parsed from raw TOML values provided by the config crate.

use crate::error::ConnectorError;
use crate::resilience::{ResilienceConfig, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use chrono_tz::Tz;
use serde::Deserialize;
use std::time::Duration;

/// Default Stripe events endpoint
pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com/v1/events";

/// Default event type selector
pub const DEFAULT_CATEGORY: &str = "customer.subscription.*";

/// How far behind "now" the default window starts
pub const DEFAULT_LEAD_TIME_MINS: u64 = 75;

/// Pause between consecutive page requests
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1000;

/// Additional pages followed after the first
pub const DEFAULT_MAX_CONTINUATIONS: u32 = 1;

/// Stripe connector configuration
///
/// Pulls billing events from the Stripe events API.
///
/// # Example
///
/// ```toml
/// [stripe]
/// token = "sk_live_xxx"              # optional, falls back to STRIPE_TOKEN
/// category = "customer.subscription.*"
/// start_date = "2023-07-01"          # optional, default: now - lead_time_mins
/// timezone = "UTC"                   # reference zone for start_date
/// max_continuations = 10             # pages followed after the first
/// page_delay_ms = 1000
/// page_size = 100                    # optional, Stripe `limit`
/// timeout_secs = 30
/// max_retries = 0                    # retries per request on transient failure
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StripeConnectorConfig {
    /// Stripe secret key (optional here, the CLI may supply it)
    pub token: Option<String>,

    /// Events endpoint (default: https://api.stripe.com/v1/events)
    pub api_url: String,

    /// Event type selector, e.g. `customer.subscription.*`
    pub category: String,

    /// Lower bound of the time window (YYYY-MM-DD)
    pub start_date: Option<String>,

    /// IANA timezone used to resolve `start_date` to midnight
    pub timezone: String,

    /// Lead time subtracted from "now" when no start date is given
    pub lead_time_mins: u64,

    /// Maximum additional pages to follow after the first
    pub max_continuations: u32,

    /// Pause between page requests in milliseconds
    pub page_delay_ms: u64,

    /// Records per page (Stripe `limit`, 1-100)
    pub page_size: Option<u32>,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Maximum retry attempts for transient failures (default: 0)
    pub max_retries: u32,
}

impl Default for StripeConnectorConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            start_date: None,
            timezone: "UTC".to_string(),
            lead_time_mins: DEFAULT_LEAD_TIME_MINS,
            max_continuations: DEFAULT_MAX_CONTINUATIONS,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            page_size: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl StripeConnectorConfig {
    /// Parse config from raw TOML value
    pub fn from_toml(value: &toml::Value) -> Result<Self, ConnectorError> {
        let config: StripeConnectorConfig = value
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| {
                ConnectorError::Config(format!("Invalid Stripe config: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check field values that serde cannot
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.category.trim().is_empty() {
            return Err(ConnectorError::config("Stripe category must not be empty"));
        }

        if self.api_url.trim().is_empty() {
            return Err(ConnectorError::config("Stripe api_url must not be empty"));
        }

        if let Some(limit) = self.page_size
            && !(1..=100).contains(&limit)
        {
            return Err(ConnectorError::config(format!(
                "Stripe page_size must be between 1 and 100, got {}",
                limit
            )));
        }

        self.tz()?;
        self.lead_time()?;

        if let Some(ref date) = self.start_date {
            crate::date::start_of_day(date, Tz::UTC)?;
        }

        Ok(())
    }

    /// Resolve the configured timezone
    pub fn tz(&self) -> Result<Tz, ConnectorError> {
        self.timezone.parse::<Tz>().map_err(|e| {
            ConnectorError::Config(format!("Unknown timezone '{}': {}", self.timezone, e))
        })
    }

    /// Lead time as a duration
    pub fn lead_time(&self) -> Result<Duration, ConnectorError> {
        self.lead_time_mins
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConnectorError::config(format!(
                    "Stripe lead_time_mins is too large: {}",
                    self.lead_time_mins
                ))
            })
    }

    /// Build resilience config from these settings
    pub fn resilience_config(&self) -> ResilienceConfig {
        ResilienceConfig {
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            ..Default::default()
        }
    }
}
