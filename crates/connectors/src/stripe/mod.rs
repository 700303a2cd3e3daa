//! Stripe connector for pulling billing events
//!
//! Fetches events from the Stripe events API, following cursor pagination
//! (`starting_after=<last id>`) for as many pages as the continuation budget
//! allows.
//!
//! # Example
//!
//! ```ignore
//! use tally_connectors::{FetchOptions, Stripe, StripeConfig};
//!
//! let mut stripe = Stripe::new(StripeConfig::new("sk_live_xxx"))?;
//! stripe.set_start_date(Some("2023-07-01"))?;
//! stripe.set_category_selector("customer.subscription.*");
//!
//! let events = stripe.fetch_all(FetchOptions::default()).await?;
//! ```

use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::date::start_of_day;
use crate::config::{
    DEFAULT_LEAD_TIME_MINS, DEFAULT_MAX_CONTINUATIONS, DEFAULT_PAGE_DELAY_MS,
    DEFAULT_STRIPE_API_URL, StripeConnectorConfig,
};
use crate::error::{ConnectorError, RequestFailure, Result};
use crate::event::{Event, EventPage};
use crate::query::encode_nested;
use crate::resilience::{ResilienceConfig, execute_with_retry};
use crate::traits::Connector;

#[cfg(test)]
mod tests;

/// Stripe connector configuration (simple version for CLI)
#[derive(Debug)]
pub struct StripeConfig {
    /// Stripe secret key, sent as a bearer token
    pub token: SecretString,
    /// Events endpoint (default: https://api.stripe.com/v1/events)
    pub api_url: String,
    /// Reference timezone for calendar start dates
    pub timezone: Tz,
    /// Lead time subtracted from "now" when no start date is given
    pub lead_time: Duration,
    /// Records per page (Stripe `limit`)
    pub page_size: Option<u32>,
    /// Pause between consecutive page requests
    pub page_delay: Duration,
    /// Continuation budget used by [`Connector::pull`]
    pub max_continuations: u32,
    /// Timeout and transient-retry settings
    pub resilience: ResilienceConfig,
}

impl StripeConfig {
    /// Defaults for everything but the token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            timezone: Tz::UTC,
            lead_time: Duration::from_secs(DEFAULT_LEAD_TIME_MINS * 60),
            page_size: None,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            max_continuations: DEFAULT_MAX_CONTINUATIONS,
            resilience: ResilienceConfig::default(),
        }
    }
}

/// Where to start and how far to paginate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Start after this event id (None = first page)
    pub cursor: Option<String>,
    /// Additional pages to follow after the first one
    pub max_continuations: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cursor: None,
            max_continuations: DEFAULT_MAX_CONTINUATIONS,
        }
    }
}

/// Stripe connector for fetching billing events
pub struct Stripe {
    token: SecretString,
    api_url: String,
    client: reqwest::Client,
    /// Lower bound of the time window (seconds since epoch)
    start_ts: Option<i64>,
    /// Event type selector
    category: Option<String>,
    timezone: Tz,
    lead_time: Duration,
    page_size: Option<u32>,
    page_delay: Duration,
    max_continuations: u32,
    resilience: ResilienceConfig,
}

impl std::fmt::Debug for Stripe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stripe")
            .field("api_url", &self.api_url)
            .field("start_ts", &self.start_ts)
            .field("category", &self.category)
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

impl Stripe {
    /// Create a new Stripe connector with the given configuration
    ///
    /// The time window and category selector start unset; both must be
    /// configured before any request is made.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails (e.g., TLS or proxy misconfiguration)
    pub fn new(config: StripeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tally/", env!("CARGO_PKG_VERSION")))
            .timeout(config.resilience.timeout())
            .build()
            .map_err(|e| ConnectorError::Init(format!("Stripe HTTP client: {}", e)))?;

        Ok(Self {
            token: config.token,
            api_url: config.api_url,
            client,
            start_ts: None,
            category: None,
            timezone: config.timezone,
            lead_time: config.lead_time,
            page_size: config.page_size,
            page_delay: config.page_delay,
            max_continuations: config.max_continuations,
            resilience: config.resilience,
        })
    }

    /// Create a Stripe connector from connector config (from TOML)
    ///
    /// Applies the configured start date (or the lead-time default) and
    /// category selector, so the returned connector is ready to fetch.
    ///
    /// # Errors
    ///
    /// Returns error if no token is configured, the config is invalid, or
    /// HTTP client creation fails
    pub fn from_config(config: &StripeConnectorConfig) -> Result<Self> {
        config.validate()?;

        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConnectorError::config("Stripe token is required"))?;

        let mut stripe = Self::new(StripeConfig {
            api_url: config.api_url.clone(),
            timezone: config.tz()?,
            lead_time: config.lead_time()?,
            page_size: config.page_size,
            page_delay: Duration::from_millis(config.page_delay_ms),
            max_continuations: config.max_continuations,
            resilience: config.resilience_config(),
            ..StripeConfig::new(token)
        })?;

        stripe.set_start_date(config.start_date.as_deref())?;
        stripe.set_category_selector(config.category.clone());
        Ok(stripe)
    }

    /// Set the lower bound of the time window
    ///
    /// `Some("YYYY-MM-DD")` resolves to midnight of that day in the
    /// connector's reference timezone. `None` uses the current time minus
    /// the lead time, which keeps clear of events the API may not have
    /// made visible yet.
    ///
    /// Returns the resulting timestamp.
    pub fn set_start_date(&mut self, date: Option<&str>) -> Result<i64> {
        let ts = match date {
            Some(date) => start_of_day(date, self.timezone)?,
            None => {
                let lead = chrono::Duration::from_std(self.lead_time).map_err(|e| {
                    ConnectorError::config(format!("lead time out of range: {}", e))
                })?;
                (Utc::now().with_timezone(&self.timezone) - lead).timestamp()
            }
        };

        debug!(connector = "stripe", start_ts = ts, "time window set");
        self.start_ts = Some(ts);
        Ok(ts)
    }

    /// Set the event type selector (e.g. `customer.subscription.*`)
    pub fn set_category_selector(&mut self, selector: impl Into<String>) {
        self.category = Some(selector.into());
    }

    /// Current lower bound of the time window
    pub fn start_ts(&self) -> Option<i64> {
        self.start_ts
    }

    /// Current event type selector
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Default fetch options derived from the connector's configuration
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            cursor: None,
            max_continuations: self.max_continuations,
        }
    }

    /// Build the request URL for one page
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::Config` if the time window or category
    /// selector has not been set.
    pub fn build_url(&self, cursor: Option<&str>) -> Result<String> {
        let start = self.start_ts.ok_or_else(|| {
            ConnectorError::config("set a start date before building a request URL")
        })?;
        let category = self.category.as_deref().ok_or_else(|| {
            ConnectorError::config("set a category selector before building a request URL")
        })?;

        let mut params = Map::new();
        params.insert("created".into(), json!({ "gte": start }));
        params.insert("type".into(), Value::String(category.to_string()));
        if let Some(limit) = self.page_size {
            params.insert("limit".into(), json!(limit));
        }
        if let Some(cursor) = cursor {
            params.insert("starting_after".into(), Value::String(cursor.to_string()));
        }

        Ok(format!("{}?{}", self.api_url, encode_nested(&params)))
    }

    /// Fetch events page by page, earliest page first
    ///
    /// After each page with `has_more`, the last event id becomes the cursor
    /// for the next request, as long as continuation budget remains. When
    /// the budget runs out the pages fetched so far are returned. Any failed
    /// request aborts the whole fetch and discards what was collected.
    ///
    /// # Errors
    ///
    /// - `ConnectorError::Config` - window or selector unset
    /// - `ConnectorError::Request` - transport, status or body failure on any page
    /// - `ConnectorError::MissingContinuation` - `has_more` on a page with no events
    pub async fn fetch_all(&self, options: FetchOptions) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        let mut cursor = options.cursor;
        let mut remaining = options.max_continuations;
        let mut page: u32 = 0;

        loop {
            page += 1;
            let url = self.build_url(cursor.as_deref())?;
            let batch = self.fetch_page(&url).await?;

            debug!(
                connector = "stripe",
                page,
                records = batch.data.len(),
                has_more = batch.has_more,
                "fetched page"
            );

            let next_cursor = batch.data.last().map(|e| e.id.clone());
            events.extend(batch.data);

            if !batch.has_more {
                break;
            }

            if remaining == 0 {
                debug!(
                    connector = "stripe",
                    pages = page,
                    records = events.len(),
                    "continuation budget exhausted, returning fetched pages"
                );
                break;
            }

            let Some(next) = next_cursor else {
                return Err(ConnectorError::MissingContinuation { page });
            };

            remaining -= 1;
            if !self.page_delay.is_zero() {
                debug!(
                    connector = "stripe",
                    delay_ms = self.page_delay.as_millis() as u64,
                    "pausing before next page"
                );
                tokio::time::sleep(self.page_delay).await;
            }
            cursor = Some(next);
        }

        Ok(events)
    }

    /// Fetch with the configured continuation budget from the first page
    pub async fn fetch_events(&self) -> Result<Vec<Event>> {
        self.fetch_all(self.fetch_options()).await
    }

    /// Fetch a single page with timeout and transient retries
    async fn fetch_page(&self, url: &str) -> Result<EventPage> {
        let page = execute_with_retry(&self.resilience, "stripe.events", || {
            self.request_page(url)
        })
        .await?;
        Ok(page)
    }

    /// Issue one GET and decode the page body
    async fn request_page(&self, url: &str) -> std::result::Result<EventPage, RequestFailure> {
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("Unable to read error body"));
            return Err(RequestFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Connector for Stripe {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn pull(&self) -> Result<Vec<Event>> {
        self.fetch_events().await
    }
}
