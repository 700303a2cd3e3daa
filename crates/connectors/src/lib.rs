//! Tally - Connectors
//!
//! Pull-based connectors that fetch billing events from external APIs.
//!
//! # Available Connectors
//!
//! - **Stripe** - Events API (`/v1/events`) with cursor pagination
//!
//! # Design Principles
//!
//! - **Pull-based**: Connectors fetch data on demand, one page at a time
//! - **Explicit window**: A start date and category selector must be set
//!   before any request is built
//! - **Bounded pagination**: The continuation budget caps how many pages
//!   are followed; transient retries are configured separately
//! - **Simple interface**: Each connector implements the `Connector` trait
//!
//! # Feature Flags
//!
//! ```toml
//! [dependencies]
//! tally-connectors = { version = "0.1", default-features = false, features = ["stripe"] }
//! ```
//!
//! Available features:
//! - `stripe` (default) - Stripe events
//!
//! # Example
//!
//! ```ignore
//! use tally_connectors::{Connector, Stripe, StripeConnectorConfig};
//!
//! let stripe = Stripe::from_config(&StripeConnectorConfig {
//!     token: Some("sk_live_xxx".into()),
//!     start_date: Some("2023-07-01".into()),
//!     ..Default::default()
//! })?;
//!
//! let events = stripe.pull().await?;
//! ```

pub mod config;
mod date;
mod error;
mod event;
pub mod query;
pub mod resilience;
mod traits;

// Conditionally compiled connectors
#[cfg(feature = "stripe")]
mod stripe;

// Re-exports
pub use date::start_of_day;
pub use error::{ConnectorError, RequestFailure, Result};
pub use event::{Event, EventData};
pub use traits::Connector;

#[cfg(feature = "stripe")]
pub use config::StripeConnectorConfig;
#[cfg(feature = "stripe")]
pub use stripe::{FetchOptions, Stripe, StripeConfig};

