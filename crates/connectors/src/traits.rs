//! Connector trait definition

use crate::error::ConnectorError;
use crate::event::Event;

/// Trait for pull-based connectors that fetch events from external sources
///
/// Connectors pull events from billing services (Stripe, etc.) and return
/// them in API order, ready for payload extraction and flattening.
pub trait Connector: Send + Sync {
    /// Returns the connector name (e.g., "stripe")
    fn name(&self) -> &'static str;

    /// Pull all events within the connector's configured window
    ///
    /// # Returns
    /// Events ordered as the API returned them, earliest page first
    fn pull(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Event>, ConnectorError>> + Send;
}
