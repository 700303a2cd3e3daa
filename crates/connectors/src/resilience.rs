//! Resilience utilities for connectors
//!
//! Provides the per-request timeout and the transient-failure retry loop.
//! Retries here are independent of pagination: a connector's continuation
//! budget decides how many pages to follow, this module decides how many
//! times a single page request may be re-issued.

use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::error::RequestFailure;

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default retries for transient failures (none: a failed request aborts)
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Default base delay for exponential backoff
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Resilience configuration for a connector
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each retry)
    pub retry_base_delay_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

impl ResilienceConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get retry delay for attempt N (exponential backoff)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.retry_base_delay_ms * (1 << attempt.min(6)); // cap at 64x
        Duration::from_millis(delay_ms)
    }
}

/// Execute a request with timeout and retry logic
///
/// Only failures reported as transient by [`RequestFailure::is_transient`]
/// are retried. Anything else is returned immediately. When every attempt
/// fails transiently the last cause is returned as-is for a single attempt,
/// or wrapped in [`RequestFailure::Exhausted`] when retries were made.
pub async fn execute_with_retry<F, Fut, T>(
    config: &ResilienceConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, RequestFailure>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RequestFailure>>,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let delay = config.retry_delay(attempt - 1);
            debug!(
                operation = operation_name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying after delay"
            );
            tokio::time::sleep(delay).await;
        }

        let failure = match timeout(config.timeout(), operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => RequestFailure::Timeout {
                secs: config.timeout_secs,
            },
        };

        if !failure.is_transient() {
            return Err(failure);
        }

        if attempt < config.max_retries {
            debug!(
                operation = operation_name,
                attempt,
                error = %failure,
                "request failed, will retry"
            );
        }
        last_error = Some(failure);
    }

    match last_error {
        Some(failure) if config.max_retries == 0 => Err(failure),
        Some(failure) => Err(RequestFailure::Exhausted {
            attempts: config.max_retries + 1,
            last_error: failure.to_string(),
        }),
        None => Err(RequestFailure::Exhausted {
            attempts: 0,
            last_error: "no attempts made".to_string(),
        }),
    }
}
