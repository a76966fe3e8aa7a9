//! Retry with exponential backoff for the HTTP boundary.
//!
//! Retried: timeouts, connection failures, 408, 429 and 5xx.
//! Not retried: other 4xx, and anything the provider reports inside a
//! successful HTTP response (those surface as `ApiFault`).

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use tracing::{debug, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 100;
pub const DEFAULT_MAX_DELAY_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Delay before retry number `attempt + 1`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

pub fn is_retryable_error(error: &reqwest::Error) -> RetryDecision {
    if error.is_timeout() || error.is_connect() {
        return RetryDecision::Retry;
    }
    if error.is_request() {
        return RetryDecision::NoRetry;
    }
    match error.status() {
        Some(status) => is_retryable_status(status),
        None => RetryDecision::NoRetry,
    }
}

pub fn is_retryable_status(status: StatusCode) -> RetryDecision {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        RetryDecision::Retry
    } else {
        RetryDecision::NoRetry
    }
}

/// Run `operation` until it yields a non-retryable outcome or retries run out.
///
/// On exhaustion the last response (retryable status) or last error is
/// returned as-is.
pub async fn with_retry<F, Fut>(config: &RetryConfig, operation: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(response) => {
                let status = response.status();
                if is_retryable_status(status) == RetryDecision::NoRetry
                    || attempt >= config.max_retries
                {
                    if attempt > 0 {
                        debug!(attempt, %status, "finished after retries");
                    }
                    return Ok(response);
                }
                warn!(
                    %status,
                    attempt = attempt + 1,
                    of = config.max_retries + 1,
                    "retryable HTTP status"
                );
            }
            Err(e) => {
                if is_retryable_error(&e) == RetryDecision::NoRetry || attempt >= config.max_retries {
                    return Err(e);
                }
                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    of = config.max_retries + 1,
                    "retryable transport error"
                );
            }
        }

        let delay = config.delay_for_attempt(attempt);
        attempt += 1;
        tokio::time::sleep(delay).await;
    }
}
