//! Retry policy for provider calls.
//!
//! Exponential backoff, applied only to errors that may succeed on a later
//! attempt (5xx responses and transport failures).

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::ProviderError;
use crate::config::ProviderSettings;
use crate::server::metrics::record_provider_retry;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    /// Cap for exponential growth.
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff_ms: settings.initial_backoff_ms,
            max_backoff_ms: settings.max_backoff_ms,
            backoff_multiplier: settings.backoff_multiplier,
        }
    }

    /// No retries at all.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry_count` (0-based): `initial * multiplier^retry_count`,
    /// capped at `max_backoff_ms`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let backoff =
            self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(retry_count as i32);
        Duration::from_millis(backoff.min(self.max_backoff_ms as f64) as u64)
    }

    pub fn should_retry(&self, error: &ProviderError, retry_count: u32) -> bool {
        error.is_retryable() && retry_count < self.max_retries
    }

    /// Run `op` until it succeeds, fails permanently, or retries are exhausted.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut retry_count = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(&err, retry_count) => {
                    let wait = self.backoff(retry_count);
                    warn!(
                        "{} failed ({}), retry {}/{} in {}ms",
                        what,
                        err,
                        retry_count + 1,
                        self.max_retries,
                        wait.as_millis()
                    );
                    record_provider_retry(what);
                    tokio::time::sleep(wait).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 250,
            max_backoff_ms: 2000,
            backoff_multiplier: 2.0,
        }
    }
}
