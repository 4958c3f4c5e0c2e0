use std::{future::Future, time::Duration};

use log::*;

use crate::traits::GatewayError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(250);
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds a gateway call. Expiry is reported as [`GatewayError::Unavailable`].
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, GatewayError>
where F: Future<Output = Result<T, GatewayError>> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Unavailable(format!("no response within {}ms", timeout.as_millis()))),
    }
}

/// Retry schedule for idempotent gateway reads.
///
/// Each attempt is bounded by `timeout`. Only [`GatewayError::Unavailable`] is retried, with the delay doubling
/// after each failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, timeout: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), initial_backoff, timeout }
    }

    /// A single attempt, no backoff.
    pub fn no_retries(timeout: Duration) -> Self {
        Self::new(1, Duration::ZERO, timeout)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            match with_timeout(self.timeout, call()).await {
                Err(GatewayError::Unavailable(reason)) if attempt < self.max_attempts => {
                    warn!(
                        "🔁️ {label} failed (attempt {attempt}/{}): {reason}. Retrying in {}ms",
                        self.max_attempts,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                },
                result => return result,
            }
        }
    }
}
