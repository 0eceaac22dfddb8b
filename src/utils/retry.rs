//! Retry with exponential backoff for transient backend failures.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::Interrupted;
use crate::models::RetrySettings;

/// Backoff policy for collaborator calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Delay growth factor applied after every failed attempt.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryConfig {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            multiplier: 2.0,
        }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    fn next_delay(&self, current: Duration) -> Duration {
        Duration::from_secs_f64(current.as_secs_f64() * self.multiplier).min(self.max_delay)
    }
}

/// Determines if an error is worth another attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run `operation` until it succeeds, fails permanently, or the attempt
/// budget is spent. Backoff sleeps end early when `cancel` fires.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    what: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: Retryable + Interrupted + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if attempt >= config.max_attempts || !error.is_retryable() {
            return Err(error);
        }

        let wait = delay + jitter(delay / 4);
        warn!(
            operation = what,
            attempt,
            max_attempts = config.max_attempts,
            delay_ms = wait.as_millis() as u64,
            error = %error,
            "transient failure, retrying"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(E::cancelled()),
            _ = sleep(wait) => {}
        }

        delay = config.next_delay(delay);
    }
}

/// Up to `max` of jitter derived from the clock's sub-second nanos.
fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let nanos = u64::from(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0),
    );
    Duration::from_millis(nanos % max_ms)
}
