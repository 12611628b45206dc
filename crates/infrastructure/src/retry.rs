//! Retry with exponential backoff
//!
//! Repeats a fallible async operation while its error reports itself as
//! retryable, sleeping `initial * multiplier^n` (capped, with jitter)
//! between attempts.
//!
//! # Example
//!
//! ```rust,ignore
//! use infrastructure::retry::{RetryConfig, with_retry};
//!
//! let outcome = with_retry(&RetryConfig::default(), || client.get_current("Oslo")).await;
//! let reading = outcome.into_result()?;
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Backoff parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before the first retry in milliseconds (default: 100ms)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds (default: 10s)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Growth factor between consecutive delays (default: 2.0)
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Retries after the first attempt (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Randomize delays by up to `jitter_factor` in either direction
    #[serde(default = "default_true")]
    pub jitter_enabled: bool,

    /// Jitter as a fraction of the delay (default: 0.1)
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

const fn default_initial_delay() -> u64 {
    100
}

const fn default_max_delay() -> u64 {
    10_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_true() -> bool {
    true
}

const fn default_jitter_factor() -> f64 {
    0.1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(
            default_initial_delay(),
            default_max_delay(),
            default_multiplier(),
            default_max_retries(),
        )
    }
}

impl RetryConfig {
    #[must_use]
    pub const fn new(
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
        max_retries: u32,
    ) -> Self {
        Self {
            initial_delay_ms,
            max_delay_ms,
            multiplier,
            max_retries,
            jitter_enabled: true,
            jitter_factor: 0.1,
        }
    }

    /// A single attempt, no retries
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, 0, 1.0, 0)
    }

    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter_enabled = false;
        self
    }

    /// Delay before retry number `attempt` (0-indexed)
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let base = (self.initial_delay_ms as f64) * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay_ms as f64);

        let delay = if self.jitter_enabled && capped > 0.0 {
            let spread = capped * self.jitter_factor;
            (capped + rand::rng().random_range(-spread..=spread)).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(delay as u64)
    }
}

/// Errors that know whether repeating the call can help
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for application::ApplicationError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

impl Retryable for integration_weather::FetchError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

/// Outcome of a retried operation
#[derive(Debug)]
pub struct RetryResult<T, E> {
    pub result: Result<T, E>,
    /// Attempts made (1 = no retries)
    pub attempts: u32,
    /// Time spent including backoff sleeps
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Run `operation`, retrying retryable failures per `config`
#[allow(clippy::cast_possible_truncation)]
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(attempts, "Operation succeeded after retries");
                }
                return RetryResult {
                    result: Ok(value),
                    attempts,
                    total_duration: start.elapsed(),
                };
            },
            Err(err) => err,
        };

        let retries_used = attempts - 1;
        if !err.is_retryable() || retries_used >= config.max_retries {
            if err.is_retryable() {
                warn!(attempts, error = %err, "Giving up after max retries");
            } else {
                debug!(attempts, error = %err, "Non-retryable failure");
            }
            return RetryResult {
                result: Err(err),
                attempts,
                total_duration: start.elapsed(),
            };
        }

        let delay = config.delay_for_attempt(retries_used);
        warn!(
            attempt = attempts,
            max_retries = config.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Operation failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
