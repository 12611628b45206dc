//! Resilience configurations: retry, rate limiting, fetch fan-out, telemetry.

use serde::{Deserialize, Serialize};
use validator::Validate;

// ==============================
// Retry Configuration
// ==============================

/// Retry configuration for provider calls
///
/// Configures exponential backoff for transient fetch failures.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetryAppConfig {
    /// Initial delay before first retry in milliseconds (default: 100ms)
    #[serde(default = "default_retry_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds (default: 10000ms = 10s)
    #[serde(default = "default_retry_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_retry_multiplier")]
    #[validate(range(min = 1.0, max = 10.0))]
    pub multiplier: f64,

    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_retry_max_retries")]
    #[validate(range(max = 10))]
    pub max_retries: u32,
}

const fn default_retry_initial_delay() -> u64 {
    100
}

const fn default_retry_max_delay() -> u64 {
    10_000
}

const fn default_retry_multiplier() -> f64 {
    2.0
}

const fn default_retry_max_retries() -> u32 {
    3
}

impl Default for RetryAppConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_retry_initial_delay(),
            max_delay_ms: default_retry_max_delay(),
            multiplier: default_retry_multiplier(),
            max_retries: default_retry_max_retries(),
        }
    }
}

impl RetryAppConfig {
    /// Convert to `retry::RetryConfig` for use with retry operations
    #[must_use]
    pub const fn to_retry_config(&self) -> crate::retry::RetryConfig {
        crate::retry::RetryConfig::new(
            self.initial_delay_ms,
            self.max_delay_ms,
            self.multiplier,
            self.max_retries,
        )
    }
}

// ==============================
// Rate Limit Configuration
// ==============================

/// Sliding-window admission limits for provider requests
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RateLimitAppConfig {
    /// Maximum admissions per window (default: 100)
    #[serde(default = "default_max_requests")]
    #[validate(range(min = 1))]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    #[validate(range(min = 1))]
    pub window_secs: u64,
}

const fn default_max_requests() -> u32 {
    100
}

const fn default_window_secs() -> u64 {
    60
}

impl Default for RateLimitAppConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

// ==============================
// Fetch Configuration
// ==============================

/// Batch fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FetchAppConfig {
    /// Concurrent provider requests per batch (default: 5)
    #[serde(default = "default_max_concurrency")]
    #[validate(range(min = 1, max = 64))]
    pub max_concurrency: usize,
}

const fn default_max_concurrency() -> usize {
    application::DEFAULT_MAX_CONCURRENCY
}

impl Default for FetchAppConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

// ==============================
// Telemetry Configuration
// ==============================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelemetryAppConfig {
    /// Filter directive used when `RUST_LOG` is unset (default: "info")
    #[serde(default = "default_log_filter")]
    #[validate(length(min = 1))]
    pub log_filter: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for TelemetryAppConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json: false,
        }
    }
}

impl TelemetryAppConfig {
    /// Convert to `telemetry::TelemetryConfig`
    #[must_use]
    pub fn to_telemetry_config(&self) -> crate::telemetry::TelemetryConfig {
        crate::telemetry::TelemetryConfig {
            log_filter: self.log_filter.clone(),
            json: self.json,
        }
    }
}
