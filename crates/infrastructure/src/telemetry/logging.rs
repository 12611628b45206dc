//! Subscriber initialization

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "weathervane=debug")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Replace the filter directive, keeping the output format
    #[must_use]
    pub fn with_filter(mut self, log_filter: impl Into<String>) -> Self {
        self.log_filter = log_filter.into();
        self
    }

    /// Build the filter: `RUST_LOG` wins over the configured directive
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::Filter` if the configured directive does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.log_filter).map_err(|e| TelemetryError::Filter(e.to_string()))
    }
}

/// Error type for telemetry initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The filter directive is malformed
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Install the global subscriber
///
/// # Example
///
/// ```ignore
/// use infrastructure::telemetry::{TelemetryConfig, init_telemetry};
///
/// init_telemetry(&TelemetryConfig::default().with_filter("debug"))?;
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = config.env_filter()?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
    result.map_err(|e| TelemetryError::Init(e.to_string()))?;

    info!(filter = %config.log_filter, json = config.json, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_filter, "info");
        assert!(!config.json);
    }

    #[test]
    fn config_deserialization_fills_defaults() {
        let parsed: TelemetryConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert!(parsed.json);
        assert_eq!(parsed.log_filter, "info");
    }

    #[test]
    fn with_filter_replaces_directive() {
        let config = TelemetryConfig::default().with_filter("weathervane=debug");
        assert_eq!(config.log_filter, "weathervane=debug");
    }

    #[test]
    fn malformed_filter_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = TelemetryConfig::default().with_filter("info,weathervane=loud");
        assert!(matches!(config.env_filter(), Err(TelemetryError::Filter(_))));
    }

    #[test]
    fn second_init_fails() {
        let config = TelemetryConfig::default();
        let _ = init_telemetry(&config);
        assert!(matches!(init_telemetry(&config), Err(TelemetryError::Init(_))));
    }
}
