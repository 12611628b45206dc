//! Application configuration
//!
//! Split into focused sub-modules by concern:
//! - `integrations`: weather provider, SMTP email
//! - `database`: SQLite database settings
//! - `output`: files written after update runs
//! - `resilience`: retry, rate limiting, fetch fan-out, telemetry
//! - `scheduler`: update tiers, maintenance jobs, alert archiving

mod database;
mod integrations;
mod output;
mod resilience;
mod scheduler;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

pub use database::DatabaseConfig;
pub use integrations::{EmailConfig, ProviderConfig};
pub use output::SnapshotConfig;
pub use resilience::{FetchAppConfig, RateLimitAppConfig, RetryAppConfig, TelemetryAppConfig};
pub use scheduler::{AlertsAppConfig, SchedulerConfig};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "WEATHERVANE";

/// Flat environment names accepted for secrets, next to the nested
/// `WEATHERVANE_SECTION__KEY` form
const SECRET_ALIASES: &[(&str, &str)] = &[
    ("WEATHERVANE_PROVIDER_API_KEY", "provider.api_key"),
    ("WEATHERVANE_EMAIL_USERNAME", "email.username"),
    ("WEATHERVANE_EMAIL_PASSWORD", "email.password"),
];

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub provider: ProviderConfig,

    #[serde(default)]
    #[validate(nested)]
    pub database: DatabaseConfig,

    #[serde(default)]
    #[validate(nested)]
    pub rate_limit: RateLimitAppConfig,

    #[serde(default)]
    #[validate(nested)]
    pub fetch: FetchAppConfig,

    #[serde(default)]
    #[validate(nested)]
    pub alerts: AlertsAppConfig,

    #[serde(default)]
    #[validate(nested)]
    pub email: EmailConfig,

    #[serde(default)]
    #[validate(nested)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryAppConfig,

    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryAppConfig,

    #[serde(default)]
    #[validate(nested)]
    pub snapshot: SnapshotConfig,
}

impl AppConfig {
    /// Load configuration from `{stem}.toml` (optional) and environment
    ///
    /// Nested keys are overridden with `WEATHERVANE_SECTION__KEY`, for example
    /// `WEATHERVANE_SCHEDULER__POLL_INTERVAL_SECS=10`. Secrets also accept
    /// the flat names in `SECRET_ALIASES`. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or parsed, or the result
    /// fails [`Self::check`].
    pub fn load_from(file_stem: &str) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name(file_stem).required(false))
            // Override with environment variables (e.g., WEATHERVANE_DATABASE__PATH)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scheduler.frequent")
                    .with_list_parse_key("scheduler.normal")
                    .with_list_parse_key("scheduler.background")
                    .try_parsing(true),
            );

        for (var, key) in SECRET_ALIASES {
            if let Ok(value) = std::env::var(var) {
                debug!(key = %key, "Using flat environment override");
                builder = builder.set_override(*key, value)?;
            }
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Validate field ranges, cron expressions and required secrets
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming every problem found.
    pub fn check(&self) -> Result<(), config::ConfigError> {
        let mut problems = Vec::new();

        if let Err(errors) = Validate::validate(self) {
            problems.push(errors.to_string());
        }
        if !self.provider.has_api_key() {
            problems.push(format!(
                "provider.api_key is required (set {ENV_PREFIX}_PROVIDER_API_KEY)"
            ));
        }
        for (name, expr) in [
            ("scheduler.daily_cron", &self.scheduler.daily_cron),
            ("scheduler.weekly_cron", &self.scheduler.weekly_cron),
        ] {
            if let Err(e) = cron::Schedule::from_str(expr) {
                problems.push(format!("{name} '{expr}' is not a valid cron expression: {e}"));
            }
        }
        if self.scheduler.all_locations().is_empty() {
            problems.push("scheduler has no locations configured".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(config::ConfigError::Message(problems.join("; ")))
        }
    }
}
