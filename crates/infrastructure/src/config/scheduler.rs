//! Scheduling configurations: update tiers, maintenance jobs, alert archiving.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::default_true;

// ==============================
// Scheduler Configuration
// ==============================

/// Tiered update schedule and maintenance jobs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SchedulerConfig {
    /// Locations refreshed most often
    #[serde(default = "default_frequent")]
    pub frequent: Vec<String>,

    /// Default city list
    #[serde(default = "default_normal")]
    pub normal: Vec<String>,

    /// Locations refreshed least often
    #[serde(default)]
    pub background: Vec<String>,

    #[serde(default = "default_frequent_interval")]
    #[validate(range(min = 1))]
    pub frequent_interval_secs: u64,

    #[serde(default = "default_normal_interval")]
    #[validate(range(min = 1))]
    pub normal_interval_secs: u64,

    #[serde(default = "default_background_interval")]
    #[validate(range(min = 1))]
    pub background_interval_secs: u64,

    /// How often the loop checks for due jobs (default: 30s)
    #[serde(default = "default_poll_interval")]
    #[validate(range(min = 1))]
    pub poll_interval_secs: u64,

    /// Pause after the scheduler loop itself fails (default: 60s)
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,

    /// How long `stop()` waits for the loop before aborting it (default: 5s)
    #[serde(default = "default_stop_timeout")]
    #[validate(range(min = 1))]
    pub stop_timeout_secs: u64,

    /// Cron expression (UTC) for compaction, trend report and health check
    #[serde(default = "default_daily_cron")]
    pub daily_cron: String,

    /// Cron expression (UTC) for cleanup, archiving and weekly summary
    #[serde(default = "default_weekly_cron")]
    pub weekly_cron: String,

    #[serde(default = "default_health_interval")]
    #[validate(range(min = 1))]
    pub health_interval_secs: u64,

    /// Data retention for the weekly cleanup, in days (default: 30)
    #[serde(default = "default_retention_days")]
    #[validate(range(min = 1))]
    pub retention_days: u32,

    /// Number of locations covered by the daily trend report (default: 5)
    #[serde(default = "default_report_locations")]
    pub report_locations: usize,

    /// Window of the daily trend report in days (default: 1)
    #[serde(default = "default_report_days")]
    #[validate(range(min = 1))]
    pub report_days: u32,

    #[serde(default = "default_forecast_refresh")]
    #[validate(range(min = 60))]
    pub forecast_refresh_secs: u64,

    #[serde(default = "default_true")]
    pub forecast_refresh_enabled: bool,
}

fn default_frequent() -> Vec<String> {
    vec!["London".to_string(), "New York".to_string()]
}

fn default_normal() -> Vec<String> {
    ["Valsad", "Boston", "New York", "London", "Tokyo"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_frequent_interval() -> u64 {
    300
}

const fn default_normal_interval() -> u64 {
    900
}

const fn default_background_interval() -> u64 {
    3600
}

const fn default_poll_interval() -> u64 {
    30
}

const fn default_error_backoff() -> u64 {
    60
}

const fn default_stop_timeout() -> u64 {
    5
}

fn default_daily_cron() -> String {
    "0 0 2 * * *".to_string()
}

fn default_weekly_cron() -> String {
    "0 0 3 * * Sun".to_string()
}

const fn default_health_interval() -> u64 {
    600
}

const fn default_retention_days() -> u32 {
    30
}

const fn default_report_locations() -> usize {
    5
}

const fn default_report_days() -> u32 {
    1
}

const fn default_forecast_refresh() -> u64 {
    10_800
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frequent: default_frequent(),
            normal: default_normal(),
            background: Vec::new(),
            frequent_interval_secs: default_frequent_interval(),
            normal_interval_secs: default_normal_interval(),
            background_interval_secs: default_background_interval(),
            poll_interval_secs: default_poll_interval(),
            error_backoff_secs: default_error_backoff(),
            stop_timeout_secs: default_stop_timeout(),
            daily_cron: default_daily_cron(),
            weekly_cron: default_weekly_cron(),
            health_interval_secs: default_health_interval(),
            retention_days: default_retention_days(),
            report_locations: default_report_locations(),
            report_days: default_report_days(),
            forecast_refresh_secs: default_forecast_refresh(),
            forecast_refresh_enabled: true,
        }
    }
}

impl SchedulerConfig {
    /// Every configured location, deduplicated by key in first-seen order
    #[must_use]
    pub fn all_locations(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.frequent
            .iter()
            .chain(&self.normal)
            .chain(&self.background)
            .filter(|name| {
                domain::LocationKey::new(name)
                    .map(|key| seen.insert(key))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Locations covered by the daily trend report
    #[must_use]
    pub fn report_targets(&self) -> Vec<String> {
        let mut locations = self.all_locations();
        locations.truncate(self.report_locations);
        locations
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub const fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    /// Age after which the last successful update counts as stale
    #[must_use]
    pub const fn stale_after(&self) -> Duration {
        Duration::from_secs(self.frequent_interval_secs.saturating_mul(2))
    }
}

// ==============================
// Alert Configuration
// ==============================

/// Alert evaluation and archiving
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AlertsAppConfig {
    /// Pressure history window in hours (default: 6)
    #[serde(default = "default_pressure_history")]
    #[validate(range(min = 1, max = 72))]
    pub pressure_history_hours: u32,

    /// Deactivate alerts whose start is older than this many days (default: 7)
    #[serde(default = "default_archive_after")]
    #[validate(range(min = 1))]
    pub archive_after_days: u32,
}

const fn default_pressure_history() -> u32 {
    6
}

const fn default_archive_after() -> u32 {
    7
}

impl Default for AlertsAppConfig {
    fn default() -> Self {
        Self {
            pressure_history_hours: default_pressure_history(),
            archive_after_days: default_archive_after(),
        }
    }
}

impl AlertsAppConfig {
    /// Convert to the alert engine configuration
    #[must_use]
    pub const fn to_engine_config(&self) -> application::AlertEngineConfig {
        application::AlertEngineConfig {
            pressure_history_hours: self.pressure_history_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_locations_deduplicates_across_tiers() {
        let config = SchedulerConfig::default();
        assert_eq!(
            config.all_locations(),
            vec!["London", "New York", "Valsad", "Boston", "Tokyo"]
        );
    }

    #[test]
    fn all_locations_matches_keys_not_spelling() {
        let config = SchedulerConfig {
            frequent: vec!["new york".to_string()],
            normal: vec!["New  York".to_string(), "  ".to_string()],
            background: vec!["Oslo".to_string()],
            ..SchedulerConfig::default()
        };
        assert_eq!(config.all_locations(), vec!["new york", "Oslo"]);
    }

    #[test]
    fn report_targets_truncates() {
        let config = SchedulerConfig {
            report_locations: 2,
            ..SchedulerConfig::default()
        };
        assert_eq!(config.report_targets(), vec!["London", "New York"]);
    }

    #[test]
    fn daily_report_covers_one_day() {
        assert_eq!(SchedulerConfig::default().report_days, 1);
    }

    #[test]
    fn stale_after_is_twice_frequent_interval() {
        assert_eq!(SchedulerConfig::default().stale_after(), Duration::from_secs(600));
    }
}
