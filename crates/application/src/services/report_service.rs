//! Reports over stored weather data and alerts
//!
//! Backs the scheduler's maintenance jobs and the CLI's summary and status
//! commands.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domain::entities::{Alert, AlertSeverity, AlertType};
use domain::value_objects::LocationKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{AlertStore, ReadingStore, StorageStats, WeatherFetchPort, WeatherTrends},
};

/// Grouped view of the active alerts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total_alerts: usize,
    pub by_severity: BTreeMap<AlertSeverity, usize>,
    pub by_type: BTreeMap<AlertType, usize>,
    pub by_location: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_recent: Option<Alert>,
}

impl AlertSummary {
    /// Group a list of alerts
    #[must_use]
    pub fn from_alerts(alerts: Vec<Alert>) -> Self {
        let mut summary = Self {
            total_alerts: alerts.len(),
            ..Self::default()
        };

        for alert in alerts {
            *summary.by_severity.entry(alert.severity).or_default() += 1;
            *summary.by_type.entry(alert.alert_type).or_default() += 1;
            *summary
                .by_location
                .entry(alert.location_name.clone())
                .or_default() += 1;

            let newer = summary
                .most_recent
                .as_ref()
                .is_none_or(|current| alert.created_at > current.created_at);
            if newer {
                summary.most_recent = Some(alert);
            }
        }

        summary
    }
}

/// Trends for the configured report locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub generated_at: DateTime<Utc>,
    pub period_days: u32,
    /// One entry per location that had data
    pub trends: Vec<WeatherTrends>,
}

/// Storage statistics plus the active alert summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub generated_at: DateTime<Utc>,
    pub stats: StorageStats,
    pub alerts: AlertSummary,
}

/// Snapshot of pipeline health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineHealth {
    /// Provider availability, `None` when the check was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_available: Option<bool>,
    pub storage_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StorageStats>,
    pub active_alerts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_update: Option<DateTime<Utc>>,
    /// True when no successful update happened within the staleness window
    pub stale: bool,
    pub checked_at: DateTime<Utc>,
}

impl PipelineHealth {
    /// Overall health: storage reachable, data fresh, provider up if checked
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.storage_reachable && !self.stale && self.provider_available.unwrap_or(true)
    }
}

/// Read-only reporting over the stores
pub struct ReportService {
    readings: Arc<dyn ReadingStore>,
    alerts: Arc<dyn AlertStore>,
    fetcher: Arc<dyn WeatherFetchPort>,
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService").finish_non_exhaustive()
    }
}

impl ReportService {
    #[must_use]
    pub fn new(
        readings: Arc<dyn ReadingStore>,
        alerts: Arc<dyn AlertStore>,
        fetcher: Arc<dyn WeatherFetchPort>,
    ) -> Self {
        Self {
            readings,
            alerts,
            fetcher,
        }
    }

    /// Summary of active alerts, optionally for one location
    #[instrument(skip(self))]
    pub async fn active_alert_summary(
        &self,
        location: Option<LocationKey>,
    ) -> Result<AlertSummary, ApplicationError> {
        let alerts = self.alerts.get_active_alerts(location).await?;
        Ok(AlertSummary::from_alerts(alerts))
    }

    /// Trends over the last `days` for each location
    ///
    /// Locations without data, or whose query fails, are left out.
    #[instrument(skip(self, locations), fields(count = locations.len()))]
    pub async fn daily_report(&self, locations: &[LocationKey], days: u32) -> DailyReport {
        let mut trends = Vec::with_capacity(locations.len());
        for key in locations {
            match self.readings.get_trends(key, days).await {
                Ok(Some(t)) => trends.push(t),
                Ok(None) => debug!(location = %key, "No data for daily report"),
                Err(e) => warn!(location = %key, error = %e, "Failed to compute trends"),
            }
        }

        DailyReport {
            generated_at: Utc::now(),
            period_days: days,
            trends,
        }
    }

    /// Storage statistics and alert summary
    #[instrument(skip(self))]
    pub async fn weekly_summary(&self) -> Result<WeeklySummary, ApplicationError> {
        let stats = self.readings.get_stats().await?;
        let alerts = self.active_alert_summary(None).await?;
        Ok(WeeklySummary {
            generated_at: Utc::now(),
            stats,
            alerts,
        })
    }

    /// Check storage, alert state and data freshness
    ///
    /// `stale_after` is the longest acceptable gap since the last successful
    /// update. The provider is only queried when `check_provider` is set.
    #[instrument(skip(self))]
    pub async fn health(&self, stale_after: Duration, check_provider: bool) -> PipelineHealth {
        let now = Utc::now();

        let stats = match self.readings.get_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "Storage stats unavailable");
                None
            },
        };

        let last_successful_update = match self.readings.last_successful_update().await {
            Ok(last) => last,
            Err(e) => {
                warn!(error = %e, "Last update time unavailable");
                None
            },
        };

        let active_alerts = match self.alerts.get_active_alerts(None).await {
            Ok(alerts) => alerts.len(),
            Err(e) => {
                warn!(error = %e, "Active alerts unavailable");
                0
            },
        };

        let provider_available = if check_provider {
            Some(self.fetcher.is_available().await)
        } else {
            None
        };

        let stale = last_successful_update.is_none_or(|at| now - at > stale_after);

        PipelineHealth {
            provider_available,
            storage_reachable: stats.is_some(),
            stats,
            active_alerts,
            last_successful_update,
            stale,
            checked_at: now,
        }
    }
}
