//! Pipeline job bodies and the default job table

use std::sync::Arc;
use std::time::Duration;

use application::ports::{AlertStore, ReadingStore};
use application::{DailyReport, ReportService, UpdateService};
use chrono::Utc;
use domain::entities::UpdateResult;
use domain::value_objects::LocationKey;
use tracing::{info, warn};

use super::{LoopSettings, SchedulerError, TieredScheduler, Trigger};
use crate::config::{AlertsAppConfig, SchedulerConfig};

/// Services the scheduled jobs drive
#[derive(Clone)]
pub struct PipelineJobs {
    pub updates: Arc<UpdateService>,
    pub reports: Arc<ReportService>,
    pub readings: Arc<dyn ReadingStore>,
    pub alerts: Arc<dyn AlertStore>,
}

impl std::fmt::Debug for PipelineJobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineJobs")
            .field("updates", &self.updates)
            .finish_non_exhaustive()
    }
}

impl PipelineJobs {
    /// Restore the active alert set, then update every location once
    pub async fn startup(&self, locations: &[String]) -> Result<(), String> {
        if let Err(e) = self.updates.engine().restore_active().await {
            warn!(error = %e, "Could not restore active alerts");
        }
        let outcome = self.updates.run(locations).await;
        batch_outcome("initial update", &outcome.result)
    }

    /// Fetch, store and evaluate one tier
    pub async fn tier_update(&self, locations: &[String]) -> Result<(), String> {
        let outcome = self.updates.run(locations).await;
        batch_outcome("tier update", &outcome.result)
    }

    /// Compaction, trend report and a full health check
    pub async fn daily(
        &self,
        report_targets: &[String],
        report_days: u32,
        stale_after: Duration,
    ) -> Result<(), String> {
        let compacted = self.readings.compact().await;
        if let Err(e) = &compacted {
            warn!(error = %e, "Database compaction failed");
        }

        self.trend_report(report_targets, report_days).await;

        let health = self.reports.health(chrono_duration(stale_after), true).await;
        info!(
            healthy = health.is_healthy(),
            provider_available = ?health.provider_available,
            storage_reachable = health.storage_reachable,
            active_alerts = health.active_alerts,
            stale = health.stale,
            "Daily health check"
        );

        compacted.map_err(|e| format!("compaction failed: {e}"))
    }

    /// Log the trends of the last `days` days for each target
    pub async fn trend_report(&self, report_targets: &[String], days: u32) -> DailyReport {
        let keys: Vec<LocationKey> = report_targets
            .iter()
            .filter_map(|name| LocationKey::new(name).ok())
            .collect();
        let report = self.reports.daily_report(&keys, days).await;
        for t in &report.trends {
            info!(
                location = %t.location,
                avg_c = t.avg_temperature_c,
                min_c = t.min_temperature_c,
                max_c = t.max_temperature_c,
                avg_humidity = t.avg_humidity,
                avg_pressure_mb = t.avg_pressure_mb,
                data_points = t.data_points,
                "Daily trend report"
            );
        }
        report
    }

    /// Retention cleanup, alert archiving and the weekly summary
    pub async fn weekly(&self, retention_days: u32, archive_after_days: u32) -> Result<(), String> {
        let mut problems = Vec::new();

        if let Err(e) = self.readings.cleanup(retention_days).await {
            problems.push(format!("cleanup failed: {e}"));
        }

        let cutoff = Utc::now() - chrono::Duration::days(i64::from(archive_after_days));
        if let Err(e) = self.alerts.deactivate_before(cutoff).await {
            problems.push(format!("archiving failed: {e}"));
        }

        match self.reports.weekly_summary().await {
            Ok(summary) => info!(
                readings = summary.stats.current_weather_records,
                forecasts = summary.stats.forecast_records,
                locations = summary.stats.unique_locations,
                database_bytes = summary.stats.database_size_bytes,
                active_alerts = summary.alerts.total_alerts,
                "Weekly summary"
            ),
            Err(e) => problems.push(format!("weekly summary failed: {e}")),
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }

    /// Storage stats, active alerts and update staleness
    pub async fn health_check(&self, stale_after: Duration) -> Result<(), String> {
        let health = self.reports.health(chrono_duration(stale_after), false).await;

        if health.stale {
            let since = health
                .last_successful_update
                .map(|at| (Utc::now() - at).num_seconds());
            warn!(
                seconds_since_update = ?since,
                threshold_secs = stale_after.as_secs(),
                "No successful update within the staleness window"
            );
        }
        info!(
            storage_reachable = health.storage_reachable,
            active_alerts = health.active_alerts,
            "Health check"
        );

        if health.storage_reachable {
            Ok(())
        } else {
            Err("storage unreachable".to_string())
        }
    }

    /// Fetch and store forecasts for every location
    pub async fn refresh_forecasts(&self, locations: &[String], days: u8) -> Result<(), String> {
        let result = self.updates.refresh_forecasts(locations, days).await;
        batch_outcome("forecast refresh", &result)
    }
}

/// A batch fails when it had locations and none of them succeeded
fn batch_outcome(what: &str, result: &UpdateResult) -> Result<(), String> {
    if result.success || result.total_locations == 0 {
        return Ok(());
    }
    let details: Vec<String> = result
        .errors
        .iter()
        .map(|(location, error)| format!("{location}: {error}"))
        .collect();
    Err(format!("{what} failed for every location ({})", details.join(", ")))
}

fn chrono_duration(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

/// Build the scheduler with the tier, maintenance and refresh jobs
///
/// # Errors
///
/// Returns `SchedulerError::InvalidCronExpression` if a cron expression is malformed.
pub fn pipeline_scheduler(
    config: &SchedulerConfig,
    alerts: &AlertsAppConfig,
    forecast_days: u8,
    jobs: PipelineJobs,
) -> Result<TieredScheduler, SchedulerError> {
    let daily = Trigger::cron(&config.daily_cron)?;
    let weekly = Trigger::cron(&config.weekly_cron)?;
    let stale_after = config.stale_after();
    let report_days = config.report_days;

    let mut scheduler = TieredScheduler::new(LoopSettings::from(config));

    let all = config.all_locations();
    {
        let jobs = jobs.clone();
        scheduler.on_start(move || {
            let jobs = jobs.clone();
            let all = all.clone();
            async move { jobs.startup(&all).await }
        });
    }

    for (name, locations, interval_secs) in [
        ("frequent", &config.frequent, config.frequent_interval_secs),
        ("normal", &config.normal, config.normal_interval_secs),
        ("background", &config.background, config.background_interval_secs),
    ] {
        let jobs = jobs.clone();
        scheduler.add_tier(
            name,
            locations.clone(),
            Duration::from_secs(interval_secs),
            move |locations| {
                let jobs = jobs.clone();
                async move { jobs.tier_update(&locations).await }
            },
        );
    }

    {
        let jobs = jobs.clone();
        let targets = config.report_targets();
        scheduler.add_job("daily_maintenance", daily, move || {
            let jobs = jobs.clone();
            let targets = targets.clone();
            async move { jobs.daily(&targets, report_days, stale_after).await }
        });
    }

    {
        let jobs = jobs.clone();
        let retention_days = config.retention_days;
        let archive_after_days = alerts.archive_after_days;
        scheduler.add_job("weekly_maintenance", weekly, move || {
            let jobs = jobs.clone();
            async move { jobs.weekly(retention_days, archive_after_days).await }
        });
    }

    {
        let jobs = jobs.clone();
        scheduler.add_job(
            "health_check",
            Trigger::Every(Duration::from_secs(config.health_interval_secs)),
            move || {
                let jobs = jobs.clone();
                async move { jobs.health_check(stale_after).await }
            },
        );
    }

    if config.forecast_refresh_enabled {
        let locations = config.all_locations();
        scheduler.add_job(
            "forecast_refresh",
            Trigger::Every(Duration::from_secs(config.forecast_refresh_secs)),
            move || {
                let jobs = jobs.clone();
                let locations = locations.clone();
                async move { jobs.refresh_forecasts(&locations, forecast_days).await }
            },
        );
    }

    Ok(scheduler)
}
