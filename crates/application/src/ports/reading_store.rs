//! Reading store port
//!
//! Persistence for readings, forecasts and the update run log, plus the
//! maintenance operations the scheduler drives.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::entities::{Forecast, UpdateResult, WeatherReading};
use domain::value_objects::LocationKey;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Aggregates over a location's recent readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTrends {
    pub location: LocationKey,
    /// Window the aggregates cover
    pub period_days: u32,
    pub avg_temperature_c: f64,
    pub min_temperature_c: f64,
    pub max_temperature_c: f64,
    pub avg_humidity: f64,
    pub avg_pressure_mb: f64,
    pub avg_wind_kph: f64,
    /// Number of readings aggregated
    pub data_points: u64,
}

/// Row counts and size of the backing store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub current_weather_records: u64,
    pub forecast_records: u64,
    pub alert_records: u64,
    pub active_alerts: u64,
    pub threshold_records: u64,
    pub update_runs: u64,
    pub unique_locations: u64,
    pub database_size_bytes: u64,
}

/// Rows removed by a retention cleanup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub readings_deleted: usize,
    pub forecasts_deleted: usize,
    pub alerts_deleted: usize,
    pub update_runs_deleted: usize,
}

impl CleanupReport {
    /// Total rows removed
    #[must_use]
    pub const fn total(&self) -> usize {
        self.readings_deleted + self.forecasts_deleted + self.alerts_deleted + self.update_runs_deleted
    }
}

/// Port for reading and forecast persistence
#[allow(clippy::struct_field_names)] // automock generates struct with `get_*` prefixes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Persist a reading, returning its row id
    async fn store_reading(&self, reading: &WeatherReading) -> Result<i64, ApplicationError>;

    /// Persist forecast days, replacing existing rows for the same date
    async fn store_forecast(&self, forecast: &Forecast) -> Result<usize, ApplicationError>;

    /// Readings captured within the last `since_hours`, newest first
    async fn get_recent_readings(
        &self,
        location: &LocationKey,
        since_hours: u32,
    ) -> Result<Vec<WeatherReading>, ApplicationError>;

    /// Aggregates over the last `days`; `None` when there is no data
    async fn get_trends(
        &self,
        location: &LocationKey,
        days: u32,
    ) -> Result<Option<WeatherTrends>, ApplicationError>;

    async fn get_stats(&self) -> Result<StorageStats, ApplicationError>;

    /// Delete data older than `older_than_days`
    async fn cleanup(&self, older_than_days: u32) -> Result<CleanupReport, ApplicationError>;

    /// Reclaim space and refresh planner statistics
    async fn compact(&self) -> Result<(), ApplicationError>;

    /// Append a batch outcome to the update run log
    async fn record_update(&self, result: &UpdateResult) -> Result<(), ApplicationError>;

    /// Finish time of the most recent successful batch
    async fn last_successful_update(&self) -> Result<Option<DateTime<Utc>>, ApplicationError>;
}
