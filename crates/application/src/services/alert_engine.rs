//! Alert engine
//!
//! Evaluates readings against the effective thresholds of their location,
//! deduplicates by fingerprint, persists new alerts and notifies about them.
//!
//! The active set maps each alert id to the UTC day it was reserved on.
//! Checking and reserving an id happen under one lock, so two evaluations
//! racing on the same condition produce a single alert.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use domain::entities::{
    Alert, AlertSeverity, AlertType, Metric, ResolvedThresholds, Threshold, WeatherReading,
};
use domain::value_objects::{AlertId, LocationKey};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{AlertStore, NotifierPort, ReadingStore, ThresholdStore},
};

/// Configuration for the alert engine
#[derive(Debug, Clone)]
pub struct AlertEngineConfig {
    /// How far back pressure history reaches (default: 6 hours)
    pub pressure_history_hours: u32,
}

impl Default for AlertEngineConfig {
    fn default() -> Self {
        Self {
            pressure_history_hours: 6,
        }
    }
}

/// Threshold evaluation, deduplication and dispatch
pub struct AlertEngine {
    readings: Arc<dyn ReadingStore>,
    alerts: Arc<dyn AlertStore>,
    thresholds: Arc<dyn ThresholdStore>,
    notifier: Arc<dyn NotifierPort>,
    active: Mutex<HashMap<AlertId, NaiveDate>>,
    config: AlertEngineConfig,
}

impl std::fmt::Debug for AlertEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEngine")
            .field("config", &self.config)
            .field("active", &self.active.lock().len())
            .finish_non_exhaustive()
    }
}

impl AlertEngine {
    #[must_use]
    pub fn new(
        readings: Arc<dyn ReadingStore>,
        alerts: Arc<dyn AlertStore>,
        thresholds: Arc<dyn ThresholdStore>,
        notifier: Arc<dyn NotifierPort>,
        config: AlertEngineConfig,
    ) -> Self {
        Self {
            readings,
            alerts,
            thresholds,
            notifier,
            active: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Evaluate a reading now, returning only newly raised alerts
    pub async fn evaluate(&self, reading: &WeatherReading) -> Vec<Alert> {
        self.evaluate_at(reading, Utc::now()).await
    }

    /// Evaluate a reading as of `now`
    #[instrument(skip(self, reading), fields(location = %reading.key()))]
    pub async fn evaluate_at(&self, reading: &WeatherReading, now: DateTime<Utc>) -> Vec<Alert> {
        let thresholds = self.effective_thresholds(reading.key()).await;

        let mut candidates = check_thresholds(reading, &thresholds, now);
        if let Some(alert) = self.check_pressure(reading, &thresholds, now).await {
            candidates.push(alert);
        }

        let today = now.date_naive();
        let mut raised = Vec::new();

        for alert in candidates {
            if !self.reserve(&alert.id, today) {
                debug!(alert_id = %alert.id, alert_type = %alert.alert_type, "Alert already active today");
                continue;
            }

            if let Err(e) = self.alerts.store_alert(&alert).await {
                error!(alert_id = %alert.id, error = %e, "Failed to persist alert");
                self.release(&alert.id);
                continue;
            }

            if let Err(e) = self.notifier.send(&alert).await {
                error!(alert_id = %alert.id, error = %e, "Failed to send alert notification");
            }

            raised.push(alert);
        }

        if !raised.is_empty() {
            info!(count = raised.len(), "Generated new alerts");
        }

        raised
    }

    /// Store a custom threshold for a location
    ///
    /// # Errors
    ///
    /// Returns an error if the location or metric name is invalid, both
    /// bounds are absent, or the threshold cannot be stored.
    #[instrument(skip(self, message))]
    pub async fn set_custom_threshold(
        &self,
        location: &str,
        metric: &str,
        min_value: Option<f64>,
        max_value: Option<f64>,
        message: Option<String>,
    ) -> Result<Threshold, ApplicationError> {
        let key = LocationKey::new(location)?;
        let metric: Metric = metric.parse()?;
        let threshold = Threshold::new(key, metric, min_value, max_value, message)?;

        self.thresholds.upsert_threshold(&threshold).await?;

        info!(location = %threshold.location, metric = %threshold.metric, "Set custom threshold");
        Ok(threshold)
    }

    /// Seed the active set with persisted alerts that started today (UTC)
    ///
    /// # Errors
    ///
    /// Returns an error if active alerts cannot be loaded.
    pub async fn restore_active(&self) -> Result<usize, ApplicationError> {
        self.restore_active_at(Utc::now()).await
    }

    /// Seed the active set as of `now`
    ///
    /// # Errors
    ///
    /// Returns an error if active alerts cannot be loaded.
    pub async fn restore_active_at(&self, now: DateTime<Utc>) -> Result<usize, ApplicationError> {
        let today = now.date_naive();
        let persisted = self.alerts.get_active_alerts(None).await?;

        let mut active = self.active.lock();
        let mut seeded = 0;
        for alert in persisted {
            if alert.start_time.date_naive() == today {
                active.insert(alert.id, today);
                seeded += 1;
            }
        }

        info!(seeded, "Restored active alert set");
        Ok(seeded)
    }

    /// Number of alert ids currently reserved
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    async fn effective_thresholds(&self, key: &LocationKey) -> ResolvedThresholds {
        match self.thresholds.get_thresholds(key).await {
            Ok(rows) => ResolvedThresholds::defaults().overlay(&rows),
            Err(e) => {
                warn!(location = %key, error = %e, "Failed to load custom thresholds, using defaults");
                ResolvedThresholds::defaults()
            },
        }
    }

    async fn check_pressure(
        &self,
        reading: &WeatherReading,
        thresholds: &ResolvedThresholds,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let threshold = thresholds.value(Metric::PressureDrop)?;

        let history = match self
            .readings
            .get_recent_readings(reading.key(), self.config.pressure_history_hours)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                error!(location = %reading.key(), error = %e, "Failed to load pressure history");
                return None;
            },
        };

        let pressures: Vec<f64> = history.iter().map(|r| r.pressure_mb).collect();
        let drop = pressure_drop(&pressures, reading.pressure_mb, threshold)?;

        Some(raise(
            reading,
            AlertType::PressureDrop,
            AlertSeverity::Medium,
            format!("Pressure Drop Alert - {}", reading.location.name),
            format!("Pressure dropped {drop:.1} mb in recent hours"),
            now,
        ))
    }

    /// Atomically check and reserve an id for `today`
    ///
    /// Entries from earlier days are pruned first.
    fn reserve(&self, id: &AlertId, today: NaiveDate) -> bool {
        let mut active = self.active.lock();
        active.retain(|_, day| *day >= today);
        if active.contains_key(id) {
            return false;
        }
        active.insert(id.clone(), today);
        true
    }

    fn release(&self, id: &AlertId) {
        self.active.lock().remove(id);
    }
}

/// Pressure fall from the recent maximum, if it exceeds `threshold`
///
/// Needs at least two historical samples.
fn pressure_drop(history: &[f64], current: f64, threshold: f64) -> Option<f64> {
    if history.len() < 2 {
        return None;
    }
    let max = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let drop = max - current;
    (drop > threshold).then_some(drop)
}

fn raise(
    reading: &WeatherReading,
    alert_type: AlertType,
    severity: AlertSeverity,
    title: String,
    description: String,
    now: DateTime<Utc>,
) -> Alert {
    Alert::raise(
        reading.key().clone(),
        reading.location.name.clone(),
        alert_type,
        severity,
        title,
        description,
        now,
    )
}

/// Evaluate every non-historical metric of a reading
fn check_thresholds(
    reading: &WeatherReading,
    thresholds: &ResolvedThresholds,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let name = &reading.location.name;
    let mut alerts = Vec::new();

    if let Some(th) = thresholds.value(Metric::TemperatureHigh) {
        let t = reading.temperature_c;
        if t > th {
            alerts.push(raise(
                reading,
                AlertType::TemperatureHigh,
                AlertSeverity::from_temperature_delta(t, th),
                format!("High Temperature Alert - {name}"),
                format!("Temperature {t:.1}°C exceeds threshold {th:.1}°C"),
                now,
            ));
        }
    }

    if let Some(th) = thresholds.value(Metric::TemperatureLow) {
        let t = reading.temperature_c;
        if t < th {
            alerts.push(raise(
                reading,
                AlertType::TemperatureLow,
                AlertSeverity::from_temperature_delta(t, th),
                format!("Low Temperature Alert - {name}"),
                format!("Temperature {t:.1}°C below threshold {th:.1}°C"),
                now,
            ));
        }
    }

    if let Some(th) = thresholds.value(Metric::WindSpeed) {
        let w = reading.wind_kph;
        if w > th {
            alerts.push(raise(
                reading,
                AlertType::StrongWind,
                AlertSeverity::for_wind(w, th),
                format!("Strong Wind Alert - {name}"),
                format!("Wind speed {w:.1} km/h exceeds threshold {th:.1} km/h"),
                now,
            ));
        }
    }

    if let Some(th) = thresholds.value(Metric::Humidity) {
        if reading.humidity.exceeds(th) {
            alerts.push(raise(
                reading,
                AlertType::HumidityHigh,
                AlertSeverity::Medium,
                format!("High Humidity Alert - {name}"),
                format!("Humidity {} exceeds threshold {th:.1}%", reading.humidity),
                now,
            ));
        }
    }

    if let Some(th) = thresholds.value(Metric::UvIndex) {
        let uv = reading.uv_index;
        if uv > th {
            alerts.push(raise(
                reading,
                AlertType::UvHigh,
                AlertSeverity::for_uv(uv),
                format!("High UV Index Alert - {name}"),
                format!("UV index {uv:.1} exceeds safe threshold {th:.1}"),
                now,
            ));
        }
    }

    if let Some(th) = thresholds.value(Metric::Visibility) {
        let v = reading.visibility_km;
        if v < th {
            alerts.push(raise(
                reading,
                AlertType::VisibilityLow,
                AlertSeverity::for_visibility(v),
                format!("Low Visibility Alert - {name}"),
                format!("Visibility {v:.1} km below threshold {th:.1} km"),
                now,
            ));
        }
    }

    alerts
}
