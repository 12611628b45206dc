//! Alerting thresholds
//!
//! Every location is evaluated against the system defaults. Custom rows
//! stored for a location overwrite the default of their metric.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::LocationKey;

/// Which side of the trigger value raises an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Alert when the observed value is above the trigger
    Upper,
    /// Alert when the observed value is below the trigger
    Lower,
}

/// A measured quantity that can carry a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TemperatureHigh,
    TemperatureLow,
    WindSpeed,
    Humidity,
    UvIndex,
    Visibility,
    PressureDrop,
}

impl Metric {
    /// Every metric, in evaluation order
    pub const ALL: [Self; 7] = [
        Self::TemperatureHigh,
        Self::TemperatureLow,
        Self::WindSpeed,
        Self::Humidity,
        Self::UvIndex,
        Self::Visibility,
        Self::PressureDrop,
    ];

    /// Stable storage name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TemperatureHigh => "temperature_high",
            Self::TemperatureLow => "temperature_low",
            Self::WindSpeed => "wind_speed",
            Self::Humidity => "humidity",
            Self::UvIndex => "uv_index",
            Self::Visibility => "visibility",
            Self::PressureDrop => "pressure_drop",
        }
    }

    /// System default trigger value
    #[must_use]
    pub const fn default_trigger(&self) -> f64 {
        match self {
            Self::TemperatureHigh => 35.0,
            Self::TemperatureLow => -10.0,
            Self::WindSpeed => 50.0,
            Self::Humidity => 90.0,
            Self::UvIndex => 8.0,
            Self::Visibility => 1.0,
            Self::PressureDrop => 10.0,
        }
    }

    #[must_use]
    pub const fn bound(&self) -> Bound {
        match self {
            Self::TemperatureLow | Self::Visibility => Bound::Lower,
            Self::TemperatureHigh
            | Self::WindSpeed
            | Self::Humidity
            | Self::UvIndex
            | Self::PressureDrop => Bound::Upper,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Metric {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DomainError::UnknownMetric(s.to_string()))
    }
}

/// A custom threshold for one (location, metric) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub location: LocationKey,
    pub metric: Metric,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub message: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Threshold {
    /// Create an enabled threshold
    ///
    /// An absent or blank message becomes `"Custom {metric} alert for {location}"`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidThreshold` if both bounds are absent, a
    /// bound is not finite, or `min_value > max_value`.
    pub fn new(
        location: LocationKey,
        metric: Metric,
        min_value: Option<f64>,
        max_value: Option<f64>,
        message: Option<String>,
    ) -> Result<Self, DomainError> {
        if min_value.is_none() && max_value.is_none() {
            return Err(DomainError::InvalidThreshold(format!(
                "{metric} threshold needs a min or max value"
            )));
        }
        if min_value.into_iter().chain(max_value).any(|v| !v.is_finite()) {
            return Err(DomainError::InvalidThreshold(format!(
                "{metric} threshold bounds must be finite"
            )));
        }
        if let (Some(min), Some(max)) = (min_value, max_value) {
            if min > max {
                return Err(DomainError::InvalidThreshold(format!(
                    "{metric} threshold min {min} exceeds max {max}"
                )));
            }
        }

        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Custom {metric} alert for {location}"));

        Ok(Self {
            location,
            metric,
            min_value,
            max_value,
            message,
            enabled: true,
            created_at: Utc::now(),
        })
    }

    /// The value this row triggers at
    ///
    /// Upper metrics prefer `max_value`, lower metrics prefer `min_value`;
    /// each falls back to the other bound.
    #[must_use]
    pub fn trigger_value(&self) -> Option<f64> {
        match self.metric.bound() {
            Bound::Upper => self.max_value.or(self.min_value),
            Bound::Lower => self.min_value.or(self.max_value),
        }
    }
}

/// Effective trigger values for one location after overlaying custom rows
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedThresholds(BTreeMap<Metric, f64>);

impl ResolvedThresholds {
    /// System defaults for every metric
    #[must_use]
    pub fn defaults() -> Self {
        Self(
            Metric::ALL
                .into_iter()
                .map(|m| (m, m.default_trigger()))
                .collect(),
        )
    }

    /// Overwrite metrics with custom rows
    ///
    /// Disabled rows and rows without a usable bound are skipped. When the
    /// same metric appears twice the later row wins.
    #[must_use]
    pub fn overlay(mut self, custom: &[Threshold]) -> Self {
        for row in custom.iter().filter(|t| t.enabled) {
            if let Some(value) = row.trigger_value() {
                self.0.insert(row.metric, value);
            }
        }
        self
    }

    /// Trigger value for a metric
    #[must_use]
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied()
    }
}

impl Default for ResolvedThresholds {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> LocationKey {
        LocationKey::new("Riverside").unwrap()
    }

    #[test]
    fn defaults_cover_every_metric() {
        let resolved = ResolvedThresholds::defaults();
        for m in Metric::ALL {
            assert_eq!(resolved.value(m), Some(m.default_trigger()));
        }
    }

    #[test]
    fn metric_parse() {
        assert_eq!("wind_speed".parse::<Metric>().unwrap(), Metric::WindSpeed);
        assert!(matches!(
            "rainfall".parse::<Metric>(),
            Err(DomainError::UnknownMetric(_))
        ));
    }

    #[test]
    fn threshold_requires_a_bound() {
        let err = Threshold::new(key(), Metric::Humidity, None, None, None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidThreshold(_)));
    }

    #[test]
    fn threshold_rejects_inverted_bounds() {
        assert!(Threshold::new(key(), Metric::Humidity, Some(80.0), Some(20.0), None).is_err());
    }

    #[test]
    fn threshold_rejects_non_finite() {
        assert!(Threshold::new(key(), Metric::Humidity, None, Some(f64::INFINITY), None).is_err());
    }

    #[test]
    fn default_message_names_metric_and_location() {
        let t = Threshold::new(key(), Metric::WindSpeed, None, Some(40.0), None).unwrap();
        assert_eq!(t.message, "Custom wind_speed alert for riverside");

        let t = Threshold::new(key(), Metric::WindSpeed, None, Some(40.0), Some("  ".into()))
            .unwrap();
        assert_eq!(t.message, "Custom wind_speed alert for riverside");
    }

    #[test]
    fn trigger_value_prefers_bound_side() {
        let upper =
            Threshold::new(key(), Metric::TemperatureHigh, Some(20.0), Some(30.0), None).unwrap();
        assert_eq!(upper.trigger_value(), Some(30.0));

        let lower =
            Threshold::new(key(), Metric::TemperatureLow, Some(-5.0), Some(0.0), None).unwrap();
        assert_eq!(lower.trigger_value(), Some(-5.0));

        let fallback = Threshold::new(key(), Metric::Visibility, None, Some(2.0), None).unwrap();
        assert_eq!(fallback.trigger_value(), Some(2.0));

        let fallback = Threshold::new(key(), Metric::UvIndex, Some(6.0), None, None).unwrap();
        assert_eq!(fallback.trigger_value(), Some(6.0));
    }

    #[test]
    fn overlay_replaces_only_custom_metrics() {
        let custom = vec![
            Threshold::new(key(), Metric::TemperatureHigh, None, Some(25.0), None).unwrap(),
        ];
        let resolved = ResolvedThresholds::defaults().overlay(&custom);

        assert_eq!(resolved.value(Metric::TemperatureHigh), Some(25.0));
        assert_eq!(resolved.value(Metric::WindSpeed), Some(50.0));
    }

    #[test]
    fn overlay_skips_disabled_rows() {
        let mut row = Threshold::new(key(), Metric::Humidity, None, Some(60.0), None).unwrap();
        row.enabled = false;
        let resolved = ResolvedThresholds::defaults().overlay(&[row]);
        assert_eq!(resolved.value(Metric::Humidity), Some(90.0));
    }

    #[test]
    fn visibility_alerts_below_trigger() {
        assert_eq!(Metric::Visibility.bound(), Bound::Lower);
        assert_eq!(Metric::WindSpeed.bound(), Bound::Upper);
    }
}
