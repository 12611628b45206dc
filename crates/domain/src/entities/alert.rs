//! Alert entity - a triggered weather condition for a location

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{AlertId, LocationKey};

/// Kind of weather condition an alert reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Temperature above threshold
    TemperatureHigh,
    /// Temperature below threshold
    TemperatureLow,
    /// Heavy precipitation
    HeavyRain,
    /// Wind speed above threshold
    StrongWind,
    /// Humidity above threshold
    HumidityHigh,
    /// Pressure fell sharply over recent hours
    PressureDrop,
    /// UV index above threshold
    UvHigh,
    /// Visibility below threshold
    VisibilityLow,
    /// Significant change in conditions
    WeatherChange,
}

impl AlertType {
    /// Every alert type
    pub const ALL: [Self; 9] = [
        Self::TemperatureHigh,
        Self::TemperatureLow,
        Self::HeavyRain,
        Self::StrongWind,
        Self::HumidityHigh,
        Self::PressureDrop,
        Self::UvHigh,
        Self::VisibilityLow,
        Self::WeatherChange,
    ];

    /// Stable wire/storage name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TemperatureHigh => "temperature_high",
            Self::TemperatureLow => "temperature_low",
            Self::HeavyRain => "heavy_rain",
            Self::StrongWind => "strong_wind",
            Self::HumidityHigh => "humidity_high",
            Self::PressureDrop => "pressure_drop",
            Self::UvHigh => "uv_high",
            Self::VisibilityLow => "visibility_low",
            Self::WeatherChange => "weather_change",
        }
    }

    /// Human-readable label ("Temperature High")
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TemperatureHigh => "Temperature High",
            Self::TemperatureLow => "Temperature Low",
            Self::HeavyRain => "Heavy Rain",
            Self::StrongWind => "Strong Wind",
            Self::HumidityHigh => "Humidity High",
            Self::PressureDrop => "Pressure Drop",
            Self::UvHigh => "Uv High",
            Self::VisibilityLow => "Visibility Low",
            Self::WeatherChange => "Weather Change",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("unknown alert type: {s}")))
    }
}

/// Alert severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Critical
    Critical,
}

impl AlertSeverity {
    /// Severity from how far a temperature is past its threshold
    ///
    /// More than 15 degrees is critical, more than 10 high, more than 5
    /// medium, anything else low.
    #[must_use]
    pub fn from_temperature_delta(value: f64, threshold: f64) -> Self {
        let diff = (value - threshold).abs();
        if diff > 15.0 {
            Self::Critical
        } else if diff > 10.0 {
            Self::High
        } else if diff > 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Wind is high severity once it exceeds 1.5x the threshold
    #[must_use]
    pub fn for_wind(speed: f64, threshold: f64) -> Self {
        if speed > threshold * 1.5 {
            Self::High
        } else {
            Self::Medium
        }
    }

    /// UV above 10 is high severity regardless of threshold
    #[must_use]
    pub fn for_uv(uv_index: f64) -> Self {
        if uv_index > 10.0 { Self::High } else { Self::Medium }
    }

    /// Visibility under half a kilometer is high severity
    #[must_use]
    pub fn for_visibility(visibility_km: f64) -> Self {
        if visibility_km < 0.5 {
            Self::High
        } else {
            Self::Medium
        }
    }

    /// Stable wire/storage name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertSeverity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(DomainError::ValidationError(format!(
                "unknown alert severity: {other}"
            ))),
        }
    }
}

/// A triggered alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Fingerprint of (location, type, day)
    pub id: AlertId,
    /// Location identity
    pub location: LocationKey,
    /// Location display name
    pub location_name: String,
    /// What triggered
    pub alert_type: AlertType,
    /// How bad it is
    pub severity: AlertSeverity,
    /// Short title
    pub title: String,
    /// Detail text
    pub description: String,
    /// When the condition was first observed
    pub start_time: DateTime<Utc>,
    /// When the condition ended, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// When the alert record was created
    pub created_at: DateTime<Utc>,
    /// Whether the alert is still active
    pub is_active: bool,
}

impl Alert {
    /// Raise a new active alert observed at `at`
    ///
    /// The id is the fingerprint of the location, the type and the UTC
    /// calendar day of `at`.
    #[must_use]
    pub fn raise(
        location: LocationKey,
        location_name: impl Into<String>,
        alert_type: AlertType,
        severity: AlertSeverity,
        title: impl Into<String>,
        description: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let id = AlertId::fingerprint(&location, alert_type, at.date_naive());
        Self {
            id,
            location,
            location_name: location_name.into(),
            alert_type,
            severity,
            title: title.into(),
            description: description.into(),
            start_time: at,
            end_time: None,
            created_at: at,
            is_active: true,
        }
    }

    /// Close the alert
    pub fn deactivate(&mut self, at: DateTime<Utc>) {
        self.is_active = false;
        self.end_time = Some(at);
    }
}
