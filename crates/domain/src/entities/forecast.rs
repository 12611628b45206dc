//! Forecast entities - per-day aggregates for a location

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Location, WeatherReading};

/// Aggregated forecast for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Forecast date (location-local)
    pub date: NaiveDate,
    /// Maximum temperature in Celsius
    pub max_temp_c: f64,
    /// Maximum temperature in Fahrenheit
    pub max_temp_f: f64,
    /// Minimum temperature in Celsius
    pub min_temp_c: f64,
    /// Minimum temperature in Fahrenheit
    pub min_temp_f: f64,
    /// Average temperature in Celsius
    pub avg_temp_c: f64,
    /// Average temperature in Fahrenheit
    pub avg_temp_f: f64,
    /// Condition text
    pub condition: String,
    /// Chance of rain (0-100)
    pub chance_of_rain: u8,
    /// Chance of snow (0-100)
    pub chance_of_snow: u8,
    /// Maximum wind in km/h
    pub max_wind_kph: f64,
    /// Maximum wind in mph
    pub max_wind_mph: f64,
    /// Total precipitation in millimeters
    pub total_precip_mm: f64,
    /// Total precipitation in inches
    pub total_precip_in: f64,
    /// Average humidity (0-100)
    pub avg_humidity: u8,
    /// UV index
    pub uv_index: f64,
    /// Sunrise, provider-local ("06:12 AM")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<String>,
    /// Sunset, provider-local
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset: Option<String>,
    /// Moonrise, provider-local
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moonrise: Option<String>,
    /// Moonset, provider-local
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moonset: Option<String>,
    /// Moon phase name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moon_phase: Option<String>,
}

impl ForecastDay {
    /// Temperature spread between the day's extremes in Celsius
    #[must_use]
    pub fn temperature_range_c(&self) -> f64 {
        self.max_temp_c - self.min_temp_c
    }
}

/// Multi-day forecast for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Location the forecast is for
    pub location: Location,
    /// Current conditions delivered with the forecast
    pub current: WeatherReading,
    /// Days in ascending date order
    pub days: Vec<ForecastDay>,
    /// When the forecast was fetched
    pub fetched_at: DateTime<Utc>,
}

impl Forecast {
    /// Build a forecast, ordering days by date and dropping duplicate dates
    ///
    /// Later entries for the same date replace earlier ones, mirroring the
    /// replace-on-conflict storage semantics.
    #[must_use]
    pub fn new(
        location: Location,
        current: WeatherReading,
        days: Vec<ForecastDay>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut by_date = std::collections::BTreeMap::new();
        for day in days {
            by_date.insert(day.date, day);
        }

        Self {
            location,
            current,
            days: by_date.into_values().collect(),
            fetched_at,
        }
    }

    /// Forecast for a specific date, if present
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&ForecastDay> {
        self.days.iter().find(|d| d.date == date)
    }
}
