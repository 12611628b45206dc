//! Weather reading - one point-in-time observation for a location

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Location;
use crate::errors::DomainError;
use crate::value_objects::{Humidity, LocationKey};

/// Source tag used for readings fetched from weatherapi.com
pub const DEFAULT_SOURCE: &str = "weatherapi";

/// Current conditions at a location
///
/// Readings are produced once per fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Where the reading was taken
    pub location: Location,
    /// Air temperature in Celsius
    pub temperature_c: f64,
    /// Air temperature in Fahrenheit
    pub temperature_f: f64,
    /// Feels-like temperature in Celsius
    pub feels_like_c: f64,
    /// Feels-like temperature in Fahrenheit
    pub feels_like_f: f64,
    /// Provider condition text ("Partly cloudy", "Heavy rain", ...)
    pub condition: String,
    /// Relative humidity
    pub humidity: Humidity,
    /// Wind speed in km/h
    pub wind_kph: f64,
    /// Wind speed in mph
    pub wind_mph: f64,
    /// Compass direction ("NNE")
    pub wind_direction: String,
    /// Wind direction in degrees (0-360)
    pub wind_degree: u16,
    /// Pressure in millibars
    pub pressure_mb: f64,
    /// Pressure in inches of mercury
    pub pressure_in: f64,
    /// Visibility in kilometers
    pub visibility_km: f64,
    /// Visibility in miles
    pub visibility_miles: f64,
    /// UV index
    pub uv_index: f64,
    /// When the provider captured the observation
    pub captured_at: DateTime<Utc>,
    /// Data source tag
    pub source: String,
}

impl WeatherReading {
    /// Identity key of the reading's location
    #[must_use]
    pub const fn key(&self) -> &LocationKey {
        &self.location.key
    }

    /// Check the invariants a provider payload cannot express in types
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidReading` naming the first offending field.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.wind_degree > 360 {
            return Err(DomainError::InvalidReading(format!(
                "wind degree {} outside 0-360",
                self.wind_degree
            )));
        }

        let numeric = [
            ("temperature_c", self.temperature_c),
            ("temperature_f", self.temperature_f),
            ("feels_like_c", self.feels_like_c),
            ("feels_like_f", self.feels_like_f),
            ("wind_kph", self.wind_kph),
            ("wind_mph", self.wind_mph),
            ("pressure_mb", self.pressure_mb),
            ("pressure_in", self.pressure_in),
            ("visibility_km", self.visibility_km),
            ("visibility_miles", self.visibility_miles),
            ("uv_index", self.uv_index),
        ];
        if let Some((field, _)) = numeric.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DomainError::InvalidReading(format!(
                "{field} is not a finite number"
            )));
        }

        if self.wind_kph < 0.0 || self.visibility_km < 0.0 || self.uv_index < 0.0 {
            return Err(DomainError::InvalidReading(
                "wind speed, visibility and UV index must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::value_objects::GeoLocation;

    /// A mild reading for the given location name
    pub fn reading(name: &str) -> WeatherReading {
        let location = Location::new(name, "Testland", GeoLocation::new(10.0, 20.0).unwrap())
            .unwrap();
        WeatherReading {
            location,
            temperature_c: 21.0,
            temperature_f: 69.8,
            feels_like_c: 21.0,
            feels_like_f: 69.8,
            condition: "Sunny".to_string(),
            humidity: Humidity::new(50).unwrap(),
            wind_kph: 10.0,
            wind_mph: 6.2,
            wind_direction: "N".to_string(),
            wind_degree: 0,
            pressure_mb: 1013.0,
            pressure_in: 29.91,
            visibility_km: 10.0,
            visibility_miles: 6.0,
            uv_index: 3.0,
            captured_at: Utc::now(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}
