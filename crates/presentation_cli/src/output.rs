//! File output for one-shot commands

use std::path::Path;

use anyhow::Context;
use domain::entities::Forecast;

/// Write a forecast as pretty-printed JSON, replacing any existing file
///
/// # Errors
///
/// Returns an error if the forecast cannot be serialized or the file cannot
/// be written.
pub fn save_forecast(path: &Path, forecast: &Forecast) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(forecast)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write forecast to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use domain::entities::{ForecastDay, Location, WeatherReading};
    use domain::value_objects::{GeoLocation, Humidity};

    use super::*;

    fn forecast() -> Forecast {
        let location =
            Location::new("Tokyo", "Japan", GeoLocation::new(35.69, 139.69).unwrap()).unwrap();
        let current = WeatherReading {
            location: location.clone(),
            temperature_c: 21.5,
            temperature_f: 70.7,
            feels_like_c: 21.0,
            feels_like_f: 69.8,
            condition: "Sunny".to_string(),
            humidity: Humidity::new(55).unwrap(),
            wind_kph: 12.0,
            wind_mph: 7.5,
            wind_direction: "SE".to_string(),
            wind_degree: 135,
            pressure_mb: 1012.0,
            pressure_in: 29.88,
            visibility_km: 10.0,
            visibility_miles: 6.0,
            uv_index: 5.0,
            captured_at: Utc::now(),
            source: "weatherapi".to_string(),
        };
        let day = ForecastDay {
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            max_temp_c: 24.0,
            max_temp_f: 75.2,
            min_temp_c: 16.0,
            min_temp_f: 60.8,
            avg_temp_c: 20.0,
            avg_temp_f: 68.0,
            condition: "Partly cloudy".to_string(),
            chance_of_rain: 20,
            chance_of_snow: 0,
            max_wind_kph: 18.0,
            max_wind_mph: 11.2,
            total_precip_mm: 0.4,
            total_precip_in: 0.02,
            avg_humidity: 60,
            uv_index: 6.0,
            sunrise: None,
            sunset: None,
            moonrise: None,
            moonset: None,
            moon_phase: None,
        };
        Forecast::new(location, current, vec![day], Utc::now())
    }

    #[test]
    fn saved_forecast_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokyo.json");
        let forecast = forecast();

        save_forecast(&path, &forecast).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: Forecast = serde_json::from_str(&contents).unwrap();
        assert_eq!(loaded, forecast);
        assert_eq!(loaded.days[0].condition, "Partly cloudy");
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.json");
        std::fs::write(&path, "stale").unwrap();

        save_forecast(&path, &forecast()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["location"]["name"], "Tokyo");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("forecast.json");

        let err = save_forecast(&path, &forecast()).unwrap_err();
        assert!(err.to_string().contains("forecast.json"));
    }
}
