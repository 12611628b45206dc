//! weatherapi.com payload models
//!
//! Raw response shapes and their conversion into domain records. Fields the
//! pipeline does not use (air quality, icons, hourly data) are not modeled.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use domain::entities::{DEFAULT_SOURCE, Forecast, ForecastDay, Location, WeatherReading};
use domain::value_objects::{GeoLocation, Humidity};
use serde::Deserialize;

use crate::client::FetchError;

/// Provider timestamp format for `localtime` and `last_updated`
const PROVIDER_DATETIME: &str = "%Y-%m-%d %H:%M";

/// `/current.json` response
#[derive(Debug, Deserialize)]
pub(crate) struct CurrentResponse {
    pub location: ApiLocation,
    pub current: ApiCurrent,
}

/// `/forecast.json` response
#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    pub location: ApiLocation,
    pub current: ApiCurrent,
    pub forecast: ApiForecast,
}

/// Error body sent with non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiLocation {
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tz_id: Option<String>,
    /// Local wall-clock time, "2026-07-14 9:05"
    #[serde(default)]
    pub localtime: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCondition {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCurrent {
    #[serde(default)]
    pub last_updated_epoch: Option<i64>,
    pub last_updated: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub condition: ApiCondition,
    pub humidity: i64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub wind_kph: f64,
    pub wind_mph: f64,
    pub wind_dir: String,
    pub wind_degree: i64,
    pub pressure_mb: f64,
    pub pressure_in: f64,
    pub vis_km: f64,
    pub vis_miles: f64,
    pub uv: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiForecast {
    pub forecastday: Vec<ApiForecastDay>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiForecastDay {
    pub date: String,
    pub day: ApiDay,
    #[serde(default)]
    pub astro: Option<ApiAstro>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiDay {
    pub maxtemp_c: f64,
    pub maxtemp_f: f64,
    pub mintemp_c: f64,
    pub mintemp_f: f64,
    pub avgtemp_c: f64,
    pub avgtemp_f: f64,
    pub condition: ApiCondition,
    #[serde(default)]
    pub daily_chance_of_rain: f64,
    #[serde(default)]
    pub daily_chance_of_snow: f64,
    pub maxwind_kph: f64,
    pub maxwind_mph: f64,
    pub totalprecip_mm: f64,
    pub totalprecip_in: f64,
    pub avghumidity: f64,
    pub uv: f64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiAstro {
    #[serde(default)]
    pub sunrise: Option<String>,
    #[serde(default)]
    pub sunset: Option<String>,
    #[serde(default)]
    pub moonrise: Option<String>,
    #[serde(default)]
    pub moonset: Option<String>,
    #[serde(default)]
    pub moon_phase: Option<String>,
}

impl ApiLocation {
    pub(crate) fn into_domain(self) -> Result<Location, FetchError> {
        let coordinates = GeoLocation::new(self.lat, self.lon)
            .map_err(|e| FetchError::Validation(e.to_string()))?;

        let mut location = Location::new(self.name, self.country, coordinates)
            .map_err(|e| FetchError::Validation(e.to_string()))?;

        if let Some(region) = self.region {
            location = location.with_region(region);
        }
        if let Some(tz) = self.tz_id {
            location = location.with_timezone(tz);
        }
        if let Some(local) = self
            .localtime
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), PROVIDER_DATETIME).ok())
        {
            location = location.with_local_time(local);
        }

        Ok(location)
    }
}

impl ApiCurrent {
    pub(crate) fn into_reading(self, location: Location) -> Result<WeatherReading, FetchError> {
        let humidity = u16::try_from(self.humidity)
            .ok()
            .and_then(|h| Humidity::new(h).ok())
            .ok_or_else(|| {
                FetchError::Validation(format!("humidity {} outside 0-100", self.humidity))
            })?;

        let wind_degree = u16::try_from(self.wind_degree)
            .ok()
            .filter(|d| *d <= 360)
            .ok_or_else(|| {
                FetchError::Validation(format!("wind degree {} outside 0-360", self.wind_degree))
            })?;

        let captured_at = captured_at(self.last_updated_epoch, &self.last_updated)?;

        let reading = WeatherReading {
            location,
            temperature_c: self.temp_c,
            temperature_f: self.temp_f,
            feels_like_c: self.feelslike_c,
            feels_like_f: self.feelslike_f,
            condition: self.condition.text,
            humidity,
            wind_kph: self.wind_kph,
            wind_mph: self.wind_mph,
            wind_direction: self.wind_dir,
            wind_degree,
            pressure_mb: self.pressure_mb,
            pressure_in: self.pressure_in,
            visibility_km: self.vis_km,
            visibility_miles: self.vis_miles,
            uv_index: self.uv,
            captured_at,
            source: DEFAULT_SOURCE.to_string(),
        };

        reading
            .validate()
            .map_err(|e| FetchError::Validation(e.to_string()))?;
        Ok(reading)
    }
}

impl ApiForecastDay {
    fn into_domain(self) -> Result<ForecastDay, FetchError> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| FetchError::Validation(format!("invalid forecast date {}: {e}", self.date)))?;
        let astro = self.astro.unwrap_or_default();
        let day = self.day;

        Ok(ForecastDay {
            date,
            max_temp_c: day.maxtemp_c,
            max_temp_f: day.maxtemp_f,
            min_temp_c: day.mintemp_c,
            min_temp_f: day.mintemp_f,
            avg_temp_c: day.avgtemp_c,
            avg_temp_f: day.avgtemp_f,
            condition: day.condition.text,
            chance_of_rain: percentage("daily_chance_of_rain", day.daily_chance_of_rain)?,
            chance_of_snow: percentage("daily_chance_of_snow", day.daily_chance_of_snow)?,
            max_wind_kph: day.maxwind_kph,
            max_wind_mph: day.maxwind_mph,
            total_precip_mm: day.totalprecip_mm,
            total_precip_in: day.totalprecip_in,
            avg_humidity: percentage("avghumidity", day.avghumidity)?,
            uv_index: day.uv,
            sunrise: astro.sunrise,
            sunset: astro.sunset,
            moonrise: astro.moonrise,
            moonset: astro.moonset,
            moon_phase: astro.moon_phase,
        })
    }
}

impl ForecastResponse {
    pub(crate) fn into_domain(self) -> Result<Forecast, FetchError> {
        let location = self.location.into_domain()?;
        let current = self.current.into_reading(location.clone())?;
        let days = self
            .forecast
            .forecastday
            .into_iter()
            .map(ApiForecastDay::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Forecast::new(location, current, days, Utc::now()))
    }
}

impl CurrentResponse {
    pub(crate) fn into_domain(self) -> Result<WeatherReading, FetchError> {
        let location = self.location.into_domain()?;
        self.current.into_reading(location)
    }
}

/// Capture time of a reading
///
/// The epoch field is exact; the text field is location-local and only used
/// (as if it were UTC) when the epoch is missing.
fn captured_at(epoch: Option<i64>, text: &str) -> Result<DateTime<Utc>, FetchError> {
    if let Some(at) = epoch.and_then(|secs| Utc.timestamp_opt(secs, 0).single()) {
        return Ok(at);
    }
    NaiveDateTime::parse_from_str(text.trim(), PROVIDER_DATETIME)
        .map(|dt| Utc.from_utc_datetime(&dt))
        .map_err(|e| FetchError::Validation(format!("invalid last_updated {text}: {e}")))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage(field: &str, value: f64) -> Result<u8, FetchError> {
    if (0.0..=100.0).contains(&value) {
        Ok(value.round() as u8)
    } else {
        Err(FetchError::Validation(format!("{field} {value} outside 0-100")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_json() -> serde_json::Value {
        serde_json::json!({
            "location": {
                "name": "London", "region": "City of London, Greater London",
                "country": "United Kingdom", "lat": 51.52, "lon": -0.11,
                "tz_id": "Europe/London", "localtime": "2026-07-14 9:05"
            },
            "current": {
                "last_updated_epoch": 1_784_016_000_i64, "last_updated": "2026-07-14 09:00",
                "temp_c": 18.0, "temp_f": 64.4, "condition": {"text": "Partly cloudy"},
                "humidity": 72, "feelslike_c": 18.0, "feelslike_f": 64.4,
                "wind_kph": 13.0, "wind_mph": 8.1, "wind_dir": "WSW", "wind_degree": 250,
                "pressure_mb": 1016.0, "pressure_in": 30.0,
                "vis_km": 10.0, "vis_miles": 6.0, "uv": 4.0
            }
        })
    }

    #[test]
    fn current_maps_to_reading() {
        let response: CurrentResponse = serde_json::from_value(current_json()).unwrap();
        let reading = response.into_domain().unwrap();

        assert_eq!(reading.location.key.as_str(), "london");
        assert_eq!(reading.location.timezone.as_deref(), Some("Europe/London"));
        assert!(reading.location.local_time.is_some());
        assert_eq!(reading.humidity.value(), 72);
        assert_eq!(reading.wind_degree, 250);
        assert_eq!(reading.captured_at.timestamp(), 1_784_016_000);
        assert_eq!(reading.source, "weatherapi");
    }

    #[test]
    fn blank_region_becomes_none() {
        let mut json = current_json();
        json["location"]["region"] = serde_json::json!("");
        let response: CurrentResponse = serde_json::from_value(json).unwrap();
        assert!(response.into_domain().unwrap().location.region.is_none());
    }

    #[test]
    fn humidity_out_of_range_is_validation() {
        let mut json = current_json();
        json["current"]["humidity"] = serde_json::json!(140);
        let response: CurrentResponse = serde_json::from_value(json).unwrap();
        assert!(matches!(response.into_domain(), Err(FetchError::Validation(_))));
    }

    #[test]
    fn wind_degree_out_of_range_is_validation() {
        let mut json = current_json();
        json["current"]["wind_degree"] = serde_json::json!(400);
        let response: CurrentResponse = serde_json::from_value(json).unwrap();
        assert!(matches!(response.into_domain(), Err(FetchError::Validation(_))));
    }

    #[test]
    fn missing_epoch_falls_back_to_text() {
        let mut json = current_json();
        json["current"]
            .as_object_mut()
            .unwrap()
            .remove("last_updated_epoch");
        let response: CurrentResponse = serde_json::from_value(json).unwrap();
        let reading = response.into_domain().unwrap();
        assert_eq!(
            reading.captured_at.format("%Y-%m-%d %H:%M").to_string(),
            "2026-07-14 09:00"
        );
    }

    #[test]
    fn percentage_bounds() {
        assert_eq!(percentage("x", 0.0).unwrap(), 0);
        assert_eq!(percentage("x", 87.6).unwrap(), 88);
        assert!(percentage("x", 101.0).is_err());
        assert!(percentage("x", -1.0).is_err());
    }
}
