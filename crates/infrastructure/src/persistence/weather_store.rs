//! SQLite-based reading, forecast and update-log persistence

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{CleanupReport, ReadingStore, StorageStats, WeatherTrends};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use domain::entities::{Forecast, Location, UpdateResult, WeatherReading};
use domain::value_objects::{GeoLocation, Humidity, LocationKey};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use tracing::{debug, info, instrument};

use super::connection::ConnectionPool;
use super::error::storage_error;
use super::handle::{StoreHandle, conversion_error, parse_db_time, to_db_time};

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const READING_COLUMNS: &str = "location_name, region, country, latitude, longitude, timezone,
    local_time, temperature_c, temperature_f, feels_like_c, feels_like_f, condition,
    humidity, wind_kph, wind_mph, wind_direction, wind_degree, pressure_mb, pressure_in,
    visibility_km, visibility_miles, uv_index, source, captured_at";

/// SQLite-based store for readings, forecasts and the update run log
#[derive(Debug, Clone)]
pub struct SqliteWeatherStore {
    db: StoreHandle,
}

impl SqliteWeatherStore {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            db: StoreHandle::new(pool),
        }
    }
}

#[async_trait]
impl ReadingStore for SqliteWeatherStore {
    #[instrument(skip(self, reading), fields(location = %reading.location.key))]
    async fn store_reading(&self, reading: &WeatherReading) -> Result<i64, ApplicationError> {
        let reading = reading.clone();

        self.db
            .write(move |conn| {
                let loc = &reading.location;
                conn.execute(
                    "INSERT INTO current_weather (
                        location_key, location_name, region, country, latitude, longitude,
                        timezone, local_time, temperature_c, temperature_f, feels_like_c,
                        feels_like_f, condition, humidity, wind_kph, wind_mph, wind_direction,
                        wind_degree, pressure_mb, pressure_in, visibility_km, visibility_miles,
                        uv_index, source, captured_at, recorded_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                              ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)",
                    params![
                        loc.key.as_str(),
                        loc.name,
                        loc.region,
                        loc.country,
                        loc.coordinates.latitude(),
                        loc.coordinates.longitude(),
                        loc.timezone,
                        loc.local_time.map(|t| t.format(LOCAL_TIME_FORMAT).to_string()),
                        reading.temperature_c,
                        reading.temperature_f,
                        reading.feels_like_c,
                        reading.feels_like_f,
                        reading.condition,
                        reading.humidity.value(),
                        reading.wind_kph,
                        reading.wind_mph,
                        reading.wind_direction,
                        reading.wind_degree,
                        reading.pressure_mb,
                        reading.pressure_in,
                        reading.visibility_km,
                        reading.visibility_miles,
                        reading.uv_index,
                        reading.source,
                        to_db_time(&reading.captured_at),
                        to_db_time(&Utc::now()),
                    ],
                )?;
                let id = conn.last_insert_rowid();
                debug!(id, "Stored reading");
                Ok(id)
            })
            .await
    }

    #[instrument(skip(self, forecast), fields(location = %forecast.location.key, days = forecast.days.len()))]
    async fn store_forecast(&self, forecast: &Forecast) -> Result<usize, ApplicationError> {
        let forecast = forecast.clone();

        self.db
            .write(move |conn| {
                let tx = conn.transaction()?;
                let fetched_at = to_db_time(&forecast.fetched_at);
                {
                    let mut stmt = tx.prepare(
                        "INSERT OR REPLACE INTO weather_forecasts (
                            location_key, location_name, forecast_date, max_temp_c, max_temp_f,
                            min_temp_c, min_temp_f, avg_temp_c, avg_temp_f, condition,
                            chance_of_rain, chance_of_snow, max_wind_kph, max_wind_mph,
                            total_precip_mm, total_precip_in, avg_humidity, uv_index,
                            sunrise, sunset, moonrise, moonset, moon_phase, fetched_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                                  ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
                    )?;
                    for day in &forecast.days {
                        stmt.execute(params![
                            forecast.location.key.as_str(),
                            forecast.location.name,
                            day.date.format("%Y-%m-%d").to_string(),
                            day.max_temp_c,
                            day.max_temp_f,
                            day.min_temp_c,
                            day.min_temp_f,
                            day.avg_temp_c,
                            day.avg_temp_f,
                            day.condition,
                            day.chance_of_rain,
                            day.chance_of_snow,
                            day.max_wind_kph,
                            day.max_wind_mph,
                            day.total_precip_mm,
                            day.total_precip_in,
                            day.avg_humidity,
                            day.uv_index,
                            day.sunrise,
                            day.sunset,
                            day.moonrise,
                            day.moonset,
                            day.moon_phase,
                            fetched_at,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(forecast.days.len())
            })
            .await
    }

    #[instrument(skip(self, location), fields(location = %location))]
    async fn get_recent_readings(
        &self,
        location: &LocationKey,
        since_hours: u32,
    ) -> Result<Vec<WeatherReading>, ApplicationError> {
        let key = location.as_str().to_string();
        let cutoff = to_db_time(&(Utc::now() - Duration::hours(i64::from(since_hours))));

        self.db
            .read(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {READING_COLUMNS} FROM current_weather
                     WHERE location_key = ?1 AND recorded_at >= ?2
                     ORDER BY recorded_at DESC, id DESC"
                ))?;
                let readings = stmt
                    .query_map(params![key, cutoff], row_to_reading)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(readings)
            })
            .await
    }

    #[instrument(skip(self, location), fields(location = %location))]
    async fn get_trends(
        &self,
        location: &LocationKey,
        days: u32,
    ) -> Result<Option<WeatherTrends>, ApplicationError> {
        let key = location.clone();
        let cutoff = to_db_time(&(Utc::now() - Duration::days(i64::from(days))));

        self.db
            .read(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*), AVG(temperature_c), MIN(temperature_c), MAX(temperature_c),
                            AVG(humidity), AVG(pressure_mb), AVG(wind_kph)
                     FROM current_weather
                     WHERE location_key = ?1 AND recorded_at >= ?2",
                    params![key.as_str(), cutoff],
                    |row| {
                        let count: i64 = row.get(0)?;
                        if count == 0 {
                            return Ok(None);
                        }
                        Ok(Some(WeatherTrends {
                            location: key.clone(),
                            period_days: days,
                            avg_temperature_c: row.get(1)?,
                            min_temperature_c: row.get(2)?,
                            max_temperature_c: row.get(3)?,
                            avg_humidity: row.get(4)?,
                            avg_pressure_mb: row.get(5)?,
                            avg_wind_kph: row.get(6)?,
                            data_points: u64::try_from(count).unwrap_or_default(),
                        }))
                    },
                )
            })
            .await
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> Result<StorageStats, ApplicationError> {
        self.db
            .read(|conn| {
                let page_count = count(conn, "PRAGMA page_count")?;
                let page_size = count(conn, "PRAGMA page_size")?;

                Ok(StorageStats {
                    current_weather_records: count(conn, "SELECT COUNT(*) FROM current_weather")?,
                    forecast_records: count(conn, "SELECT COUNT(*) FROM weather_forecasts")?,
                    alert_records: count(conn, "SELECT COUNT(*) FROM weather_alerts")?,
                    active_alerts: count(
                        conn,
                        "SELECT COUNT(*) FROM weather_alerts WHERE is_active = 1",
                    )?,
                    threshold_records: count(conn, "SELECT COUNT(*) FROM weather_thresholds")?,
                    update_runs: count(conn, "SELECT COUNT(*) FROM update_runs")?,
                    unique_locations: count(
                        conn,
                        "SELECT COUNT(DISTINCT location_key) FROM current_weather",
                    )?,
                    database_size_bytes: page_count.saturating_mul(page_size),
                })
            })
            .await
    }

    #[instrument(skip(self))]
    async fn cleanup(&self, older_than_days: u32) -> Result<CleanupReport, ApplicationError> {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        let cutoff_time = to_db_time(&cutoff);
        let cutoff_date = cutoff.format("%Y-%m-%d").to_string();

        let report = self
            .db
            .write(move |conn| {
                let tx = conn.transaction()?;
                let report = CleanupReport {
                    readings_deleted: tx.execute(
                        "DELETE FROM current_weather WHERE recorded_at < ?1",
                        [&cutoff_time],
                    )?,
                    forecasts_deleted: tx.execute(
                        "DELETE FROM weather_forecasts WHERE forecast_date < ?1",
                        [&cutoff_date],
                    )?,
                    alerts_deleted: tx.execute(
                        "DELETE FROM weather_alerts WHERE is_active = 0 AND created_at < ?1",
                        [&cutoff_time],
                    )?,
                    update_runs_deleted: tx.execute(
                        "DELETE FROM update_runs WHERE run_at < ?1",
                        [&cutoff_time],
                    )?,
                };
                tx.commit()?;
                Ok(report)
            })
            .await?;

        info!(
            older_than_days,
            readings = report.readings_deleted,
            forecasts = report.forecasts_deleted,
            alerts = report.alerts_deleted,
            update_runs = report.update_runs_deleted,
            "Retention cleanup finished"
        );
        Ok(report)
    }

    #[instrument(skip(self))]
    async fn compact(&self) -> Result<(), ApplicationError> {
        self.db
            .write(|conn| conn.execute_batch("VACUUM; ANALYZE;"))
            .await?;
        debug!("Database compacted");
        Ok(())
    }

    #[instrument(skip(self, result), fields(success = result.success, total = result.total_locations))]
    async fn record_update(&self, result: &UpdateResult) -> Result<(), ApplicationError> {
        let updated = serde_json::to_string(&result.locations_updated).map_err(storage_error)?;
        let errors = serde_json::to_string(&result.errors).map_err(storage_error)?;
        let success = result.success;
        let total = i64::try_from(result.total_locations).unwrap_or(i64::MAX);
        let duration_ms = i64::try_from(result.duration_ms).unwrap_or(i64::MAX);
        let run_at = to_db_time(&result.timestamp);

        self.db
            .write(move |conn| {
                conn.execute(
                    "INSERT INTO update_runs (
                        success, total_locations, locations_updated, errors, duration_ms, run_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![success, total, updated, errors, duration_ms, run_at],
                )?;
                Ok(())
            })
            .await
    }

    async fn last_successful_update(&self) -> Result<Option<DateTime<Utc>>, ApplicationError> {
        self.db
            .read(|conn| {
                let latest: Option<String> = conn.query_row(
                    "SELECT MAX(run_at) FROM update_runs WHERE success = 1",
                    [],
                    |row| row.get(0),
                )?;
                latest.map(|value| parse_db_time(0, &value)).transpose()
            })
            .await
    }
}

fn count(conn: &Connection, sql: &str) -> Result<u64, rusqlite::Error> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(u64::try_from(n).unwrap_or_default())
}

fn row_to_reading(row: &Row<'_>) -> Result<WeatherReading, rusqlite::Error> {
    let coordinates = GeoLocation::new(row.get(3)?, row.get(4)?)
        .map_err(|e| conversion_error(3, Type::Real, e))?;

    let mut location = Location::new(row.get::<_, String>(0)?, row.get::<_, String>(2)?, coordinates)
        .map_err(|e| conversion_error(0, Type::Text, e))?;
    if let Some(region) = row.get::<_, Option<String>>(1)? {
        location = location.with_region(region);
    }
    if let Some(timezone) = row.get::<_, Option<String>>(5)? {
        location = location.with_timezone(timezone);
    }
    if let Some(local) = row.get::<_, Option<String>>(6)? {
        let local = NaiveDateTime::parse_from_str(&local, LOCAL_TIME_FORMAT)
            .map_err(|e| conversion_error(6, Type::Text, e))?;
        location = location.with_local_time(local);
    }

    let humidity: u16 = row.get(12)?;
    let humidity = Humidity::new(humidity).map_err(|e| conversion_error(12, Type::Integer, e))?;
    let captured_at: String = row.get(23)?;

    Ok(WeatherReading {
        location,
        temperature_c: row.get(7)?,
        temperature_f: row.get(8)?,
        feels_like_c: row.get(9)?,
        feels_like_f: row.get(10)?,
        condition: row.get(11)?,
        humidity,
        wind_kph: row.get(13)?,
        wind_mph: row.get(14)?,
        wind_direction: row.get(15)?,
        wind_degree: row.get(16)?,
        pressure_mb: row.get(17)?,
        pressure_in: row.get(18)?,
        visibility_km: row.get(19)?,
        visibility_miles: row.get(20)?,
        uv_index: row.get(21)?,
        source: row.get(22)?,
        captured_at: parse_db_time(23, &captured_at)?,
    })
}
