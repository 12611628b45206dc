//! Database migrations
//!
//! The schema version lives in `PRAGMA user_version`. Each migration runs
//! in its own transaction and bumps the version on success.
//!
//! ## Adding New Migrations
//!
//! 1. Add a `migrate_vN` function
//! 2. Append it to `MIGRATIONS`

use rusqlite::Connection;
use tracing::{debug, error, info};

use super::connection::DatabaseError;

type Migration = fn(&Connection) -> Result<(), rusqlite::Error>;

/// Ordered migrations; index + 1 is the version each one produces
const MIGRATIONS: &[(&str, Migration)] = &[
    ("weather tables", migrate_v1),
    ("update run log", migrate_v2),
];

/// Current schema version
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_schema_version(conn)?;

    if current_version >= SCHEMA_VERSION {
        debug!(version = current_version, "Database schema is up to date");
        return Ok(());
    }

    info!(
        from_version = current_version,
        to_version = SCHEMA_VERSION,
        "Running database migrations"
    );

    for (version, (name, migrate)) in (1..).zip(MIGRATIONS) {
        if version <= current_version {
            continue;
        }
        debug!(version, name, "Applying migration");

        let tx = conn.unchecked_transaction()?;
        if let Err(e) = migrate(&tx) {
            error!(version, name, error = %e, "Migration failed");
            return Err(DatabaseError::Migration(format!("V{version:03} ({name}): {e}")));
        }
        set_schema_version(&tx, version)?;
        tx.commit()?;
    }

    info!(version = SCHEMA_VERSION, "Database migrations complete");
    Ok(())
}

/// Get current schema version
pub fn get_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), DatabaseError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version}"))?;
    Ok(())
}

/// Migration to version 1: readings, forecasts, alerts, thresholds
fn migrate_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS current_weather (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location_key TEXT NOT NULL,
            location_name TEXT NOT NULL,
            region TEXT,
            country TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            timezone TEXT,
            local_time TEXT,
            temperature_c REAL NOT NULL,
            temperature_f REAL NOT NULL,
            feels_like_c REAL NOT NULL,
            feels_like_f REAL NOT NULL,
            condition TEXT NOT NULL,
            humidity INTEGER NOT NULL CHECK(humidity BETWEEN 0 AND 100),
            wind_kph REAL NOT NULL,
            wind_mph REAL NOT NULL,
            wind_direction TEXT NOT NULL,
            wind_degree INTEGER NOT NULL CHECK(wind_degree BETWEEN 0 AND 360),
            pressure_mb REAL NOT NULL,
            pressure_in REAL NOT NULL,
            visibility_km REAL NOT NULL,
            visibility_miles REAL NOT NULL,
            uv_index REAL NOT NULL,
            source TEXT NOT NULL,
            captured_at TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS weather_forecasts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location_key TEXT NOT NULL,
            location_name TEXT NOT NULL,
            forecast_date TEXT NOT NULL,
            max_temp_c REAL NOT NULL,
            max_temp_f REAL NOT NULL,
            min_temp_c REAL NOT NULL,
            min_temp_f REAL NOT NULL,
            avg_temp_c REAL NOT NULL,
            avg_temp_f REAL NOT NULL,
            condition TEXT NOT NULL,
            chance_of_rain INTEGER NOT NULL,
            chance_of_snow INTEGER NOT NULL,
            max_wind_kph REAL NOT NULL,
            max_wind_mph REAL NOT NULL,
            total_precip_mm REAL NOT NULL,
            total_precip_in REAL NOT NULL,
            avg_humidity INTEGER NOT NULL,
            uv_index REAL NOT NULL,
            sunrise TEXT,
            sunset TEXT,
            moonrise TEXT,
            moonset TEXT,
            moon_phase TEXT,
            fetched_at TEXT NOT NULL,
            UNIQUE(location_key, forecast_date)
        );

        CREATE TABLE IF NOT EXISTS weather_alerts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            alert_id TEXT NOT NULL UNIQUE,
            location_key TEXT NOT NULL,
            location_name TEXT NOT NULL,
            alert_type TEXT NOT NULL,
            severity TEXT NOT NULL CHECK(severity IN ('low', 'medium', 'high', 'critical')),
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT,
            created_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS weather_thresholds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location_key TEXT NOT NULL,
            metric TEXT NOT NULL,
            min_value REAL,
            max_value REAL,
            message TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            UNIQUE(location_key, metric)
        );

        CREATE INDEX IF NOT EXISTS idx_current_location_time
            ON current_weather(location_key, recorded_at);
        CREATE INDEX IF NOT EXISTS idx_forecasts_date ON weather_forecasts(forecast_date);
        CREATE INDEX IF NOT EXISTS idx_alerts_active ON weather_alerts(is_active, start_time);
        ",
    )
}

/// Migration to version 2: batch outcome log
fn migrate_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS update_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            success INTEGER NOT NULL,
            total_locations INTEGER NOT NULL,
            locations_updated TEXT NOT NULL,
            errors TEXT NOT NULL,
            duration_ms INTEGER NOT NULL,
            run_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_update_runs_time ON update_runs(success, run_at);
        ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(Result::ok)
            .collect()
    }

    #[test]
    fn run_migrations_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = tables(&conn);
        for expected in [
            "current_weather",
            "weather_forecasts",
            "weather_alerts",
            "weather_thresholds",
            "update_runs",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn resumes_from_partial_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate_v1(&conn).unwrap();
        set_schema_version(&conn, 1).unwrap();

        run_migrations(&conn).unwrap();

        assert!(tables(&conn).contains(&"update_runs".to_string()));
        assert_eq!(get_schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn forecast_date_is_unique_per_location() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let insert = "INSERT INTO weather_forecasts (
                location_key, location_name, forecast_date, max_temp_c, max_temp_f,
                min_temp_c, min_temp_f, avg_temp_c, avg_temp_f, condition,
                chance_of_rain, chance_of_snow, max_wind_kph, max_wind_mph,
                total_precip_mm, total_precip_in, avg_humidity, uv_index, fetched_at
            ) VALUES ('oslo', 'Oslo', '2026-07-14', 1, 1, 1, 1, 1, 1, 'x', 0, 0, 1, 1, 0, 0, 50, 1, 'now')";

        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }

    #[test]
    fn humidity_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO current_weather (
                location_key, location_name, country, latitude, longitude,
                temperature_c, temperature_f, feels_like_c, feels_like_f, condition,
                humidity, wind_kph, wind_mph, wind_direction, wind_degree,
                pressure_mb, pressure_in, visibility_km, visibility_miles, uv_index,
                source, captured_at, recorded_at
            ) VALUES ('oslo', 'Oslo', 'NO', 0, 0, 0, 0, 0, 0, 'x', 140, 0, 0, 'N', 0,
                      1000, 29, 10, 6, 1, 'test', 'now', 'now')",
            [],
        );
        assert!(result.is_err());
    }
}
