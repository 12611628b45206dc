//! CSV snapshot - Implements SnapshotPort with a `location,temperature,condition` file
//!
//! The file holds one headerless row per location updated in the latest run.
//! It is written to a sibling temporary file and renamed into place, so
//! readers never see a half-written snapshot.

use std::path::{Path, PathBuf};

use application::error::ApplicationError;
use application::ports::SnapshotPort;
use async_trait::async_trait;
use domain::entities::WeatherReading;
use serde::Serialize;
use tokio::task;
use tracing::{debug, instrument};

use crate::config::SnapshotConfig;

/// One snapshot row
#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    location: &'a str,
    temperature_c: f64,
    condition: &'a str,
}

impl<'a> From<&'a WeatherReading> for SnapshotRow<'a> {
    fn from(reading: &'a WeatherReading) -> Self {
        Self {
            location: &reading.location.name,
            temperature_c: reading.temperature_c,
            condition: &reading.condition,
        }
    }
}

/// Writes the latest readings to a CSV file
#[derive(Debug, Clone)]
pub struct CsvSnapshotWriter {
    path: PathBuf,
}

impl CsvSnapshotWriter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Writer for an enabled snapshot section, `None` when disabled
    #[must_use]
    pub fn from_config(config: &SnapshotConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(&config.path))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render readings as headerless CSV
fn render_snapshot(readings: &[WeatherReading]) -> Result<Vec<u8>, ApplicationError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    for reading in readings {
        wtr.serialize(SnapshotRow::from(reading))
            .map_err(|e| ApplicationError::Internal(format!("CSV serialization error: {e}")))?;
    }
    wtr.into_inner()
        .map_err(|e| ApplicationError::Internal(format!("CSV writer error: {e}")))
}

fn replace_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

#[async_trait]
impl SnapshotPort for CsvSnapshotWriter {
    #[instrument(skip(self, readings), fields(path = %self.path.display(), rows = readings.len()))]
    async fn write(&self, readings: &[WeatherReading]) -> Result<(), ApplicationError> {
        let contents = render_snapshot(readings)?;
        let path = self.path.clone();

        task::spawn_blocking(move || replace_file(&path, &contents))
            .await
            .map_err(|e| ApplicationError::Internal(format!("snapshot task failed: {e}")))?
            .map_err(|e| {
                ApplicationError::Internal(format!(
                    "failed to write {}: {e}",
                    self.path.display()
                ))
            })?;

        debug!("Snapshot replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use domain::entities::Location;
    use domain::value_objects::{GeoLocation, Humidity};

    use super::*;

    fn reading(name: &str, temperature_c: f64, condition: &str) -> WeatherReading {
        let location = Location::new(name, "Testland", GeoLocation::new(1.0, 2.0).unwrap())
            .unwrap();
        WeatherReading {
            location,
            temperature_c,
            temperature_f: temperature_c * 1.8 + 32.0,
            feels_like_c: temperature_c,
            feels_like_f: temperature_c * 1.8 + 32.0,
            condition: condition.to_string(),
            humidity: Humidity::new(40).unwrap(),
            wind_kph: 5.0,
            wind_mph: 3.1,
            wind_direction: "W".to_string(),
            wind_degree: 270,
            pressure_mb: 1015.0,
            pressure_in: 29.97,
            visibility_km: 10.0,
            visibility_miles: 6.0,
            uv_index: 2.0,
            captured_at: Utc::now(),
            source: "weatherapi".to_string(),
        }
    }

    #[test]
    fn rows_have_no_header() {
        let csv = render_snapshot(&[reading("Tokyo", 21.5, "Sunny")]).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "Tokyo,21.5,Sunny\n");
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let csv = render_snapshot(&[reading("Valsad", 31.0, "Rain, heavy at times")]).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Valsad,31.0,\"Rain, heavy at times\"\n"
        );
    }

    #[tokio::test]
    async fn write_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvSnapshotWriter::new(dir.path().join("weather_updates.csv"));

        writer
            .write(&[reading("London", 12.0, "Cloudy"), reading("Boston", 8.5, "Clear")])
            .await
            .unwrap();
        writer.write(&[reading("Oslo", -3.0, "Snow")]).await.unwrap();

        let contents = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(contents, "Oslo,-3.0,Snow\n");
        assert!(!dir.path().join("weather_updates.csv.tmp").exists());
    }

    #[tokio::test]
    async fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvSnapshotWriter::new(dir.path().join("missing").join("out.csv"));

        let err = writer.write(&[reading("Tokyo", 21.5, "Sunny")]).await.unwrap_err();
        assert!(err.to_string().contains("out.csv"));
    }

    #[test]
    fn disabled_config_builds_no_writer() {
        let config = SnapshotConfig {
            enabled: false,
            ..SnapshotConfig::default()
        };
        assert!(CsvSnapshotWriter::from_config(&config).is_none());
        let writer = CsvSnapshotWriter::from_config(&SnapshotConfig::default()).unwrap();
        assert_eq!(writer.path(), Path::new("weather_updates.csv"));
    }
}
