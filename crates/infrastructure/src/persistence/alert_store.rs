//! SQLite-based alert persistence

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::AlertStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::entities::{Alert, AlertSeverity, AlertType};
use domain::value_objects::{AlertId, LocationKey};
use rusqlite::types::Type;
use rusqlite::{Row, params};
use tracing::{debug, info, instrument};

use super::connection::ConnectionPool;
use super::handle::{StoreHandle, conversion_error, parse_db_time, to_db_time};

const ALERT_COLUMNS: &str = "alert_id, location_key, location_name, alert_type, severity,
    title, description, start_time, end_time, created_at, is_active";

/// SQLite-based alert store
#[derive(Debug, Clone)]
pub struct SqliteAlertStore {
    db: StoreHandle,
}

impl SqliteAlertStore {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            db: StoreHandle::new(pool),
        }
    }
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    #[instrument(skip(self, alert), fields(alert_id = %alert.id, alert_type = %alert.alert_type))]
    async fn store_alert(&self, alert: &Alert) -> Result<AlertId, ApplicationError> {
        let alert = alert.clone();

        self.db
            .write(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO weather_alerts (
                        alert_id, location_key, location_name, alert_type, severity, title,
                        description, start_time, end_time, created_at, is_active
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        alert.id.to_string(),
                        alert.location.as_str(),
                        alert.location_name,
                        alert.alert_type.as_str(),
                        alert.severity.as_str(),
                        alert.title,
                        alert.description,
                        to_db_time(&alert.start_time),
                        alert.end_time.as_ref().map(to_db_time),
                        to_db_time(&alert.created_at),
                        alert.is_active,
                    ],
                )?;
                debug!("Stored alert");
                Ok(alert.id)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn get_active_alerts(
        &self,
        location: Option<LocationKey>,
    ) -> Result<Vec<Alert>, ApplicationError> {
        self.db
            .read(move |conn| {
                let alerts = if let Some(location) = location {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {ALERT_COLUMNS} FROM weather_alerts
                         WHERE is_active = 1 AND location_key = ?1
                         ORDER BY start_time DESC, id DESC"
                    ))?;
                    stmt.query_map([location.as_str()], row_to_alert)?
                        .collect::<Result<Vec<_>, _>>()?
                } else {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {ALERT_COLUMNS} FROM weather_alerts
                         WHERE is_active = 1
                         ORDER BY start_time DESC, id DESC"
                    ))?;
                    stmt.query_map([], row_to_alert)?
                        .collect::<Result<Vec<_>, _>>()?
                };
                Ok(alerts)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn deactivate_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ApplicationError> {
        let cutoff = to_db_time(&cutoff);
        let now = to_db_time(&Utc::now());

        let changed = self
            .db
            .write(move |conn| {
                conn.execute(
                    "UPDATE weather_alerts SET is_active = 0, end_time = ?1
                     WHERE is_active = 1 AND start_time < ?2",
                    params![now, cutoff],
                )
            })
            .await?;

        if changed > 0 {
            info!(count = changed, "Archived old alerts");
        }
        Ok(changed)
    }
}

fn row_to_alert(row: &Row<'_>) -> Result<Alert, rusqlite::Error> {
    let id: String = row.get(0)?;
    let location: String = row.get(1)?;
    let alert_type: String = row.get(3)?;
    let severity: String = row.get(4)?;
    let start_time: String = row.get(7)?;
    let end_time: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;

    Ok(Alert {
        id: AlertId::parse(&id).map_err(|e| conversion_error(0, Type::Text, e))?,
        location: LocationKey::new(&location).map_err(|e| conversion_error(1, Type::Text, e))?,
        location_name: row.get(2)?,
        alert_type: alert_type
            .parse::<AlertType>()
            .map_err(|e| conversion_error(3, Type::Text, e))?,
        severity: severity
            .parse::<AlertSeverity>()
            .map_err(|e| conversion_error(4, Type::Text, e))?,
        title: row.get(5)?,
        description: row.get(6)?,
        start_time: parse_db_time(7, &start_time)?,
        end_time: end_time.map(|t| parse_db_time(8, &t)).transpose()?,
        created_at: parse_db_time(9, &created_at)?,
        is_active: row.get(10)?,
    })
}
