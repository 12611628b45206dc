//! SQLite-based custom threshold persistence

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::ThresholdStore;
use async_trait::async_trait;
use domain::entities::{Metric, Threshold};
use domain::value_objects::LocationKey;
use rusqlite::params;
use tracing::{debug, instrument, warn};

use super::connection::ConnectionPool;
use super::handle::{StoreHandle, parse_db_time, to_db_time};

/// SQLite-based threshold store
#[derive(Debug, Clone)]
pub struct SqliteThresholdStore {
    db: StoreHandle,
}

impl SqliteThresholdStore {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            db: StoreHandle::new(pool),
        }
    }
}

#[async_trait]
impl ThresholdStore for SqliteThresholdStore {
    #[instrument(skip(self, location), fields(location = %location))]
    async fn get_thresholds(
        &self,
        location: &LocationKey,
    ) -> Result<Vec<Threshold>, ApplicationError> {
        let key = location.clone();

        self.db
            .read(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT metric, min_value, max_value, message, enabled, created_at
                     FROM weather_thresholds
                     WHERE location_key = ?1 AND enabled = 1
                     ORDER BY metric",
                )?;
                let rows = stmt
                    .query_map([key.as_str()], |row| {
                        let created_at: String = row.get(5)?;
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<f64>>(1)?,
                            row.get::<_, Option<f64>>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, bool>(4)?,
                            parse_db_time(5, &created_at)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let thresholds = rows
                    .into_iter()
                    .filter_map(|(metric, min_value, max_value, message, enabled, created_at)| {
                        match metric.parse::<Metric>() {
                            Ok(metric) => Some(Threshold {
                                location: key.clone(),
                                metric,
                                min_value,
                                max_value,
                                message,
                                enabled,
                                created_at,
                            }),
                            Err(e) => {
                                warn!(metric = %metric, error = %e, "Skipping threshold with unknown metric");
                                None
                            },
                        }
                    })
                    .collect();
                Ok(thresholds)
            })
            .await
    }

    #[instrument(skip(self, threshold), fields(location = %threshold.location, metric = %threshold.metric))]
    async fn upsert_threshold(&self, threshold: &Threshold) -> Result<(), ApplicationError> {
        let threshold = threshold.clone();

        self.db
            .write(move |conn| {
                conn.execute(
                    "INSERT INTO weather_thresholds (
                        location_key, metric, min_value, max_value, message, enabled, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(location_key, metric) DO UPDATE SET
                        min_value = excluded.min_value,
                        max_value = excluded.max_value,
                        message = excluded.message,
                        enabled = excluded.enabled",
                    params![
                        threshold.location.as_str(),
                        threshold.metric.as_str(),
                        threshold.min_value,
                        threshold.max_value,
                        threshold.message,
                        threshold.enabled,
                        to_db_time(&threshold.created_at),
                    ],
                )?;
                debug!("Upserted threshold");
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::test_support::temp_pool;

    fn key(name: &str) -> LocationKey {
        LocationKey::new(name).unwrap()
    }

    #[tokio::test]
    async fn upsert_then_read() {
        let (_dir, pool) = temp_pool();
        let store = SqliteThresholdStore::new(pool);
        let threshold =
            Threshold::new(key("Oslo"), Metric::TemperatureHigh, None, Some(28.0), None).unwrap();

        store.upsert_threshold(&threshold).await.unwrap();

        let stored = store.get_thresholds(&key("oslo")).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].metric, Metric::TemperatureHigh);
        assert_eq!(stored[0].max_value, Some(28.0));
        assert_eq!(stored[0].message, threshold.message);
    }

    #[tokio::test]
    async fn upsert_replaces_same_metric() {
        let (_dir, pool) = temp_pool();
        let store = SqliteThresholdStore::new(pool);
        let first = Threshold::new(key("Oslo"), Metric::WindSpeed, None, Some(40.0), None).unwrap();
        let second = Threshold::new(
            key("Oslo"),
            Metric::WindSpeed,
            None,
            Some(60.0),
            Some("Gale warning".to_string()),
        )
        .unwrap();

        store.upsert_threshold(&first).await.unwrap();
        store.upsert_threshold(&second).await.unwrap();

        let stored = store.get_thresholds(&key("Oslo")).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].max_value, Some(60.0));
        assert_eq!(stored[0].message, "Gale warning");
    }

    #[tokio::test]
    async fn disabled_rows_are_excluded() {
        let (_dir, pool) = temp_pool();
        let store = SqliteThresholdStore::new(pool);
        let mut threshold =
            Threshold::new(key("Oslo"), Metric::Humidity, None, Some(95.0), None).unwrap();
        threshold.enabled = false;

        store.upsert_threshold(&threshold).await.unwrap();

        assert!(store.get_thresholds(&key("Oslo")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_metric_is_skipped() {
        let (_dir, pool) = temp_pool();
        let store = SqliteThresholdStore::new(Arc::clone(&pool));
        store
            .upsert_threshold(
                &Threshold::new(key("Oslo"), Metric::UvIndex, None, Some(6.0), None).unwrap(),
            )
            .await
            .unwrap();
        pool.get()
            .unwrap()
            .execute(
                "INSERT INTO weather_thresholds (location_key, metric, max_value, message, created_at)
                 VALUES ('oslo', 'pollen_count', 50, 'Pollen', '2026-03-09T08:00:00.000000Z')",
                [],
            )
            .unwrap();

        let stored = store.get_thresholds(&key("Oslo")).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].metric, Metric::UvIndex);
    }

    #[tokio::test]
    async fn thresholds_are_scoped_to_location() {
        let (_dir, pool) = temp_pool();
        let store = SqliteThresholdStore::new(pool);
        store
            .upsert_threshold(
                &Threshold::new(key("Bergen"), Metric::Visibility, Some(2.0), None, None).unwrap(),
            )
            .await
            .unwrap();

        assert!(store.get_thresholds(&key("Oslo")).await.unwrap().is_empty());
        assert_eq!(store.get_thresholds(&key("Bergen")).await.unwrap().len(), 1);
    }
}
