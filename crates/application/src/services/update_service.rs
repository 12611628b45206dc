//! Update pipeline
//!
//! One tick of the pipeline: fetch a batch, store each reading, publish the
//! stored readings as a snapshot, then evaluate alerts for every stored
//! reading. Forecast refresh follows the same fetch-then-store shape.

use std::sync::Arc;

use domain::entities::{Alert, UpdateResult};
use futures::future::join_all;
use tracing::{debug, error, info, instrument};

use crate::{
    ports::{ReadingStore, SnapshotPort},
    services::{AlertEngine, FetchOrchestrator},
};

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// Batch accounting after storage
    pub result: UpdateResult,
    /// Alerts raised by this run
    pub alerts: Vec<Alert>,
}

/// Runs fetch, store and evaluate for a batch of locations
pub struct UpdateService {
    orchestrator: Arc<FetchOrchestrator>,
    readings: Arc<dyn ReadingStore>,
    engine: Arc<AlertEngine>,
    snapshot: Option<Arc<dyn SnapshotPort>>,
}

impl std::fmt::Debug for UpdateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateService")
            .field("orchestrator", &self.orchestrator)
            .field("snapshot", &self.snapshot.is_some())
            .finish_non_exhaustive()
    }
}

impl UpdateService {
    #[must_use]
    pub fn new(
        orchestrator: Arc<FetchOrchestrator>,
        readings: Arc<dyn ReadingStore>,
        engine: Arc<AlertEngine>,
    ) -> Self {
        Self {
            orchestrator,
            readings,
            engine,
            snapshot: None,
        }
    }

    /// Publish the readings of every run through `snapshot`
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: Arc<dyn SnapshotPort>) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Alert engine used by this pipeline
    #[must_use]
    pub fn engine(&self) -> &Arc<AlertEngine> {
        &self.engine
    }

    /// Fetch, store and evaluate a batch of locations
    ///
    /// A storage failure moves that location into the result's errors and
    /// skips its evaluation. When readings were stored they are written to
    /// the snapshot, if one is configured. The final result is appended to
    /// the run log.
    #[instrument(skip(self, locations), fields(requested = locations.len()))]
    pub async fn run(&self, locations: &[String]) -> UpdateOutcome {
        let (mut result, readings) = self.orchestrator.update_many(locations).await;

        let mut stored = Vec::with_capacity(readings.len());
        for (name, reading) in readings {
            match self.readings.store_reading(&reading).await {
                Ok(_) => stored.push(reading),
                Err(e) => {
                    error!(location = %name, error = %e, "Failed to store reading");
                    result.mark_failed(&name, e.to_string());
                },
            }
        }

        if let Some(snapshot) = self.snapshot.as_ref().filter(|_| !stored.is_empty()) {
            match snapshot.write(&stored).await {
                Ok(()) => debug!(readings = stored.len(), "Snapshot written"),
                Err(e) => error!(error = %e, "Failed to write snapshot"),
            }
        }

        let alerts: Vec<Alert> = join_all(stored.iter().map(|r| self.engine.evaluate(r)))
            .await
            .into_iter()
            .flatten()
            .collect();

        if let Err(e) = self.readings.record_update(&result).await {
            error!(error = %e, "Failed to record update run");
        }

        info!(
            updated = result.locations_updated.len(),
            failed = result.errors.len(),
            alerts = alerts.len(),
            "Update run complete"
        );

        UpdateOutcome { result, alerts }
    }

    /// Fetch and store forecasts for a batch of locations
    #[instrument(skip(self, locations), fields(requested = locations.len()))]
    pub async fn refresh_forecasts(&self, locations: &[String], days: u8) -> UpdateResult {
        let (mut result, forecasts) = self.orchestrator.fetch_forecasts(locations, days).await;

        for (name, forecast) in forecasts {
            if let Err(e) = self.readings.store_forecast(&forecast).await {
                error!(location = %name, error = %e, "Failed to store forecast");
                result.mark_failed(&name, e.to_string());
            }
        }

        info!(
            updated = result.locations_updated.len(),
            failed = result.errors.len(),
            "Forecast refresh complete"
        );
        result
    }
}
