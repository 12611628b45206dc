//! Service wiring from the loaded configuration

use std::sync::Arc;

use application::ports::{
    AdmissionPort, AlertStore, NotifierPort, ReadingStore, ThresholdStore, WeatherFetchPort,
};
use application::{
    AlertEngine, FetchOrchestrator, FetchOrchestratorConfig, ReportService, UpdateService,
};
use infrastructure::config::EmailConfig;
use infrastructure::{
    AppConfig, CsvSnapshotWriter, EmailNotifier, LogNotifier, PipelineJobs, SlidingWindowLimiter,
    SqliteAlertStore, SqliteThresholdStore, SqliteWeatherStore, WeatherApiAdapter, create_pool,
};
use tracing::{info, warn};

/// Every service the binary drives, built once per invocation
pub struct Pipeline {
    pub config: AppConfig,
    pub readings: Arc<dyn ReadingStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub fetcher: Arc<dyn WeatherFetchPort>,
    pub admission: Arc<dyn AdmissionPort>,
    pub engine: Arc<AlertEngine>,
    pub updates: Arc<UpdateService>,
    pub reports: Arc<ReportService>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Open storage and build the fetch, alert and report services
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or the
    /// HTTP client fails to initialize.
    pub fn build(config: AppConfig) -> anyhow::Result<Self> {
        let pool = Arc::new(create_pool(&config.database)?);
        info!(path = %config.database.path, "Database ready");

        let readings: Arc<dyn ReadingStore> = Arc::new(SqliteWeatherStore::new(Arc::clone(&pool)));
        let alerts: Arc<dyn AlertStore> = Arc::new(SqliteAlertStore::new(Arc::clone(&pool)));
        let thresholds: Arc<dyn ThresholdStore> = Arc::new(SqliteThresholdStore::new(pool));

        let fetcher: Arc<dyn WeatherFetchPort> = Arc::new(WeatherApiAdapter::from_config(
            &config.provider,
            config.retry.to_retry_config(),
        )?);
        let admission: Arc<dyn AdmissionPort> =
            Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit));

        let orchestrator = Arc::new(FetchOrchestrator::new(
            Arc::clone(&fetcher),
            Arc::clone(&admission),
            &FetchOrchestratorConfig {
                max_concurrency: config.fetch.max_concurrency,
            },
        ));
        let engine = Arc::new(AlertEngine::new(
            Arc::clone(&readings),
            Arc::clone(&alerts),
            thresholds,
            notifier(&config.email),
            config.alerts.to_engine_config(),
        ));
        let mut updates =
            UpdateService::new(orchestrator, Arc::clone(&readings), Arc::clone(&engine));
        if let Some(writer) = CsvSnapshotWriter::from_config(&config.snapshot) {
            info!(path = %writer.path().display(), "Latest-readings snapshot enabled");
            updates = updates.with_snapshot(Arc::new(writer));
        }
        let updates = Arc::new(updates);
        let reports = Arc::new(ReportService::new(
            Arc::clone(&readings),
            Arc::clone(&alerts),
            Arc::clone(&fetcher),
        ));

        Ok(Self {
            config,
            readings,
            alerts,
            fetcher,
            admission,
            engine,
            updates,
            reports,
        })
    }

    /// Job bodies for the scheduler
    #[must_use]
    pub fn jobs(&self) -> PipelineJobs {
        PipelineJobs {
            updates: Arc::clone(&self.updates),
            reports: Arc::clone(&self.reports),
            readings: Arc::clone(&self.readings),
            alerts: Arc::clone(&self.alerts),
        }
    }
}

/// Email when enabled and complete, otherwise the log
fn notifier(config: &EmailConfig) -> Arc<dyn NotifierPort> {
    if !config.enabled {
        info!("Email notifications disabled, alerts go to the log");
        return Arc::new(LogNotifier);
    }

    match EmailNotifier::from_config(config) {
        Ok(email) => {
            info!(to = %config.to, "Email notifications enabled");
            Arc::new(email)
        },
        Err(e) => {
            warn!(error = %e, "Email notifications unavailable, alerts go to the log");
            Arc::new(LogNotifier)
        },
    }
}
