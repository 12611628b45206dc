//! Fetch orchestrator
//!
//! Turns a list of location names into readings. Each location waits for a
//! concurrency slot, then for rate-limiter admission, then calls the
//! provider. Failures are accounted per location and never abort the batch.
//! Results are reported under the name the caller used.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use domain::entities::{Forecast, UpdateResult, WeatherReading};
use domain::value_objects::LocationKey;
use futures::future::join_all;
use tokio::sync::{Semaphore, watch};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{AdmissionPort, WeatherFetchPort},
};

/// Default number of in-flight provider calls
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Configuration for the fetch orchestrator
#[derive(Debug, Clone)]
pub struct FetchOrchestratorConfig {
    /// Maximum concurrent provider calls across all batches (default: 5)
    pub max_concurrency: usize,
}

impl Default for FetchOrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Bounded-concurrency, rate-limited batch fetcher
pub struct FetchOrchestrator {
    fetcher: Arc<dyn WeatherFetchPort>,
    admission: Arc<dyn AdmissionPort>,
    slots: Arc<Semaphore>,
    max_concurrency: usize,
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("max_concurrency", &self.max_concurrency)
            .field("available_slots", &self.slots.available_permits())
            .finish_non_exhaustive()
    }
}

/// A location accepted for fetching
struct Target {
    key: LocationKey,
    /// Trimmed name sent to the provider
    name: String,
    /// Name exactly as requested, used for reporting
    requested: String,
}

/// First fatal failure of a batch, shared by its in-flight locations
type FatalSignal = watch::Sender<Option<ApplicationError>>;

impl FetchOrchestrator {
    /// Create a new orchestrator
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn WeatherFetchPort>,
        admission: Arc<dyn AdmissionPort>,
        config: &FetchOrchestratorConfig,
    ) -> Self {
        let max_concurrency = config.max_concurrency.max(1);
        Self {
            fetcher,
            admission,
            slots: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    /// Fetch current conditions for every location
    ///
    /// Duplicate names are fetched once, under the first spelling requested.
    /// The returned map is keyed by that requested name.
    #[instrument(skip(self, locations), fields(requested = locations.len()))]
    pub async fn update_many(
        &self,
        locations: &[String],
    ) -> (UpdateResult, BTreeMap<String, WeatherReading>) {
        let fetcher = Arc::clone(&self.fetcher);
        self.fan_out(locations, move |name| {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.fetch_current(&name).await }
        })
        .await
    }

    /// Fetch forecasts for every location with the same accounting as
    /// [`Self::update_many`]
    #[instrument(skip(self, locations), fields(requested = locations.len()))]
    pub async fn fetch_forecasts(
        &self,
        locations: &[String],
        days: u8,
    ) -> (UpdateResult, BTreeMap<String, Forecast>) {
        let fetcher = Arc::clone(&self.fetcher);
        self.fan_out(locations, move |name| {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.fetch_forecast(&name, days).await }
        })
        .await
    }

    async fn fan_out<T, F, Fut>(
        &self,
        locations: &[String],
        fetch: F,
    ) -> (UpdateResult, BTreeMap<String, T>)
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ApplicationError>>,
    {
        let started = Instant::now();
        let mut errors = BTreeMap::new();
        let targets = partition(locations, &mut errors);

        // First fatal failure; locations that have not reached the provider
        // yet fail with the same message instead of calling it.
        let (fatal, _) = watch::channel(None);

        let outcomes = join_all(targets.into_iter().map(|target| {
            let fatal = &fatal;
            let fetch = &fetch;
            async move {
                let outcome = self.fetch_one(&target, fatal, fetch).await;
                (target, outcome)
            }
        }))
        .await;

        let mut updated = Vec::new();
        let mut values = BTreeMap::new();
        for (target, outcome) in outcomes {
            match outcome {
                Ok(value) => {
                    updated.push(target.requested.clone());
                    values.insert(target.requested, value);
                },
                Err(e) => {
                    errors.insert(target.requested, e.to_string());
                },
            }
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = UpdateResult::new(updated, errors, duration_ms, Utc::now());

        info!(
            updated = result.locations_updated.len(),
            failed = result.errors.len(),
            duration_ms,
            "Batch fetch complete"
        );

        (result, values)
    }

    async fn fetch_one<T, F, Fut>(
        &self,
        target: &Target,
        fatal: &FatalSignal,
        fetch: &F,
    ) -> Result<T, ApplicationError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ApplicationError>>,
    {
        let _permit = self
            .slots
            .acquire()
            .await
            .map_err(|e| ApplicationError::Internal(format!("fetch slots closed: {e}")))?;

        if let Some(e) = fatal.borrow().as_ref().cloned() {
            return Err(e);
        }

        // A fatal failure while waiting abandons the admission before it is recorded
        let mut fatal_rx = fatal.subscribe();
        let admitted = tokio::select! {
            () = self.admission.admit() => true,
            _ = fatal_rx.wait_for(Option::is_some) => false,
        };

        if let Some(e) = fatal.borrow().as_ref().cloned() {
            return Err(e);
        }
        if !admitted {
            return Err(ApplicationError::Internal("admission abandoned".to_string()));
        }

        debug!(location = %target.key, "Fetching");
        match fetch(target.name.clone()).await {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_fatal() {
                    error!(
                        location = %target.key,
                        error = %e,
                        "Fatal provider error, failing remaining locations"
                    );
                    fatal.send_if_modified(|current| {
                        if current.is_some() {
                            return false;
                        }
                        *current = Some(e.clone());
                        true
                    });
                } else {
                    warn!(location = %target.key, error = %e, "Fetch failed");
                }
                Err(e)
            },
        }
    }
}

/// Split requested names into fetch targets, recording unusable names as
/// errors and dropping duplicates
fn partition(locations: &[String], errors: &mut BTreeMap<String, String>) -> Vec<Target> {
    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(locations.len());

    for raw in locations {
        match LocationKey::new(raw) {
            Ok(key) => {
                if seen.insert(key.clone()) {
                    targets.push(Target {
                        key,
                        name: raw.trim().to_string(),
                        requested: raw.clone(),
                    });
                }
            },
            Err(e) => {
                errors.insert(raw.clone(), ApplicationError::from(e).to_string());
            },
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use domain::entities::Location;
    use domain::value_objects::{GeoLocation, Humidity};

    use super::*;
    use crate::ports::{MockAdmissionPort, MockWeatherFetchPort};

    fn reading(name: &str) -> WeatherReading {
        let location = Location::new(name, "Testland", GeoLocation::new(1.0, 2.0).unwrap())
            .unwrap();
        WeatherReading {
            location,
            temperature_c: 20.0,
            temperature_f: 68.0,
            feels_like_c: 20.0,
            feels_like_f: 68.0,
            condition: "Clear".to_string(),
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

    fn open_admission() -> Arc<dyn AdmissionPort> {
        let mut admission = MockAdmissionPort::new();
        admission.expect_admit().returning(|| ());
        Arc::new(admission)
    }

    fn orchestrator(fetcher: MockWeatherFetchPort) -> FetchOrchestrator {
        FetchOrchestrator::new(
            Arc::new(fetcher),
            open_admission(),
            &FetchOrchestratorConfig::default(),
        )
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn all_locations_succeed() {
        let mut fetcher = MockWeatherFetchPort::new();
        fetcher
            .expect_fetch_current()
            .times(3)
            .returning(|name| Ok(reading(name)));

        let (result, readings) = orchestrator(fetcher)
            .update_many(&names(&["London", "Tokyo", "Boston"]))
            .await;

        assert!(result.success);
        assert_eq!(result.total_locations, 3);
        assert_eq!(result.locations_updated.len(), 3);
        assert!(result.errors.is_empty());
        assert!(readings.contains_key("Tokyo"));
    }

    #[tokio::test]
    async fn partial_failure_is_accounted() {
        let mut fetcher = MockWeatherFetchPort::new();
        fetcher.expect_fetch_current().returning(|name| {
            if name == "Atlantis" {
                Err(ApplicationError::InvalidLocation("No matching location found.".into()))
            } else {
                Ok(reading(name))
            }
        });

        let (result, readings) = orchestrator(fetcher)
            .update_many(&names(&["London", "Atlantis"]))
            .await;

        assert!(result.success);
        assert_eq!(result.locations_updated, vec!["London".to_string()]);
        assert!(result.errors["Atlantis"].contains("No matching location"));
        assert_eq!(readings.len(), 1);
    }

    #[tokio::test]
    async fn all_failed_is_not_success() {
        let mut fetcher = MockWeatherFetchPort::new();
        fetcher
            .expect_fetch_current()
            .returning(|_| Err(ApplicationError::Transient("timeout".into())));

        let (result, readings) = orchestrator(fetcher).update_many(&names(&["London"])).await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(readings.is_empty());
    }

    #[tokio::test]
    async fn empty_input() {
        let fetcher = MockWeatherFetchPort::new();
        let (result, readings) = orchestrator(fetcher).update_many(&[]).await;

        assert!(!result.success);
        assert_eq!(result.total_locations, 0);
        assert!(readings.is_empty());
    }

    #[tokio::test]
    async fn duplicates_fetched_once() {
        let mut fetcher = MockWeatherFetchPort::new();
        fetcher
            .expect_fetch_current()
            .times(1)
            .returning(|name| Ok(reading(name)));

        let (result, _) = orchestrator(fetcher)
            .update_many(&names(&["New York", " new york ", "NEW YORK"]))
            .await;

        assert_eq!(result.total_locations, 1);
        assert_eq!(result.locations_updated, vec!["New York".to_string()]);
    }

    #[tokio::test]
    async fn blank_name_fails_without_fetch() {
        let mut fetcher = MockWeatherFetchPort::new();
        fetcher
            .expect_fetch_current()
            .times(1)
            .returning(|name| Ok(reading(name)));

        let (result, _) = orchestrator(fetcher)
            .update_many(&names(&["   ", "Tokyo"]))
            .await;

        assert!(result.success);
        assert_eq!(result.total_locations, 2);
        assert!(result.errors["   "].starts_with("Invalid location"));
    }

    #[tokio::test]
    async fn auth_failure_fails_remaining_fast() {
        let mut fetcher = MockWeatherFetchPort::new();
        fetcher
            .expect_fetch_current()
            .times(1)
            .returning(|_| Err(ApplicationError::Auth("API key is invalid".into())));
        // Fail-fast locations never reach the limiter
        let mut admission = MockAdmissionPort::new();
        admission.expect_admit().times(1).returning(|| ());

        let orchestrator = FetchOrchestrator::new(
            Arc::new(fetcher),
            Arc::new(admission),
            &FetchOrchestratorConfig { max_concurrency: 1 },
        );

        let (result, _) = orchestrator
            .update_many(&names(&["London", "Tokyo", "Boston"]))
            .await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors.values().all(|m| m.contains("API key is invalid")));
    }

    #[tokio::test]
    async fn admission_consulted_per_fetch() {
        let mut admission = MockAdmissionPort::new();
        admission.expect_admit().times(2).returning(|| ());
        let mut fetcher = MockWeatherFetchPort::new();
        fetcher
            .expect_fetch_current()
            .returning(|name| Ok(reading(name)));

        let orchestrator = FetchOrchestrator::new(
            Arc::new(fetcher),
            Arc::new(admission),
            &FetchOrchestratorConfig::default(),
        );
        let (result, _) = orchestrator.update_many(&names(&["London", "Tokyo"])).await;
        assert!(result.success);
    }

    /// Admits the first caller after a second and the rest after a minute
    struct SlowAdmission {
        calls: AtomicUsize,
        granted: AtomicUsize,
    }

    #[async_trait]
    impl AdmissionPort for SlowAdmission {
        async fn admit(&self) {
            let wait = if self.calls.fetch_add(1, Ordering::SeqCst) == 0 { 1 } else { 60 };
            tokio::time::sleep(Duration::from_secs(wait)).await;
            self.granted.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_abandons_pending_admissions() {
        let admission = Arc::new(SlowAdmission {
            calls: AtomicUsize::new(0),
            granted: AtomicUsize::new(0),
        });
        let mut fetcher = MockWeatherFetchPort::new();
        fetcher
            .expect_fetch_current()
            .times(1)
            .returning(|_| Err(ApplicationError::Auth("API key is invalid".into())));

        let orchestrator = FetchOrchestrator::new(
            Arc::new(fetcher),
            Arc::clone(&admission) as Arc<dyn AdmissionPort>,
            &FetchOrchestratorConfig { max_concurrency: 3 },
        );
        let started = tokio::time::Instant::now();
        let (result, _) = orchestrator
            .update_many(&names(&["London", "Tokyo", "Boston"]))
            .await;

        assert_eq!(result.errors.len(), 3);
        assert!(result.errors.values().all(|m| m.contains("API key is invalid")));
        // The two waiting callers gave up without being admitted
        assert_eq!(admission.calls.load(Ordering::SeqCst), 3);
        assert_eq!(admission.granted.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    struct SlowFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl WeatherFetchPort for SlowFetcher {
        async fn fetch_current(&self, location: &str) -> Result<WeatherReading, ApplicationError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(reading(location))
        }

        async fn fetch_forecast(&self, _: &str, _: u8) -> Result<Forecast, ApplicationError> {
            Err(ApplicationError::Provider("unused".into()))
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_is_capped() {
        let fetcher = Arc::new(SlowFetcher {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let orchestrator = FetchOrchestrator::new(
            Arc::clone(&fetcher) as Arc<dyn WeatherFetchPort>,
            open_admission(),
            &FetchOrchestratorConfig { max_concurrency: 2 },
        );

        let locations: Vec<String> = (0..7).map(|i| format!("Town {i}")).collect();
        let (result, _) = orchestrator.update_many(&locations).await;

        assert_eq!(result.locations_updated.len(), 7);
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn forecasts_use_same_accounting() {
        let mut fetcher = MockWeatherFetchPort::new();
        fetcher.expect_fetch_forecast().returning(|name, days| {
            assert_eq!(days, 3);
            let current = reading(name);
            Ok(Forecast::new(current.location.clone(), current, Vec::new(), Utc::now()))
        });

        let (result, forecasts) = orchestrator(fetcher)
            .fetch_forecasts(&names(&["London", "London", "Tokyo"]), 3)
            .await;

        assert!(result.success);
        assert_eq!(forecasts.len(), 2);
    }
}
