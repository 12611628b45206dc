//! Weather adapter - Implements WeatherFetchPort using integration_weather

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::WeatherFetchPort;
use async_trait::async_trait;
use domain::entities::{Forecast, WeatherReading};
use integration_weather::{FetchError, WeatherApiClient, WeatherClient};
use tracing::{debug, instrument};

use crate::config::ProviderConfig;
use crate::retry::{RetryConfig, with_retry};

/// Adapter for the weatherapi.com client with retry on transient failures
pub struct WeatherApiAdapter {
    client: Arc<dyn WeatherClient>,
    retry: RetryConfig,
}

impl std::fmt::Debug for WeatherApiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiAdapter")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl WeatherApiAdapter {
    #[must_use]
    pub fn new(client: Arc<dyn WeatherClient>, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// Build the HTTP client from provider settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn from_config(
        provider: &ProviderConfig,
        retry: RetryConfig,
    ) -> Result<Self, ApplicationError> {
        let client = WeatherApiClient::new(provider.to_client_config()).map_err(map_error)?;
        Ok(Self::new(Arc::new(client), retry))
    }
}

/// Map client failure classes onto application errors
fn map_error(err: FetchError) -> ApplicationError {
    match err {
        FetchError::Auth(msg) => ApplicationError::Auth(msg),
        FetchError::InvalidLocation(msg) => ApplicationError::InvalidLocation(msg),
        FetchError::Transient(msg) => ApplicationError::Transient(msg),
        FetchError::Validation(msg) => ApplicationError::Validation(msg),
        FetchError::Provider { status, message } => {
            ApplicationError::Provider(format!("HTTP {status}: {message}"))
        },
        FetchError::Client(msg) => ApplicationError::Configuration(msg),
    }
}

#[async_trait]
impl WeatherFetchPort for WeatherApiAdapter {
    #[instrument(skip(self))]
    async fn fetch_current(&self, location: &str) -> Result<WeatherReading, ApplicationError> {
        let outcome = with_retry(&self.retry, || self.client.get_current(location)).await;
        debug!(attempts = outcome.attempts, ok = outcome.is_ok(), "Current weather fetch finished");
        outcome.into_result().map_err(map_error)
    }

    #[instrument(skip(self))]
    async fn fetch_forecast(&self, location: &str, days: u8) -> Result<Forecast, ApplicationError> {
        let outcome = with_retry(&self.retry, || self.client.get_forecast(location, days)).await;
        debug!(attempts = outcome.attempts, ok = outcome.is_ok(), "Forecast fetch finished");
        outcome.into_result().map_err(map_error)
    }

    async fn is_available(&self) -> bool {
        self.client.is_healthy().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::Utc;
    use domain::entities::Location;
    use domain::value_objects::{GeoLocation, Humidity};

    use super::*;

    /// Client failing `failures` times with the given error, then succeeding
    struct FlakyClient {
        calls: AtomicU32,
        failures: u32,
        error: fn() -> FetchError,
    }

    impl FlakyClient {
        fn new(failures: u32, error: fn() -> FetchError) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                error,
            }
        }

        fn next(&self) -> Result<(), FetchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err((self.error)())
            } else {
                Ok(())
            }
        }
    }

    fn reading(name: &str) -> WeatherReading {
        WeatherReading {
            location: Location::new(name, "Norway", GeoLocation::new(59.9, 10.7).unwrap())
                .unwrap(),
            temperature_c: 12.0,
            temperature_f: 53.6,
            feels_like_c: 11.0,
            feels_like_f: 51.8,
            condition: "Overcast".to_string(),
            humidity: Humidity::new(80).unwrap(),
            wind_kph: 10.0,
            wind_mph: 6.2,
            wind_direction: "N".to_string(),
            wind_degree: 0,
            pressure_mb: 1012.0,
            pressure_in: 29.88,
            visibility_km: 10.0,
            visibility_miles: 6.0,
            uv_index: 1.0,
            captured_at: Utc::now(),
            source: "weatherapi".to_string(),
        }
    }

    #[async_trait]
    impl WeatherClient for FlakyClient {
        async fn get_current(&self, location: &str) -> Result<WeatherReading, FetchError> {
            self.next().map(|()| reading(location))
        }

        async fn get_forecast(&self, location: &str, _days: u8) -> Result<Forecast, FetchError> {
            self.next().map(|()| {
                let current = reading(location);
                Forecast::new(current.location.clone(), current, Vec::new(), Utc::now())
            })
        }

        async fn is_healthy(&self) -> bool {
            self.next().is_ok()
        }
    }

    fn adapter(client: &Arc<FlakyClient>) -> WeatherApiAdapter {
        let client: Arc<dyn WeatherClient> = Arc::clone(client) as Arc<dyn WeatherClient>;
        WeatherApiAdapter::new(client, RetryConfig::default().without_jitter())
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let client = Arc::new(FlakyClient::new(2, || FetchError::Transient("503".into())));

        let reading = adapter(&client).fetch_current("Oslo").await.unwrap();

        assert_eq!(reading.location.name, "Oslo");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let client = Arc::new(FlakyClient::new(10, || FetchError::Transient("timeout".into())));

        let result = adapter(&client).fetch_forecast("Oslo", 3).await;

        assert!(matches!(result, Err(ApplicationError::Transient(_))));
        assert_eq!(client.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_is_not_retried() {
        let client = Arc::new(FlakyClient::new(10, || FetchError::Auth("API key is invalid".into())));

        let result = adapter(&client).fetch_current("Oslo").await;

        assert!(matches!(result, Err(ApplicationError::Auth(_))));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn availability_uses_health_check() {
        let client = Arc::new(FlakyClient::new(1, || FetchError::Transient("down".into())));
        let adapter = adapter(&client);

        assert!(!adapter.is_available().await);
        assert!(adapter.is_available().await);
    }

    #[test]
    fn map_error_classes() {
        assert!(matches!(
            map_error(FetchError::InvalidLocation("x".into())),
            ApplicationError::InvalidLocation(_)
        ));
        assert!(matches!(
            map_error(FetchError::Validation("x".into())),
            ApplicationError::Validation(_)
        ));
        let err = map_error(FetchError::Provider {
            status: 403,
            message: "disabled".into(),
        });
        assert!(matches!(err, ApplicationError::Provider(ref m) if m.contains("403")));
    }

    #[test]
    fn from_config_builds_client() {
        let adapter = WeatherApiAdapter::from_config(&ProviderConfig::default(), RetryConfig::none());
        assert!(adapter.is_ok());
    }

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WeatherApiAdapter>();
    }
}
