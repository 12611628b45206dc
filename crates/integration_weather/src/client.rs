//! weatherapi.com client
//!
//! HTTP client for the weatherapi.com current and forecast endpoints.
//! Every call is a single request; retrying transient failures is left to
//! the caller.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use domain::entities::{Forecast, WeatherReading};

use crate::models::{CurrentResponse, ErrorResponse, ForecastResponse};

/// Largest forecast window the provider serves
pub const MAX_FORECAST_DAYS: u8 = 10;

/// Location used by the health check
const HEALTH_CHECK_LOCATION: &str = "London";

/// Fetch failure, classified by how the caller should react
#[derive(Debug, Error)]
pub enum FetchError {
    /// Credentials rejected (HTTP 401); retrying cannot help
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Provider does not recognize the location (HTTP 400)
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Timeout, connection failure, rate limiting or server error
    #[error("Transient failure: {0}")]
    Transient(String),

    /// 2xx response with a malformed or out-of-range payload
    #[error("Invalid response: {0}")]
    Validation(String),

    /// Any other non-2xx status
    #[error("Provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    /// HTTP client could not be built
    #[error("Client initialization failed: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether repeating the request may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Provider connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    /// API base URL (default: <http://api.weatherapi.com/v1>)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://api.weatherapi.com/v1".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl std::fmt::Debug for WeatherApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Weather client trait for fetching weather data
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Current conditions for a location name
    async fn get_current(&self, location: &str) -> Result<WeatherReading, FetchError>;

    /// Forecast for a location name; `days` is clamped to 1..=10
    async fn get_forecast(&self, location: &str, days: u8) -> Result<Forecast, FetchError>;

    /// Check the provider with a cheap current-weather request
    async fn is_healthy(&self) -> bool;
}

/// weatherapi.com HTTP client implementation
#[derive(Debug)]
pub struct WeatherApiClient {
    client: Client,
    config: WeatherApiConfig,
}

impl WeatherApiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: WeatherApiConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.config.base_url.trim_end_matches('/'))
    }

    /// Send a GET and return the body of a 2xx response
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .query(&[("key", self.config.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Transient(transport_message(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transient(transport_message(&e)))?;

        if status.is_success() {
            return Ok(body);
        }

        Err(classify_status(status, &body))
    }
}

#[async_trait]
impl WeatherClient for WeatherApiClient {
    #[instrument(skip(self))]
    async fn get_current(&self, location: &str) -> Result<WeatherReading, FetchError> {
        debug!("Fetching current weather");

        let body = self
            .get(&self.endpoint("current.json"), &[("q", location), ("aqi", "no")])
            .await?;

        let response: CurrentResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Validation(format!("malformed current response: {e}")))?;

        response.into_domain()
    }

    #[instrument(skip(self))]
    async fn get_forecast(&self, location: &str, days: u8) -> Result<Forecast, FetchError> {
        let days = days.clamp(1, MAX_FORECAST_DAYS).to_string();
        debug!(days = %days, "Fetching forecast");

        let body = self
            .get(
                &self.endpoint("forecast.json"),
                &[
                    ("q", location),
                    ("days", days.as_str()),
                    ("aqi", "no"),
                    ("alerts", "no"),
                ],
            )
            .await?;

        let response: ForecastResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Validation(format!("malformed forecast response: {e}")))?;

        response.into_domain()
    }

    async fn is_healthy(&self) -> bool {
        match self.get_current(HEALTH_CHECK_LOCATION).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Weather provider health check failed");
                false
            },
        }
    }
}

/// Map a non-2xx status to a failure class
fn classify_status(status: StatusCode, body: &str) -> FetchError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|r| match r.error.code {
            Some(code) => format!("{} (code {code})", r.error.message),
            None => r.error.message,
        })
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());

    match status {
        StatusCode::UNAUTHORIZED => FetchError::Auth(message),
        StatusCode::BAD_REQUEST => FetchError::InvalidLocation(message),
        StatusCode::TOO_MANY_REQUESTS => FetchError::Transient(format!("rate limited: {message}")),
        s if s.is_server_error() => FetchError::Transient(format!("HTTP {}: {message}", s.as_u16())),
        s => FetchError::Provider {
            status: s.as_u16(),
            message,
        },
    }
}

fn transport_message(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    }
}
