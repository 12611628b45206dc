//! Weather fetch port
//!
//! One request for one location's current or forecast weather.

use async_trait::async_trait;
use domain::entities::{Forecast, WeatherReading};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for fetching weather from the upstream provider
///
/// Implementations classify failures into `ApplicationError` variants:
/// `Auth`, `InvalidLocation`, `Transient`, `Validation` or `Provider`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherFetchPort: Send + Sync {
    /// Fetch current conditions for a location name
    async fn fetch_current(&self, location: &str) -> Result<WeatherReading, ApplicationError>;

    /// Fetch a forecast; `days` is clamped to the provider's supported range
    async fn fetch_forecast(&self, location: &str, days: u8)
    -> Result<Forecast, ApplicationError>;

    /// Check if the provider is reachable with the configured credentials
    async fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn WeatherFetchPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn WeatherFetchPort>();
    }
}
