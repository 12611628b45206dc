//! Latest-readings snapshot port

use async_trait::async_trait;
use domain::entities::WeatherReading;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for publishing the readings of the latest update run
///
/// Each call replaces the previous snapshot. A failed write is logged by the
/// caller and does not fail the run.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotPort: Send + Sync {
    async fn write(&self, readings: &[WeatherReading]) -> Result<(), ApplicationError>;
}
