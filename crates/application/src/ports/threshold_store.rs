//! Threshold store port

use async_trait::async_trait;
use domain::entities::Threshold;
use domain::value_objects::LocationKey;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for per-location custom thresholds
#[allow(clippy::struct_field_names)] // automock generates struct with `get_*` prefixes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ThresholdStore: Send + Sync {
    /// Enabled thresholds for a location
    ///
    /// Rows naming an unknown metric are skipped by the implementation.
    async fn get_thresholds(&self, location: &LocationKey)
    -> Result<Vec<Threshold>, ApplicationError>;

    /// Insert or replace the threshold for its (location, metric) pair
    async fn upsert_threshold(&self, threshold: &Threshold) -> Result<(), ApplicationError>;
}
