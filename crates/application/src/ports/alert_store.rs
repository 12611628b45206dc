//! Alert store port

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::entities::Alert;
use domain::value_objects::{AlertId, LocationKey};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for alert persistence
#[allow(clippy::struct_field_names)] // automock generates struct with `get_*` prefixes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Persist an alert, replacing any row with the same id
    async fn store_alert(&self, alert: &Alert) -> Result<AlertId, ApplicationError>;

    /// Active alerts, optionally limited to one location, newest first
    async fn get_active_alerts(
        &self,
        location: Option<LocationKey>,
    ) -> Result<Vec<Alert>, ApplicationError>;

    /// Deactivate alerts that started before `cutoff`, returning how many changed
    async fn deactivate_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ApplicationError>;
}
