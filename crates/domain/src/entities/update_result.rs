//! Outcome of one batch update

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate outcome of fetching a batch of locations
///
/// `errors` is keyed by the location as it was requested, so blank or
/// otherwise unparseable names can still be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// True when at least one location was updated
    pub success: bool,
    /// Locations that produced a reading
    pub locations_updated: Vec<String>,
    /// Error message per failed location
    pub errors: BTreeMap<String, String>,
    /// Number of locations accounted for
    pub total_locations: usize,
    /// Wall-clock duration of the batch
    pub duration_ms: u64,
    /// When the batch finished
    pub timestamp: DateTime<Utc>,
}

impl UpdateResult {
    /// Build a result; `success` and `total_locations` are derived
    #[must_use]
    pub fn new(
        locations_updated: Vec<String>,
        errors: BTreeMap<String, String>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            success: !locations_updated.is_empty(),
            total_locations: locations_updated.len() + errors.len(),
            locations_updated,
            errors,
            duration_ms,
            timestamp,
        }
    }

    /// Result for an empty request
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), BTreeMap::new(), 0, Utc::now())
    }

    /// Move a location from updated to failed
    ///
    /// Used when a later pipeline stage (storage) fails for a location that
    /// was fetched successfully.
    pub fn mark_failed(&mut self, location: &str, message: impl Into<String>) {
        self.locations_updated.retain(|l| l != location);
        self.errors.insert(location.to_string(), message.into());
        self.success = !self.locations_updated.is_empty();
        self.total_locations = self.locations_updated.len() + self.errors.len();
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }
}
