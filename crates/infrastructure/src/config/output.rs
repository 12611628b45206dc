//! File outputs written by the pipeline.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::default_true;

/// Latest-readings CSV snapshot, rewritten after every update run
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SnapshotConfig {
    /// Write the snapshot (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Snapshot file path
    #[serde(default = "default_snapshot_path")]
    #[validate(length(min = 1, message = "snapshot path must not be empty"))]
    pub path: String,
}

fn default_snapshot_path() -> String {
    "weather_updates.csv".to_string()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_snapshot_path(),
        }
    }
}
