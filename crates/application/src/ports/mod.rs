//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod admission_port;
mod alert_store;
mod notifier_port;
mod reading_store;
mod snapshot_port;
mod threshold_store;
mod weather_fetch_port;

pub use admission_port::AdmissionPort;
#[cfg(test)]
pub use admission_port::MockAdmissionPort;
pub use alert_store::AlertStore;
#[cfg(test)]
pub use alert_store::MockAlertStore;
#[cfg(test)]
pub use notifier_port::MockNotifierPort;
pub use notifier_port::NotifierPort;
#[cfg(test)]
pub use reading_store::MockReadingStore;
pub use reading_store::{CleanupReport, ReadingStore, StorageStats, WeatherTrends};
#[cfg(test)]
pub use snapshot_port::MockSnapshotPort;
pub use snapshot_port::SnapshotPort;
#[cfg(test)]
pub use threshold_store::MockThresholdStore;
pub use threshold_store::ThresholdStore;
#[cfg(test)]
pub use weather_fetch_port::MockWeatherFetchPort;
pub use weather_fetch_port::WeatherFetchPort;
