//! Persistence module
//!
//! SQLite-based storage for readings, forecasts, alerts, thresholds and the
//! update run log.

pub mod alert_store;
pub mod connection;
pub(crate) mod error;
pub(crate) mod handle;
pub mod migrations;
pub mod threshold_store;
pub mod weather_store;

pub use alert_store::SqliteAlertStore;
pub use connection::{ConnectionPool, DatabaseError, create_pool};
pub use threshold_store::SqliteThresholdStore;
pub use weather_store::SqliteWeatherStore;
