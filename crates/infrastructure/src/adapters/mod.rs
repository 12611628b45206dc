//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod csv_snapshot;
mod email_notifier;
mod log_notifier;
mod weather_adapter;

pub use csv_snapshot::CsvSnapshotWriter;
pub use email_notifier::{EmailNotifier, format_alert_email, subject};
pub use log_notifier::LogNotifier;
pub use weather_adapter::WeatherApiAdapter;
