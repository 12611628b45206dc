//! Logging setup
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` (from `RUST_LOG`
//! or the configured directive) with a human-readable or JSON formatter.

mod logging;

pub use logging::{TelemetryConfig, TelemetryError, init_telemetry};
