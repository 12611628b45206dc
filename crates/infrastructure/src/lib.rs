//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer.
//! Contains the weatherapi.com adapter, SQLite stores, notifiers, the
//! request limiter and the tiered scheduler.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod rate_limit;
pub mod retry;
pub mod scheduler;
pub mod telemetry;

pub use adapters::*;
pub use config::{
    AlertsAppConfig, AppConfig, DatabaseConfig, EmailConfig, FetchAppConfig, ProviderConfig,
    RateLimitAppConfig, RetryAppConfig, SchedulerConfig, SnapshotConfig, TelemetryAppConfig,
};
pub use persistence::{
    ConnectionPool, SqliteAlertStore, SqliteThresholdStore, SqliteWeatherStore, create_pool,
};
pub use rate_limit::SlidingWindowLimiter;
pub use retry::{RetryConfig, RetryResult, Retryable, with_retry};
pub use scheduler::{PipelineJobs, SchedulerStatus, TieredScheduler, pipeline_scheduler};
pub use telemetry::{TelemetryConfig, init_telemetry};
