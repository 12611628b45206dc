//! Application services - Use case implementations

mod alert_engine;
mod fetch_orchestrator;
mod report_service;
mod update_service;

pub use alert_engine::{AlertEngine, AlertEngineConfig};
pub use fetch_orchestrator::{DEFAULT_MAX_CONCURRENCY, FetchOrchestrator, FetchOrchestratorConfig};
pub use report_service::{AlertSummary, DailyReport, PipelineHealth, ReportService, WeeklySummary};
pub use update_service::{UpdateOutcome, UpdateService};
