//! Tiered update scheduler
//!
//! Drives the update pipeline on per-tier intervals and runs maintenance
//! jobs on their own cadences:
//! - tier updates (frequent, normal, background)
//! - daily compaction and trend report (cron, UTC)
//! - weekly retention cleanup, alert archiving and summary (cron, UTC)
//! - periodic health checks and forecast refresh
//!
//! A single background task polls the job table and runs every due job in
//! turn. Each job runs on a task owned by the loop, so a panic is recorded as
//! a failure and aborting the loop also aborts the job in flight. Job failures
//! never delay the loop; only an error in the loop itself triggers the error
//! backoff.

mod jobs;
mod trigger;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub use jobs::{PipelineJobs, pipeline_scheduler};
pub use trigger::Trigger;

use crate::config::SchedulerConfig;

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Invalid cron expression
    #[error("Invalid cron expression: {0}")]
    InvalidCronExpression(String),

    /// Interval trigger that cannot produce a next due time
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
}

/// Failure of the scheduler loop itself, as opposed to a job
#[derive(Debug, Error)]
enum LoopError {
    #[error("job '{job}' cannot be rescheduled: {source}")]
    Schedule {
        job: String,
        #[source]
        source: SchedulerError,
    },

    #[error("scheduler pass panicked")]
    Panicked,
}

/// Boxed future returned by a job
pub type JobFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

/// Job body; called once per run
pub type JobTask = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// Loop timing
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    /// How often the loop checks for due jobs
    pub poll_interval: Duration,
    /// Pause after the loop itself fails
    pub error_backoff: Duration,
    /// How long `stop()` waits for the loop before aborting it
    pub stop_timeout: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for LoopSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            error_backoff: config.error_backoff(),
            stop_timeout: config.stop_timeout(),
        }
    }
}

/// Statistics for a scheduled job
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub name: String,
    /// Trigger description ("every 300s", "cron 0 0 2 * * *")
    pub schedule: String,
    pub next_run: Option<DateTime<Utc>>,
    pub success_count: u64,
    pub failure_count: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub avg_duration_ms: u64,
}

/// Configured size and cadence of a tier
#[derive(Debug, Clone, Serialize)]
pub struct TierStatus {
    pub name: String,
    pub locations: usize,
    pub interval_secs: u64,
}

/// Snapshot returned by [`TieredScheduler::status`]
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub tiers: Vec<TierStatus>,
    pub jobs: Vec<JobStatus>,
}

/// Per-job bookkeeping shared between the loop and `status()`
struct JobMetadata {
    name: String,
    trigger: Trigger,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    total_duration_ms: AtomicU64,
    last_run: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
    next_run: RwLock<Option<DateTime<Utc>>>,
}

impl JobMetadata {
    #[allow(clippy::missing_const_for_fn)] // RwLock::new is not const in parking_lot
    fn new(name: String, trigger: Trigger) -> Self {
        Self {
            name,
            trigger,
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            total_duration_ms: AtomicU64::new(0),
            last_run: RwLock::new(None),
            last_error: RwLock::new(None),
            next_run: RwLock::new(None),
        }
    }

    fn to_status(&self) -> JobStatus {
        let success = self.success_count.load(Ordering::Relaxed);
        let failure = self.failure_count.load(Ordering::Relaxed);
        let total = success + failure;
        let avg_duration_ms = if total > 0 {
            self.total_duration_ms.load(Ordering::Relaxed) / total
        } else {
            0
        };

        JobStatus {
            name: self.name.clone(),
            schedule: self.trigger.describe(),
            next_run: *self.next_run.read(),
            success_count: success,
            failure_count: failure,
            last_run: *self.last_run.read(),
            last_error: self.last_error.read().clone(),
            avg_duration_ms,
        }
    }

    fn record(&self, result: &Result<(), String>, duration_ms: u64) {
        self.total_duration_ms
            .fetch_add(duration_ms, Ordering::Relaxed);
        *self.last_run.write() = Some(Utc::now());
        match result {
            Ok(()) => {
                self.success_count.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                *self.last_error.write() = Some(e.clone());
            },
        }
    }
}

#[derive(Clone)]
struct Job {
    meta: Arc<JobMetadata>,
    task: JobTask,
}

/// A job plus its next due instant inside the running loop
struct ScheduledJob {
    job: Job,
    next_due: Option<Instant>,
}

impl ScheduledJob {
    /// Compute the next due time; a job whose trigger fails is parked
    fn reschedule(&mut self) -> Result<(), LoopError> {
        let next = self
            .job
            .meta
            .trigger
            .next_due(Instant::now(), Utc::now())
            .map_err(|source| LoopError::Schedule {
                job: self.job.meta.name.clone(),
                source,
            });
        let next = match next {
            Ok(next) => next,
            Err(e) => {
                self.next_due = None;
                *self.job.meta.next_run.write() = None;
                *self.job.meta.last_error.write() = Some(e.to_string());
                return Err(e);
            },
        };
        self.next_due = next.map(|(due, _)| due);
        *self.job.meta.next_run.write() = next.map(|(_, at)| at);
        Ok(())
    }
}

struct Runner {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Scheduler for tier updates and maintenance jobs
///
/// Jobs are registered while the scheduler is exclusively owned, then the
/// scheduler is shared (usually behind an `Arc`) for `start`, `stop` and
/// `status`.
pub struct TieredScheduler {
    settings: LoopSettings,
    tiers: Vec<TierStatus>,
    jobs: Vec<Job>,
    startup: Option<JobTask>,
    running: AtomicBool,
    runner: AsyncMutex<Option<Runner>>,
}

impl std::fmt::Debug for TieredScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredScheduler")
            .field("settings", &self.settings)
            .field("running", &self.running.load(Ordering::Relaxed))
            .field("job_count", &self.jobs.len())
            .finish_non_exhaustive()
    }
}

impl TieredScheduler {
    #[must_use]
    pub fn new(settings: LoopSettings) -> Self {
        Self {
            settings,
            tiers: Vec::new(),
            jobs: Vec::new(),
            startup: None,
            running: AtomicBool::new(false),
            runner: AsyncMutex::new(None),
        }
    }

    /// Register a job
    pub fn add_job<F, Fut>(&mut self, name: &str, trigger: Trigger, task: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let task: JobTask = Arc::new(move || Box::pin(task()) as JobFuture);
        info!(job = %name, schedule = %trigger.describe(), "Job scheduled");
        self.jobs.push(Job {
            meta: Arc::new(JobMetadata::new(name.to_string(), trigger)),
            task,
        });
    }

    /// Register an update tier; a tier without locations gets no job
    pub fn add_tier<F, Fut>(&mut self, name: &str, locations: Vec<String>, interval: Duration, task: F)
    where
        F: Fn(Arc<[String]>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.tiers.push(TierStatus {
            name: name.to_string(),
            locations: locations.len(),
            interval_secs: interval.as_secs(),
        });

        if locations.is_empty() {
            debug!(tier = %name, "Tier has no locations, not scheduling");
            return;
        }

        let locations: Arc<[String]> = locations.into();
        self.add_job(&format!("{name}_updates"), Trigger::Every(interval), move || {
            task(Arc::clone(&locations))
        });
    }

    /// Register work that `start()` runs before spawning the loop
    pub fn on_start<F, Fut>(&mut self, task: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.startup = Some(Arc::new(move || Box::pin(task()) as JobFuture));
    }

    /// Run startup work, then spawn the trigger loop
    ///
    /// Calling `start` on a running scheduler logs a warning and does nothing.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        let mut runner = self.runner.lock().await;
        if runner.is_some() {
            warn!("Scheduler already running");
            return;
        }

        if let Some(startup) = &self.startup {
            let (result, duration_ms) = execute(&mut JoinSet::new(), startup).await;
            match result {
                Ok(()) => info!(duration_ms, "Startup run complete"),
                Err(e) => error!(error = %e, duration_ms, "Startup run failed"),
            }
        }

        let token = CancellationToken::new();
        let jobs = self.jobs.clone();
        let handle = tokio::spawn(run_loop(jobs, self.settings, token.clone()));
        *runner = Some(Runner { token, handle });
        self.running.store(true, Ordering::Relaxed);

        info!(jobs = self.jobs.len(), "Scheduler started");
    }

    /// Cancel the loop and wait for it, aborting after the stop timeout
    ///
    /// Stopping a scheduler that is not running does nothing.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let Some(runner) = self.runner.lock().await.take() else {
            debug!("Scheduler not running");
            return;
        };

        runner.token.cancel();
        let mut handle = runner.handle;
        match tokio::time::timeout(self.settings.stop_timeout, &mut handle).await {
            Ok(Ok(())) => info!("Scheduler stopped"),
            Ok(Err(e)) => error!(error = %e, "Scheduler loop ended abnormally"),
            Err(_) => {
                warn!(
                    timeout_secs = self.settings.stop_timeout.as_secs(),
                    "Scheduler loop did not stop in time, aborting"
                );
                // Dropping the loop drops its JoinSet, which aborts the running job
                handle.abort();
                match handle.await {
                    Err(e) if !e.is_cancelled() => {
                        error!(error = %e, "Scheduler loop ended abnormally");
                    },
                    _ => {},
                }
            },
        }
        self.running.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            tiers: self.tiers.clone(),
            jobs: self.jobs.iter().map(|j| j.meta.to_status()).collect(),
        }
    }
}

/// Run a job on a task owned by `running`, converting a panic into a failure
async fn execute(
    running: &mut JoinSet<Result<(), String>>,
    task: &JobTask,
) -> (Result<(), String>, u64) {
    let started = Instant::now();
    running.spawn(task());
    let result = match running.join_next().await {
        Some(Ok(result)) => result,
        Some(Err(e)) => Err(format!("job task failed: {e}")),
        None => Err("job task missing".to_string()),
    };
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    (result, duration_ms)
}

async fn run_loop(jobs: Vec<Job>, settings: LoopSettings, token: CancellationToken) {
    let mut jobs: Vec<ScheduledJob> = jobs
        .into_iter()
        .map(|job| ScheduledJob {
            job,
            next_due: None,
        })
        .collect();
    let mut running = JoinSet::new();
    debug!(jobs = jobs.len(), "Scheduler loop running");

    let mut outcome = schedule_all(&mut jobs);
    loop {
        let pause = match &outcome {
            Ok(()) => settings.poll_interval,
            Err(e) => {
                error!(
                    error = %e,
                    backoff_secs = settings.error_backoff.as_secs(),
                    "Scheduler loop error, backing off"
                );
                settings.error_backoff
            },
        };

        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(pause) => {},
        }

        outcome = AssertUnwindSafe(run_due(&mut jobs, &mut running, &token))
            .catch_unwind()
            .await
            .unwrap_or(Err(LoopError::Panicked));
    }

    info!("Scheduler loop exited");
}

/// Compute the first due time of every job, keeping the first error
fn schedule_all(jobs: &mut [ScheduledJob]) -> Result<(), LoopError> {
    let mut outcome = Ok(());
    for scheduled in jobs.iter_mut() {
        let rescheduled = scheduled.reschedule();
        if outcome.is_ok() {
            outcome = rescheduled;
        }
    }
    outcome
}

/// Run every due job once
///
/// Job failures are recorded and logged here. Only a job that cannot be
/// rescheduled is reported back as a loop error.
async fn run_due(
    jobs: &mut [ScheduledJob],
    running: &mut JoinSet<Result<(), String>>,
    token: &CancellationToken,
) -> Result<(), LoopError> {
    let mut outcome = Ok(());

    for scheduled in jobs.iter_mut() {
        if token.is_cancelled() {
            break;
        }
        let due = scheduled
            .next_due
            .is_some_and(|due| due <= Instant::now());
        if !due {
            continue;
        }

        let meta = Arc::clone(&scheduled.job.meta);
        debug!(job = %meta.name, "Running job");
        let (result, duration_ms) = execute(running, &scheduled.job.task).await;
        meta.record(&result, duration_ms);

        match &result {
            Ok(()) => debug!(job = %meta.name, duration_ms, "Job completed"),
            Err(e) => error!(job = %meta.name, error = %e, duration_ms, "Job failed"),
        }

        let rescheduled = scheduled.reschedule();
        if outcome.is_ok() {
            outcome = rescheduled;
        }
    }

    outcome
}
