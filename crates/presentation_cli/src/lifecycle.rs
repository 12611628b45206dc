//! Scheduler lifecycle around process signals

use std::future::Future;

use infrastructure::TieredScheduler;
use tracing::info;

/// Start the scheduler unless `shutdown` completes first
///
/// Returns `false` when shutdown wins. The startup run is then dropped and
/// the trigger loop is never spawned.
pub async fn start_or_shutdown<S>(scheduler: &TieredScheduler, shutdown: &mut S) -> bool
where
    S: Future<Output = ()> + Unpin,
{
    tokio::select! {
        () = scheduler.start() => true,
        () = &mut *shutdown => {
            info!("Shutdown requested during startup");
            false
        },
    }
}
