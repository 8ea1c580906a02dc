//! Background garbage collection scheduler.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use super::{GarbageCollector, GcOutcome};

/// Handle for controlling a running scheduler.
///
/// Dropping the handle stops the scheduler.
#[derive(Debug)]
pub struct GcHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl GcHandle {
    /// Signals the scheduler to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Returns true once the scheduler task has exited.
    pub fn is_stopped(&self) -> bool {
        self.shutdown_tx.is_closed()
    }
}

impl Drop for GcHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs garbage collection periodically for long-lived processes.
///
/// Every instance may run a scheduler; the marker key keeps the effective
/// sweep rate at one per refresh window across all of them.
#[derive(Debug)]
pub struct GcScheduler {
    collector: GarbageCollector,
    period: Duration,
}

impl GcScheduler {
    /// Creates a scheduler ticking once per refresh window.
    pub fn new(collector: GarbageCollector) -> Self {
        let period = collector.config().refresh_window();
        Self { collector, period }
    }

    /// Overrides the tick period.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Starts the background task.
    ///
    /// The first tick happens one period from now; connecting already
    /// runs a collection.
    pub fn start(self) -> GcHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = GcHandle { shutdown_tx };

        tokio::spawn(self.run(shutdown_rx));

        handle
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut timer = interval_at(Instant::now() + self.period, self.period);

        info!(period = ?self.period, "Starting garbage collection scheduler");

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.tick().await;
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Garbage collection scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn tick(&self) {
        match self.collector.run().await {
            Ok(GcOutcome::Skipped) => debug!("Scheduled collection skipped"),
            Ok(GcOutcome::Swept(report)) => {
                debug!(evicted = report.evicted.len(), "Scheduled collection swept")
            },
            Err(e) => warn!(error = %e, "Scheduled garbage collection failed"),
        }
    }
}
