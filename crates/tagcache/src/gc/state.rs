//! Garbage collection run statistics.

use std::time::Instant;

use parking_lot::RwLock;

/// Tracks what garbage collection has done in this process.
///
/// The marker key coordinates instances through the store; these
/// statistics are local and only feed logging and the HTTP surface.
#[derive(Debug)]
pub struct GcStats {
    /// When the last sweep finished.
    last_sweep: RwLock<Option<Instant>>,
    /// Sweeps this process performed.
    sweeps: RwLock<u64>,
    /// Runs skipped because another run held the marker.
    skipped: RwLock<u64>,
    /// Tags forgotten across all sweeps.
    evicted: RwLock<u64>,
    /// The last error message, if any.
    last_error: RwLock<Option<String>>,
    /// Number of consecutive failures.
    failure_count: RwLock<u32>,
}

impl GcStats {
    pub fn new() -> Self {
        Self {
            last_sweep: RwLock::new(None),
            sweeps: RwLock::new(0),
            skipped: RwLock::new(0),
            evicted: RwLock::new(0),
            last_error: RwLock::new(None),
            failure_count: RwLock::new(0),
        }
    }

    /// Records a completed sweep that forgot `evicted` tags.
    pub fn record_sweep(&self, evicted: usize) {
        let mut last_sweep = self.last_sweep.write();
        let mut sweeps = self.sweeps.write();
        let mut total = self.evicted.write();
        let mut last_error = self.last_error.write();
        let mut failure_count = self.failure_count.write();

        *last_sweep = Some(Instant::now());
        *sweeps += 1;
        *total += evicted as u64;
        *last_error = None;
        *failure_count = 0;
    }

    /// Records a run that found the marker already set.
    pub fn record_skip(&self) {
        *self.skipped.write() += 1;
    }

    /// Records a failed run.
    pub fn record_failure(&self, error: impl Into<String>) {
        let mut last_error = self.last_error.write();
        let mut failure_count = self.failure_count.write();

        *last_error = Some(error.into());
        *failure_count += 1;
    }

    pub fn last_sweep(&self) -> Option<Instant> {
        *self.last_sweep.read()
    }

    pub fn sweeps(&self) -> u64 {
        *self.sweeps.read()
    }

    pub fn skipped(&self) -> u64 {
        *self.skipped.read()
    }

    pub fn evicted(&self) -> u64 {
        *self.evicted.read()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Returns the number of consecutive failures.
    pub fn failure_count(&self) -> u32 {
        *self.failure_count.read()
    }

    /// Returns true unless the most recent run failed.
    pub fn is_healthy(&self) -> bool {
        self.last_error.read().is_none()
    }
}

impl Default for GcStats {
    fn default() -> Self {
        Self::new()
    }
}
