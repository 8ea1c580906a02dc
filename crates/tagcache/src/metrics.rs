//! Cache metrics recording.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Describes the cache metrics to the installed recorder.
/// Call once at startup, before the first operation.
pub fn register_cache_metrics() {
    metrics::describe_counter!("tagcache_cache_hits_total", "Total number of cache hits");
    metrics::describe_counter!("tagcache_cache_misses_total", "Total number of cache misses");
    metrics::describe_counter!("tagcache_saves_total", "Total number of payloads written");
    metrics::describe_counter!(
        "tagcache_invalidations_total",
        "Total number of invalidations by mode"
    );
    metrics::describe_counter!(
        "tagcache_gc_evictions_total",
        "Total number of tags forgotten by garbage collection"
    );
    metrics::describe_histogram!(
        "tagcache_cache_operation_seconds",
        "Time spent on cache operations"
    );
}

/// Cache metrics recorder.
///
/// Forwards to the global `metrics` recorder and keeps in-process atomic
/// counters so the hit rate can be read without an exporter. Clones share
/// the counters.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    saves: Arc<AtomicU64>,
    invalidations: Arc<AtomicU64>,
    gc_evictions: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self {
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            saves: Arc::new(AtomicU64::new(0)),
            invalidations: Arc::new(AtomicU64::new(0)),
            gc_evictions: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("tagcache_cache_hits_total").increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("tagcache_cache_misses_total").increment(1);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
        counter!("tagcache_saves_total").increment(1);
    }

    /// Records an invalidation, labelled by clean mode.
    pub fn record_invalidation(&self, mode: &'static str) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        counter!("tagcache_invalidations_total", "mode" => mode).increment(1);
    }

    /// Records tags forgotten by one garbage collection sweep.
    pub fn record_gc_evictions(&self, count: u64) {
        self.gc_evictions.fetch_add(count, Ordering::Relaxed);
        counter!("tagcache_gc_evictions_total").increment(count);
    }

    pub fn record_operation_duration(&self, operation: &'static str, duration: Duration) {
        histogram!("tagcache_cache_operation_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }

    /// Starts timing an operation; the duration is recorded when the
    /// returned guard drops.
    pub fn start_timer(&self, operation: &'static str) -> OperationTimer<'_> {
        OperationTimer {
            metrics: self,
            operation,
            start: Instant::now(),
        }
    }

    /// Fraction of loads that hit, 0.0 when nothing was loaded yet.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let misses = self.misses() as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    pub fn gc_evictions(&self) -> u64 {
        self.gc_evictions.load(Ordering::Relaxed)
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard returned by [`CacheMetrics::start_timer`].
#[derive(Debug)]
pub struct OperationTimer<'a> {
    metrics: &'a CacheMetrics,
    operation: &'static str,
    start: Instant,
}

impl Drop for OperationTimer<'_> {
    fn drop(&mut self) {
        self.metrics
            .record_operation_duration(self.operation, self.start.elapsed());
    }
}
