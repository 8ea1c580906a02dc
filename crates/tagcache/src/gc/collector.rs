//! Marker-gated sweep of idle tag metadata.

use std::sync::Arc;

use serde::Serialize;
use tagcache_core::Result;
use tagcache_core::keyspace::{REFRESH_KEY, TIME_KEY};
use tagcache_store::KeyValueStore;
use tracing::{debug, info, warn};

use super::GcStats;
use crate::config::GcConfig;
use crate::metrics::CacheMetrics;
use crate::tags::{TagVersionStore, parse_timestamp};

/// What a single sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GcReport {
    /// Tags found in the timestamp hash.
    pub scanned: usize,
    /// Tags forgotten, sorted.
    pub evicted: Vec<String>,
}

/// Result of a garbage collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GcOutcome {
    /// Another run claimed the window, or the cache is disabled.
    Skipped,
    /// This run swept the timestamp hash.
    Swept(GcReport),
}

impl GcOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Tags forgotten by this run.
    pub fn evicted(&self) -> &[String] {
        match self {
            Self::Skipped => &[],
            Self::Swept(report) => &report.evicted,
        }
    }
}

/// Bounds the tag metadata hashes by forgetting tags nobody has used for
/// a while.
///
/// Forgetting is safe: an idle tag has no live entry depending on its
/// exact version, and an unseen tag is bumped past version 1 (see
/// [`TagVersionStore::bump_version`]).
#[derive(Debug, Clone)]
pub struct GarbageCollector {
    tags: TagVersionStore,
    store: Arc<dyn KeyValueStore>,
    config: GcConfig,
    stats: Arc<GcStats>,
    metrics: CacheMetrics,
}

impl GarbageCollector {
    pub fn new(
        tags: TagVersionStore,
        store: Arc<dyn KeyValueStore>,
        config: GcConfig,
        stats: Arc<GcStats>,
        metrics: CacheMetrics,
    ) -> Self {
        Self {
            tags,
            store,
            config,
            stats,
            metrics,
        }
    }

    /// Sweeps if no instance has done so within the refresh window.
    ///
    /// The window is claimed with a set-if-absent marker whose TTL is the
    /// window itself. Two instances racing past an expired marker may both
    /// sweep; deletes are idempotent so that is harmless.
    pub async fn run(&self) -> Result<GcOutcome> {
        let claimed = match self
            .store
            .set_nx_with_ttl(REFRESH_KEY, b"1", self.config.refresh_window())
            .await
        {
            Ok(claimed) => claimed,
            Err(e) => {
                let err = e.during("set_nx");
                self.stats.record_failure(err.to_string());
                return Err(err);
            },
        };

        if !claimed {
            debug!("Garbage collection marker present, skipping sweep");
            self.stats.record_skip();
            return Ok(GcOutcome::Skipped);
        }

        match self.sweep().await {
            Ok(report) => {
                self.stats.record_sweep(report.evicted.len());
                self.metrics
                    .record_gc_evictions(report.evicted.len() as u64);
                info!(
                    scanned = report.scanned,
                    evicted = report.evicted.len(),
                    "Garbage collection sweep finished"
                );
                Ok(GcOutcome::Swept(report))
            },
            Err(e) => {
                self.stats.record_failure(e.to_string());
                Err(e)
            },
        }
    }

    /// Forgets every tag idle for longer than the staleness threshold.
    ///
    /// Does not look at the marker; [`run`](Self::run) is the gated entry
    /// point.
    pub async fn sweep(&self) -> Result<GcReport> {
        let _timer = self.metrics.start_timer("gc");
        let now = self.tags.clock().now();
        let stale_after = self.config.stale_after_secs;

        let times = self
            .store
            .hgetall(TIME_KEY)
            .await
            .map_err(|e| e.during("hgetall"))?;

        let mut report = GcReport {
            scanned: times.len(),
            evicted: Vec::new(),
        };

        for (tag, raw) in times {
            let stale = match parse_timestamp(&raw) {
                Some(touched) => now.saturating_sub(touched) > stale_after,
                None => {
                    warn!(tag = %tag, "Unparseable tag timestamp, forgetting tag");
                    true
                },
            };

            if stale {
                self.tags.forget(&tag).await?;
                debug!(tag = %tag, "Forgot idle tag");
                report.evicted.push(tag);
            }
        }

        report.evicted.sort();
        Ok(report)
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<GcStats> {
        &self.stats
    }
}
