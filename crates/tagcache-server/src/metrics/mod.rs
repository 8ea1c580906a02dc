//! Prometheus export and HTTP request metrics.
//!
//! Cache-level counters live in [`tagcache::CacheMetrics`]; this module
//! only adds the HTTP layer and installs the exporter.

pub mod http;
pub mod setup;

pub use setup::{init_metrics, register_all};
