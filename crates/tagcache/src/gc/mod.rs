//! Garbage collection of tag metadata.
//!
//! Tags accumulate in the `TAGS` and `TIME` hashes as new tag names are
//! used. This module forgets tags nobody touched within the staleness
//! threshold, at most once per refresh window across all instances.

mod collector;
mod scheduler;
mod state;

pub use collector::{GarbageCollector, GcOutcome, GcReport};
pub use scheduler::{GcHandle, GcScheduler};
pub use state::GcStats;
