//! Request handlers.

pub mod entries;
pub mod gc;
pub mod health;
pub mod invalidate;
pub mod metrics;
