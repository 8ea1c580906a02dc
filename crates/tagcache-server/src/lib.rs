//! # tagcache-server
//!
//! Axum HTTP surface over a shared [`tagcache::TagCache`].
//!
//! | Method | Path | Effect |
//! |---|---|---|
//! | GET | `/health` | connection status |
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/entries/{key}?tags=a,b` | stored JSON value, 404 on miss |
//! | PUT | `/entries/{key}?tags=a,b&ttl=60` | stores the JSON body |
//! | DELETE | `/cache` | flushes every entry |
//! | DELETE | `/tags/{tag}` | invalidates one tag |
//! | POST | `/invalidate` | invalidates the listed tags |
//! | POST | `/gc` | runs tag metadata garbage collection |

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod state;

pub use error::AppError;
pub use handlers::health::HealthResponse;
pub use server::{create_router, run_server};
pub use settings::{ServerSettings, Settings};
pub use state::AppState;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
