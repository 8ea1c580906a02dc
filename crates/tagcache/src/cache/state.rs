//! Connection state of a cache facade.

use std::fmt;

use serde::Serialize;

/// Lifecycle of the facade's link to its backing store.
///
/// `Disconnected -> Connecting -> Connected`, or
/// `Disconnected -> Connecting -> Failed`. `Failed` is terminal: the
/// facade never reconnects and stays a no-op for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection was attempted.
    Disconnected,
    /// Health check in progress.
    Connecting,
    /// The store answered its health check.
    Connected,
    /// The store was unreachable; holds the reason.
    Failed(String),
}

impl ConnectionState {
    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: &ConnectionState) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (Self::Connecting, Self::Failed(_))
        )
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Connected | Self::Failed(_))
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.label()),
        }
    }
}
