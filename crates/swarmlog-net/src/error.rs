//! Error types for the network session coordinator.

use swarmlog_core::CoreError;
use thiserror::Error;

/// Errors that can occur during coordinator operations.
///
/// Requests made in the wrong state (joining while offline, leaving a channel
/// that is not joined) are not errors: they are silent no-ops.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A call into the transport node or log session failed.
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CoreError),

    /// A shutdown call did not complete within the configured bound.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The coordinator task is no longer running.
    #[error("network driver closed")]
    DriverClosed,
}

/// Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
