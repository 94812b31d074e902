//! Error types for the facade.

use swarmlog_core::CoreError;
use swarmlog_net::NetworkError;
use thiserror::Error;

/// Errors surfaced by [`Network`](crate::Network).
#[derive(Debug, Error)]
pub enum SwarmlogError {
    /// Coordinator error.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Collaborator error.
    #[error("collaborator error: {0}")]
    Core(#[from] CoreError),

    /// The driver task panicked or was cancelled.
    #[error("driver task failed: {0}")]
    TaskFailed(String),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, SwarmlogError>;
