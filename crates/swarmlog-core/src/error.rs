//! Error types for the swarmlog core.

use thiserror::Error;

/// Errors reported by external collaborators (transport node, log session).
#[derive(Debug, Error)]
pub enum CoreError {
    /// The transport node rejected or failed an operation.
    #[error("transport error: {0}")]
    Transport(String),

    /// The log session rejected or failed an operation.
    #[error("log session error: {0}")]
    LogSession(String),
}

/// Result type for collaborator operations.
pub type Result<T> = std::result::Result<T, CoreError>;
