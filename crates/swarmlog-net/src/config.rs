//! Coordinator configuration.

use std::time::Duration;

/// Configuration for the network session coordinator.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bound on each shutdown call (log session, then transport) made by
    /// `stop`. `None` waits indefinitely.
    pub shutdown_timeout: Option<Duration>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl NetworkConfig {
    /// Set the shutdown bound.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Wait for shutdown calls without a bound.
    pub fn without_shutdown_timeout(mut self) -> Self {
        self.shutdown_timeout = None;
        self
    }
}
