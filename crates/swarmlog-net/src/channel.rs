//! Channel session: one joined channel, owned by the coordinator's registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use swarmlog_core::{ChannelDescriptor, ChannelLog, ChannelName};

use crate::error::{NetworkError, Result};
use crate::handle::{NetworkHandle, NetworkLink};

/// A joined channel.
///
/// Built from the log session's descriptor for the channel plus a link back
/// to the owning coordinator. The registry calls [`ChannelSession::stop`]
/// before discarding a session; the channel log is not touched afterwards.
pub struct ChannelSession {
    name: ChannelName,
    log: Arc<dyn ChannelLog>,
    metadata: BTreeMap<String, String>,
    network: NetworkLink,
    stopped: bool,
}

impl ChannelSession {
    pub(crate) fn new(descriptor: ChannelDescriptor, network: NetworkLink) -> Self {
        Self {
            name: descriptor.name,
            log: descriptor.log,
            metadata: descriptor.metadata,
            network,
            stopped: false,
        }
    }

    pub fn name(&self) -> &ChannelName {
        &self.name
    }

    /// Address of the channel's log.
    pub fn address(&self) -> &str {
        self.log().address()
    }

    /// Fields the log session attached to the channel descriptor.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// The channel's log.
    ///
    /// # Panics
    ///
    /// In debug builds, if the session has been stopped.
    pub fn log(&self) -> &Arc<dyn ChannelLog> {
        debug_assert!(!self.stopped, "channel {} used after stop", self.name);
        &self.log
    }

    /// Handle to the owning coordinator, if it is still running.
    pub fn network(&self) -> Option<NetworkHandle> {
        self.network.upgrade()
    }

    /// Ask the owning coordinator to leave this channel.
    pub async fn leave(&self) -> Result<()> {
        let network = self.network().ok_or(NetworkError::DriverClosed)?;
        network.leave(self.name.clone()).await
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Tear down the channel log. Idempotent.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        tracing::debug!(channel = %self.name, address = %self.log.address(), "stopping channel");
        self.log.close();
        self.stopped = true;
    }
}

impl Drop for ChannelSession {
    fn drop(&mut self) {
        if !self.stopped {
            tracing::warn!(channel = %self.name, "channel session dropped without stop");
            self.stop();
        }
    }
}

impl fmt::Debug for ChannelSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSession")
            .field("name", &self.name)
            .field("address", &self.log.address())
            .field("stopped", &self.stopped)
            .finish()
    }
}
