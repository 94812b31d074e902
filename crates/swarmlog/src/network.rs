//! The running network: a coordinator task plus the means to feed and
//! query it.
//!
//! [`Network`] bundles the reactive source providers, a command handle and
//! the spawned driver task, so an application wires collaborators in and
//! talks to the coordinator without touching the lower-level pieces.

use std::sync::Arc;

use swarmlog_core::{ChannelName, LoadingIndicator, SharedLogSession, SharedTransport, Username};
use swarmlog_net::{
    reactive_sources, NetworkConfig, NetworkHandle, NetworkSession, NetworkStatus, Providers,
};
use tokio::task::JoinHandle;

use crate::error::{Result, SwarmlogError};

/// A network session coordinator running on the tokio runtime.
pub struct Network {
    providers: Providers,
    handle: NetworkHandle,
    task: JoinHandle<swarmlog_net::Result<()>>,
}

impl Network {
    /// Spawn an offline coordinator.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: NetworkConfig, indicator: Arc<dyn LoadingIndicator>) -> Self {
        let (session, handle) = NetworkSession::new(config, indicator);
        let (providers, sources) = reactive_sources();
        let task = session.spawn(sources);
        tracing::debug!("network driver spawned");
        Self {
            providers,
            handle,
            task,
        }
    }

    /// A cloneable handle to the coordinator.
    pub fn handle(&self) -> &NetworkHandle {
        &self.handle
    }

    /// The reactive source providers.
    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Collaborators
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish the transport node, or `None` when it goes away.
    pub fn bind_transport(&self, node: Option<SharedTransport>) {
        self.providers.set_transport(node);
    }

    /// Publish the log session, or `None` when it goes away.
    pub fn bind_log_session(&self, session: Option<SharedLogSession>) {
        self.providers.set_log_session(session);
    }

    /// Publish the current user. A different user stops the network.
    pub fn set_identity(&self, username: Option<Username>) {
        self.providers.set_identity(username);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn join(&self, channel: impl Into<ChannelName>) -> Result<()> {
        Ok(self.handle.join(channel).await?)
    }

    pub async fn leave(&self, channel: impl Into<ChannelName>) -> Result<()> {
        Ok(self.handle.leave(channel).await?)
    }

    /// Drop a channel from the registry without asking the log session.
    pub fn remove(&self, channel: impl Into<ChannelName>) -> Result<()> {
        Ok(self.handle.remove(channel)?)
    }

    pub async fn status(&self) -> Result<NetworkStatus> {
        Ok(self.handle.status().await?)
    }

    /// Stop the network. The coordinator keeps running and can be brought
    /// back online by publishing new collaborators.
    pub async fn stop(&self) -> Result<()> {
        Ok(self.handle.stop().await?)
    }

    /// Stop the network and wait for the driver task to exit.
    pub async fn shutdown(self) -> Result<()> {
        // An already-exited driver has closed its receiver; its result is
        // still collected below.
        if let Err(e) = self.handle.shutdown() {
            tracing::debug!(error = %e, "driver already closed");
        }
        self.task
            .await
            .map_err(|e| SwarmlogError::TaskFailed(e.to_string()))??;
        Ok(())
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("closed", &self.handle.is_closed())
            .finish_non_exhaustive()
    }
}
