//! Test fixtures and helpers.
//!
//! Common setup code for coordinator tests.

use std::sync::Arc;
use std::time::Duration;

use swarmlog_core::{
    ChannelName, LogEvent, LogSession, MemoryLogSession, MemoryTransportNode, RecordingIndicator,
    SharedLogSession, SharedTransport,
};
use swarmlog_net::{
    reactive_sources, NetworkConfig, NetworkHandle, NetworkSession, NetworkStatus, Providers,
    Result,
};
use tokio::task::JoinHandle;

/// A coordinator driven directly, with in-memory collaborators.
pub struct TestNetwork {
    pub session: NetworkSession,
    pub handle: NetworkHandle,
    pub indicator: Arc<RecordingIndicator>,
    pub transport: Arc<MemoryTransportNode>,
    pub log: Arc<MemoryLogSession>,
}

impl TestNetwork {
    /// Offline coordinator; collaborators exist but are not bound.
    pub fn new() -> Self {
        Self::with_log(MemoryLogSession::new("log-0"))
    }

    /// Offline coordinator with a custom log session.
    pub fn with_log(log: MemoryLogSession) -> Self {
        let indicator = Arc::new(RecordingIndicator::new());
        let (session, handle) = NetworkSession::new(NetworkConfig::default(), indicator.clone());
        Self {
            session,
            handle,
            indicator,
            transport: Arc::new(MemoryTransportNode::new("node-0")),
            log: Arc::new(log),
        }
    }

    /// Coordinator with transport and log session bound.
    pub fn online() -> Self {
        let mut net = Self::new();
        net.bring_online();
        net
    }

    /// Bind the fixture's transport and log session.
    pub fn bring_online(&mut self) {
        self.session
            .on_transport_changed(Some(self.transport.clone() as SharedTransport));
        self.session
            .on_log_session_changed(Some(self.log.clone() as SharedLogSession));
    }

    /// Replace the log session with a fresh one and return it.
    pub fn rebind_log(&mut self, id: &str) -> Arc<MemoryLogSession> {
        let next = Arc::new(MemoryLogSession::new(id));
        self.log = next.clone();
        self.session
            .on_log_session_changed(Some(next.clone() as SharedLogSession));
        next
    }

    /// Request a join and apply the resulting events.
    pub async fn join_now(&mut self, name: &str) -> Result<()> {
        self.session.join_channel(&ChannelName::from(name)).await?;
        self.session.process_pending();
        Ok(())
    }

    /// Emit an event from the log session and apply it.
    ///
    /// For `joined`, the channel is first added to the log session's
    /// descriptor table; for `left`, removed from it.
    pub fn deliver(&mut self, event: &LogEvent) -> usize {
        match event {
            LogEvent::Joined(name) => {
                self.log.announce_joined(name.clone());
            }
            LogEvent::Left(name) => self.log.announce_left(name.clone()),
            LogEvent::Peers(peers) => self.log.announce_peers(peers.clone()),
        }
        self.session.process_pending()
    }

    /// Listener counts on the current log session, in `joined, left, peers` order.
    pub fn listener_counts(&self) -> [usize; 3] {
        swarmlog_core::LogEventKind::ALL.map(|kind| self.log.events().listener_count(kind))
    }
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new()
    }
}

/// A coordinator running as a spawned task, fed through reactive sources.
pub struct TestDriver {
    pub providers: Providers,
    pub handle: NetworkHandle,
    pub indicator: Arc<RecordingIndicator>,
    pub task: JoinHandle<Result<()>>,
}

impl TestDriver {
    /// Spawn an offline coordinator on the current runtime.
    pub fn spawn() -> Self {
        let indicator = Arc::new(RecordingIndicator::new());
        let (session, handle) = NetworkSession::new(NetworkConfig::default(), indicator.clone());
        let (providers, sources) = reactive_sources();
        let task = session.spawn(sources);
        Self {
            providers,
            handle,
            indicator,
            task,
        }
    }

    /// Publish a transport node and log session.
    pub fn publish(&self, node: &Arc<MemoryTransportNode>, log: &Arc<MemoryLogSession>) {
        self.providers
            .set_transport(Some(node.clone() as SharedTransport));
        self.providers
            .set_log_session(Some(log.clone() as SharedLogSession));
    }

    /// Poll the coordinator's status until `done` holds.
    ///
    /// # Panics
    ///
    /// If the condition does not hold within about a second.
    pub async fn wait_for<F>(&self, mut done: F) -> NetworkStatus
    where
        F: FnMut(&NetworkStatus) -> bool,
    {
        for _ in 0..200 {
            let status = self.handle.status().await.expect("driver running");
            if done(&status) {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("coordinator did not reach the expected state");
    }

    /// Shut the task down and wait for it.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown()?;
        self.task.await.expect("driver task panicked")
    }
}
