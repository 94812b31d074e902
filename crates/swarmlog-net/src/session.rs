//! The network session coordinator.
//!
//! Owns the channel registry, the current transport node and log session
//! handles, the peer set and the event bridge. Every mutation runs on the
//! coordinator's own turn: either a direct `&mut self` call or an event
//! drained from the mailbox. Nothing here is shared across threads.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use swarmlog_core::{
    ChannelName, LoadingIndicator, LoadingKey, LogEvent, LogSession, NetworkState, PeerId,
    SharedLogSession, SharedTransport, TransportNode, Username,
};
use tokio::sync::mpsc;

use crate::bridge::{BridgedEvent, EventBridge};
use crate::channel::ChannelSession;
use crate::config::NetworkConfig;
use crate::error::{NetworkError, Result};
use crate::handle::{Command, NetworkHandle, NetworkLink};
use crate::status::NetworkStatus;

/// The network session coordinator.
///
/// The registry of [`ChannelSession`]s is the source of truth for which
/// channels are joined. It is only mutated by `joined`/`left` events, by
/// teardown, and by explicit removal. Join and leave requests never touch it
/// directly.
pub struct NetworkSession {
    config: NetworkConfig,
    indicator: Arc<dyn LoadingIndicator>,
    transport: Option<SharedTransport>,
    log_session: Option<SharedLogSession>,
    bridge: Option<EventBridge>,
    /// Incremented on every log session change. Events tagged with an older
    /// generation are discarded.
    generation: u64,
    peers: Vec<PeerId>,
    channels: HashMap<ChannelName, ChannelSession>,
    /// Join requests issued whose `joined` event has not arrived yet.
    pending_joins: HashSet<ChannelName>,
    /// Leave requests issued whose `left` event has not arrived yet.
    pending_leaves: HashSet<ChannelName>,
    username: Option<Username>,
    /// Set while a `stop` has begun and not yet released every handle.
    stop_pending: bool,
    mailbox_tx: mpsc::UnboundedSender<BridgedEvent>,
    pub(crate) mailbox_rx: mpsc::UnboundedReceiver<BridgedEvent>,
    pub(crate) commands: Option<mpsc::UnboundedReceiver<Command>>,
    link: NetworkLink,
}

impl NetworkSession {
    /// Create an offline coordinator and the handle used to command it.
    ///
    /// The command channel closes once every [`NetworkHandle`] is dropped.
    pub fn new(config: NetworkConfig, indicator: Arc<dyn LoadingIndicator>) -> (Self, NetworkHandle) {
        let (mailbox_tx, mailbox_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let handle = NetworkHandle::new(commands_tx);

        let session = Self {
            config,
            indicator,
            transport: None,
            log_session: None,
            bridge: None,
            generation: 0,
            peers: Vec::new(),
            channels: HashMap::new(),
            pending_joins: HashSet::new(),
            pending_leaves: HashSet::new(),
            username: None,
            stop_pending: false,
            mailbox_tx,
            mailbox_rx,
            commands: Some(commands_rx),
            link: handle.downgrade(),
        };
        (session, handle)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derived state
    // ─────────────────────────────────────────────────────────────────────────

    /// Connectivity state, computed from the bound handles on every call.
    pub fn state(&self) -> NetworkState {
        NetworkState::derive(self.transport.is_some(), self.log_session.is_some())
    }

    /// True iff both a transport node and a log session are bound.
    pub fn is_online(&self) -> bool {
        self.state().is_online()
    }

    pub fn transport(&self) -> Option<&SharedTransport> {
        self.transport.as_ref()
    }

    pub fn log_session(&self) -> Option<&SharedLogSession> {
        self.log_session.as_ref()
    }

    /// Last observed identity.
    pub fn username(&self) -> Option<&Username> {
        self.username.as_ref()
    }

    /// Current swarm peers.
    pub fn peers(&self) -> &[PeerId] {
        &self.peers
    }

    /// Names of joined channels, sorted.
    pub fn channel_names(&self) -> Vec<ChannelName> {
        let mut names: Vec<ChannelName> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    /// Joined channels, in no particular order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelSession> {
        self.channels.values()
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelSession> {
        self.channels.get(name)
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// The bridge to the current log session, if one is bound.
    pub fn bridge(&self) -> Option<&EventBridge> {
        self.bridge.as_ref()
    }

    /// Whether a join request for `name` is waiting for its `joined` event.
    pub fn is_join_pending(&self, name: &str) -> bool {
        self.pending_joins.contains(name)
    }

    /// Whether a leave request for `name` is waiting for its `left` event.
    pub fn is_leave_pending(&self, name: &str) -> bool {
        self.pending_leaves.contains(name)
    }

    /// Snapshot for the presentation layer.
    pub fn status(&self) -> NetworkStatus {
        let state = self.state();
        NetworkStatus {
            state,
            online: state.is_online(),
            username: self.username.clone(),
            channels: self.channel_names(),
            peers: self.peers.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask the log session to join a channel.
    ///
    /// No-op without a log session, when the channel is already joined, or
    /// when a join for it is already in flight. Otherwise raises the
    /// `channel:join` indicator and issues the request. The registry changes
    /// only when the `joined` event arrives, which also clears the indicator.
    ///
    /// A failed request is returned to the caller and leaves the indicator
    /// raised.
    pub async fn join_channel(&mut self, channel: &ChannelName) -> Result<()> {
        let Some(session) = self.log_session.clone() else {
            tracing::debug!(channel = %channel, "join ignored: no log session");
            return Ok(());
        };
        if self.channels.contains_key(channel) || self.pending_joins.contains(channel) {
            tracing::debug!(channel = %channel, "join ignored: already joined or joining");
            return Ok(());
        }

        self.indicator.start(LoadingKey::ChannelJoin);
        self.pending_joins.insert(channel.clone());

        if let Err(e) = session.join(channel).await {
            self.pending_joins.remove(channel);
            tracing::warn!(
                channel = %channel,
                error = %e,
                "join request failed; channel:join indicator left raised"
            );
            return Err(e.into());
        }
        Ok(())
    }

    /// Ask the log session to leave a channel.
    ///
    /// No-op without a log session, when the channel is not joined, or when
    /// a leave for it is already in flight. Otherwise raises the
    /// `channel:leave` indicator and issues the request. Removal happens when
    /// the `left` event arrives.
    pub async fn leave_channel(&mut self, channel: &ChannelName) -> Result<()> {
        let Some(session) = self.log_session.clone() else {
            tracing::debug!(channel = %channel, "leave ignored: no log session");
            return Ok(());
        };
        if !self.channels.contains_key(channel) || self.pending_leaves.contains(channel) {
            tracing::debug!(channel = %channel, "leave ignored: not joined or already leaving");
            return Ok(());
        }

        self.indicator.start(LoadingKey::ChannelLeave);
        self.pending_leaves.insert(channel.clone());

        if let Err(e) = session.leave(channel).await {
            self.pending_leaves.remove(channel);
            tracing::warn!(
                channel = %channel,
                error = %e,
                "leave request failed; channel:leave indicator left raised"
            );
            return Err(e.into());
        }
        Ok(())
    }

    /// Stop the channel session for `name` and drop it from the registry.
    ///
    /// Returns false if the channel was not joined.
    pub fn remove_channel(&mut self, name: &str) -> bool {
        match self.channels.remove(name) {
            Some(mut channel) => {
                channel.stop();
                tracing::debug!(channel = %name, "channel removed");
                true
            }
            None => false,
        }
    }

    /// Shut the network down.
    ///
    /// No-op unless online or finishing an earlier stop that failed. Tears
    /// down every channel binding, then stops the log session and then the
    /// transport node, each bounded by `shutdown_timeout`. A handle is
    /// released once its shutdown succeeds; a failure is returned
    /// immediately and the remaining steps are skipped, so the next call
    /// resumes where this one failed.
    ///
    /// If the log session fails to stop it stays bound and a fresh event
    /// bridge is attached, so the registry keeps following it.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_online() && !self.stop_pending {
            return Ok(());
        }
        tracing::info!("stopping network");
        self.stop_pending = true;

        self.stop_log_bindings();

        if let Some(session) = self.log_session.clone() {
            if let Err(e) = self.bounded("log session", session.stop()).await {
                tracing::warn!(session = %session.id(), error = %e, "log session stop failed; still bound");
                self.attach_bridge();
                return Err(e);
            }
            self.log_session = None;
        }
        if let Some(node) = self.transport.clone() {
            self.bounded("transport", node.stop()).await?;
            self.transport = None;
        }

        self.stop_pending = false;
        tracing::info!("network stopped");
        Ok(())
    }

    /// Tear down everything bound to the current log session.
    ///
    /// Stops and removes every channel session, clears the peer set and the
    /// in-flight request sets, and detaches the event bridge. Safe to call
    /// with no log session bound.
    pub fn stop_log_bindings(&mut self) {
        for name in self.channel_names() {
            self.remove_channel(name.as_str());
        }
        self.peers.clear();
        self.pending_joins.clear();
        self.pending_leaves.clear();

        if let Some(bridge) = self.bridge.take() {
            bridge.detach();
        }
    }

    async fn bounded<F>(&self, what: &str, shutdown: F) -> Result<()>
    where
        F: Future<Output = swarmlog_core::Result<()>>,
    {
        match self.config.shutdown_timeout {
            Some(limit) => tokio::time::timeout(limit, shutdown)
                .await
                .map_err(|_| NetworkError::Timeout(format!("{what} shutdown after {limit:?}")))??,
            None => shutdown.await?,
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event handlers
    // ─────────────────────────────────────────────────────────────────────────

    /// A `joined` event arrived.
    ///
    /// Always clears the `channel:join` indicator. Adds a channel session
    /// built from the log session's descriptor unless the channel is already
    /// in the registry.
    pub fn on_joined_channel(&mut self, name: ChannelName) {
        self.indicator.stop(LoadingKey::ChannelJoin);
        self.pending_joins.remove(&name);

        if self.channels.contains_key(&name) {
            tracing::debug!(channel = %name, "duplicate joined event");
            return;
        }
        let Some(session) = &self.log_session else {
            tracing::warn!(channel = %name, "joined event without a log session");
            return;
        };
        let Some(mut descriptor) = session.channel(&name) else {
            tracing::warn!(channel = %name, "log session has no descriptor for joined channel");
            return;
        };

        descriptor.name = name.clone();
        let channel = ChannelSession::new(descriptor, self.link.clone());
        tracing::debug!(channel = %name, address = %channel.address(), "channel joined");
        self.channels.insert(name, channel);
    }

    /// A `left` event arrived.
    ///
    /// Always clears the `channel:leave` indicator, then removes the channel
    /// if present.
    pub fn on_left_channel(&mut self, name: &ChannelName) {
        self.indicator.stop(LoadingKey::ChannelLeave);
        self.pending_leaves.remove(name);
        self.remove_channel(name.as_str());
    }

    /// A `peers` event arrived. Replaces the peer set.
    pub fn on_swarm_peer_update(&mut self, peers: Vec<PeerId>) {
        tracing::debug!(count = peers.len(), "swarm peers updated");
        self.peers = peers;
    }

    /// The transport node changed. Channel sessions are unaffected.
    ///
    /// A different node supersedes one left over from a failed stop.
    pub fn on_transport_changed(&mut self, node: Option<SharedTransport>) {
        if !same_handle(self.transport.as_ref(), node.as_ref()) {
            self.stop_pending = false;
        }
        match &node {
            Some(node) => tracing::info!(node = %node.id(), "transport bound"),
            None => tracing::info!("transport unbound"),
        }
        self.transport = node;
    }

    /// The log session changed.
    ///
    /// Tears down all bindings to the old session, then binds the new one
    /// and attaches the event bridge to it. Re-publishing the session that
    /// is already bound is a no-op.
    pub fn on_log_session_changed(&mut self, session: Option<SharedLogSession>) {
        if same_handle(self.log_session.as_ref(), session.as_ref()) {
            tracing::debug!("log session unchanged");
            return;
        }
        self.stop_log_bindings();
        self.log_session = session;
        self.attach_bridge();

        match &self.log_session {
            Some(session) => {
                tracing::info!(session = %session.id(), generation = self.generation, "log session bound")
            }
            None => tracing::info!("log session unbound"),
        }
    }

    /// Start a new generation and listen to the bound log session, if any.
    fn attach_bridge(&mut self) {
        self.generation += 1;
        if let Some(bridge) = self.bridge.take() {
            bridge.detach();
        }
        self.bridge = self.log_session.as_ref().map(|session| {
            EventBridge::attach(session.as_ref(), self.generation, &self.mailbox_tx)
        });
    }

    /// The user identity changed.
    ///
    /// A different identity stops the whole network before it is recorded.
    /// The identity is recorded even if stopping fails; the failure is
    /// returned.
    pub async fn on_identity_changed(&mut self, username: Option<Username>) -> Result<()> {
        let result = if username != self.username {
            tracing::info!(from = ?self.username, to = ?username, "identity changed");
            self.stop().await
        } else {
            Ok(())
        };
        self.username = username;
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mailbox
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply every event queued by the event bridge.
    ///
    /// Returns the number of events applied. Events from a detached bridge
    /// are discarded and not counted.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(bridged) = self.mailbox_rx.try_recv() {
            if self.dispatch(bridged) {
                applied += 1;
            }
        }
        applied
    }

    pub(crate) fn dispatch(&mut self, bridged: BridgedEvent) -> bool {
        let current = self.bridge.as_ref().map(EventBridge::generation);
        if current != Some(bridged.generation) {
            tracing::debug!(
                generation = bridged.generation,
                current = ?current,
                "dropping event from detached log session"
            );
            return false;
        }

        match bridged.event {
            LogEvent::Joined(name) => self.on_joined_channel(name),
            LogEvent::Left(name) => self.on_left_channel(&name),
            LogEvent::Peers(peers) => self.on_swarm_peer_update(peers),
        }
        true
    }
}

/// Whether two optional handles point at the same collaborator.
fn same_handle<T: ?Sized>(a: Option<&Arc<T>>, b: Option<&Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
        (None, None) => true,
        _ => false,
    }
}

impl std::fmt::Debug for NetworkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSession")
            .field("state", &self.state())
            .field("username", &self.username)
            .field("channels", &self.channel_names())
            .field("peers", &self.peers)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;
    use swarmlog_core::{LogEventKind, MemoryLogSession, MemoryTransportNode, RecordingIndicator};

    struct Harness {
        session: NetworkSession,
        _handle: NetworkHandle,
        indicator: Arc<RecordingIndicator>,
        transport: Arc<MemoryTransportNode>,
        log: Arc<MemoryLogSession>,
    }

    impl Harness {
        fn offline() -> Self {
            Self::with_log(MemoryLogSession::new("log-a"))
        }

        fn with_log(log: MemoryLogSession) -> Self {
            let indicator = Arc::new(RecordingIndicator::new());
            let (session, handle) =
                NetworkSession::new(NetworkConfig::default(), indicator.clone());
            Self {
                session,
                _handle: handle,
                indicator,
                transport: Arc::new(MemoryTransportNode::new("node-a")),
                log: Arc::new(log),
            }
        }

        fn online() -> Self {
            let mut h = Self::offline();
            h.bring_online();
            h
        }

        fn bring_online(&mut self) {
            self.session
                .on_transport_changed(Some(self.transport.clone() as SharedTransport));
            self.session
                .on_log_session_changed(Some(self.log.clone() as SharedLogSession));
        }

        async fn joined(&mut self, name: &str) {
            self.session.join_channel(&name.into()).await.unwrap();
            self.session.process_pending();
        }
    }

    #[tokio::test]
    async fn test_join_while_offline_is_noop() {
        let mut h = Harness::offline();

        h.session.join_channel(&"dev".into()).await.unwrap();

        assert!(h.log.join_requests().is_empty());
        assert_eq!(h.indicator.starts(LoadingKey::ChannelJoin), 0);
        assert!(h.session.channel_names().is_empty());
    }

    #[tokio::test]
    async fn test_join_is_event_driven() {
        let mut h = Harness::online();

        h.session.join_channel(&"general".into()).await.unwrap();

        // Request issued and indicator raised, but no registry change yet.
        assert_eq!(h.log.join_requests().len(), 1);
        assert!(h.indicator.is_active(LoadingKey::ChannelJoin));
        assert!(!h.session.has_channel("general"));
        assert!(h.session.is_join_pending("general"));

        assert_eq!(h.session.process_pending(), 1);

        assert!(h.session.has_channel("general"));
        assert!(!h.indicator.is_active(LoadingKey::ChannelJoin));
        assert!(!h.session.is_join_pending("general"));
        assert_eq!(
            h.session.channel("general").unwrap().address(),
            "/log/log-a/general"
        );
    }

    #[tokio::test]
    async fn test_double_join_issues_one_request() {
        let mut h = Harness::with_log(MemoryLogSession::new("log-a").with_auto_emit(false));
        h.bring_online();

        h.session.join_channel(&"x".into()).await.unwrap();
        h.session.join_channel(&"x".into()).await.unwrap();

        assert_eq!(h.log.join_requests(), vec![ChannelName::from("x")]);
        assert_eq!(h.indicator.starts(LoadingKey::ChannelJoin), 1);
    }

    #[tokio::test]
    async fn test_join_of_joined_channel_is_noop() {
        let mut h = Harness::online();
        h.joined("general").await;

        h.session.join_channel(&"general".into()).await.unwrap();

        assert_eq!(h.log.join_requests().len(), 1);
        assert_eq!(h.indicator.starts(LoadingKey::ChannelJoin), 1);
    }

    #[tokio::test]
    async fn test_double_leave_issues_one_request() {
        let mut h = Harness::with_log(MemoryLogSession::new("log-a").with_auto_emit(false));
        h.bring_online();
        h.log.announce_joined("x");
        h.session.process_pending();

        h.session.leave_channel(&"x".into()).await.unwrap();
        h.session.leave_channel(&"x".into()).await.unwrap();

        assert_eq!(h.log.leave_requests(), vec![ChannelName::from("x")]);
        assert_eq!(h.indicator.starts(LoadingKey::ChannelLeave), 1);
        assert!(h.session.has_channel("x"));
    }

    #[tokio::test]
    async fn test_leave_of_absent_channel_is_noop() {
        let mut h = Harness::online();

        h.session.leave_channel(&"nowhere".into()).await.unwrap();

        assert!(h.log.leave_requests().is_empty());
        assert_eq!(h.indicator.starts(LoadingKey::ChannelLeave), 0);
    }

    #[tokio::test]
    async fn test_left_event_stops_and_removes_channel() {
        let mut h = Harness::online();
        h.joined("general").await;
        let log = h.log.channel_log("general").unwrap();

        h.session.leave_channel(&"general".into()).await.unwrap();
        assert!(h.indicator.is_active(LoadingKey::ChannelLeave));
        h.session.process_pending();

        assert!(!h.session.has_channel("general"));
        assert!(!h.indicator.is_active(LoadingKey::ChannelLeave));
        assert!(log.is_closed());
    }

    #[test]
    fn test_duplicate_joined_event_is_idempotent() {
        let mut h = Harness::online();
        h.log.insert_joined("general");

        h.session.on_joined_channel("general".into());
        h.session.on_joined_channel("general".into());

        assert_eq!(h.session.channel_names(), vec![ChannelName::from("general")]);
        assert_eq!(h.indicator.stops(LoadingKey::ChannelJoin), 2);
    }

    #[test]
    fn test_left_event_for_absent_channel_clears_indicator() {
        let mut h = Harness::online();

        h.session.on_left_channel(&"ghost".into());

        assert_eq!(h.indicator.stops(LoadingKey::ChannelLeave), 1);
        assert!(h.session.channel_names().is_empty());
    }

    #[test]
    fn test_joined_event_without_descriptor_is_ignored() {
        let mut h = Harness::online();

        h.session.on_joined_channel("unknown".into());

        assert!(!h.session.has_channel("unknown"));
        assert_eq!(h.indicator.stops(LoadingKey::ChannelJoin), 1);
    }

    #[test]
    fn test_peer_update_replaces_set() {
        let mut h = Harness::online();

        h.log.announce_peers(vec!["a".into(), "b".into()]);
        h.log.announce_peers(vec!["c".into()]);
        h.session.process_pending();

        assert_eq!(h.session.peers(), &[PeerId::from("c")]);
    }

    #[test]
    fn test_online_requires_both_handles() {
        let mut h = Harness::offline();
        assert_eq!(h.session.state(), NetworkState::Offline);

        h.session
            .on_log_session_changed(Some(h.log.clone() as SharedLogSession));
        assert_eq!(h.session.state(), NetworkState::Offline);
        assert!(!h.session.is_online());

        h.session
            .on_transport_changed(Some(h.transport.clone() as SharedTransport));
        assert_eq!(h.session.state(), NetworkState::FullyOnline);

        h.session.on_log_session_changed(None);
        assert_eq!(h.session.state(), NetworkState::TransportOnly);
    }

    #[tokio::test]
    async fn test_transport_change_keeps_channels() {
        let mut h = Harness::online();
        h.joined("general").await;

        h.session
            .on_transport_changed(Some(Arc::new(MemoryTransportNode::new("node-b")) as SharedTransport));

        assert!(h.session.has_channel("general"));
        assert_eq!(h.session.transport().unwrap().id().as_str(), "node-b");
    }

    #[tokio::test]
    async fn test_log_session_rebind_tears_down() {
        let mut h = Harness::online();
        h.joined("general").await;
        h.log.announce_peers(vec!["p".into()]);
        h.session.process_pending();
        let old_channel = h.log.channel_log("general").unwrap();

        let next = Arc::new(MemoryLogSession::new("log-b"));
        h.session
            .on_log_session_changed(Some(next.clone() as SharedLogSession));

        assert!(h.session.channel_names().is_empty());
        assert!(h.session.peers().is_empty());
        assert!(old_channel.is_closed());
        for kind in LogEventKind::ALL {
            assert_eq!(h.log.events().listener_count(kind), 0);
            assert_eq!(next.events().listener_count(kind), 1);
        }
        assert_eq!(h.session.bridge().unwrap().session().as_str(), "log-b");
    }

    #[test]
    fn test_events_queued_before_rebind_are_discarded() {
        let mut h = Harness::online();
        h.log.announce_joined("stale");

        h.session
            .on_log_session_changed(Some(Arc::new(MemoryLogSession::new("log-b")) as SharedLogSession));

        assert_eq!(h.session.process_pending(), 0);
        assert!(h.session.channel_names().is_empty());
    }

    #[test]
    fn test_stop_log_bindings_without_session() {
        let mut h = Harness::offline();
        h.session.stop_log_bindings();
        assert!(h.session.bridge().is_none());
        assert!(h.session.peers().is_empty());
    }

    #[test]
    fn test_remove_channel() {
        let mut h = Harness::online();
        let log = h.log.insert_joined("general");
        h.session.on_joined_channel("general".into());

        assert!(h.session.remove_channel("general"));
        assert!(!h.session.remove_channel("general"));
        assert!(log.is_closed());
    }

    #[tokio::test]
    async fn test_stop_shuts_down_log_then_transport() {
        let mut h = Harness::online();
        h.joined("general").await;

        h.session.stop().await.unwrap();

        assert_eq!(h.log.stop_calls(), 1);
        assert_eq!(h.transport.stop_calls(), 1);
        assert!(!h.session.is_online());
        assert_eq!(h.session.state(), NetworkState::Offline);
        assert!(h.session.channel_names().is_empty());
        assert_eq!(h.log.events().total_listeners(), 0);

        // Second call is a no-op.
        h.session.stop().await.unwrap();
        assert_eq!(h.log.stop_calls(), 1);
        assert_eq!(h.transport.stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_when_offline_is_noop() {
        let mut h = Harness::offline();
        h.session
            .on_transport_changed(Some(h.transport.clone() as SharedTransport));

        h.session.stop().await.unwrap();

        assert_eq!(h.transport.stop_calls(), 0);
    }

    #[tokio::test]
    async fn test_log_stop_failure_propagates() {
        let mut h = Harness::online();
        h.log.fail_stop(true);

        let err = h.session.stop().await.unwrap_err();

        assert!(matches!(err, NetworkError::Collaborator(_)));
        assert_eq!(h.transport.stop_calls(), 0);
        assert!(h.session.log_session().is_some());
    }

    #[tokio::test]
    async fn test_transport_stop_failure_propagates() {
        let mut h = Harness::online();
        h.transport.fail_stop(true);

        assert!(h.session.stop().await.is_err());
        assert_eq!(h.log.stop_calls(), 1);
        assert!(h.session.log_session().is_none());
        assert_eq!(h.session.state(), NetworkState::TransportOnly);
    }

    #[tokio::test]
    async fn test_join_after_failed_log_stop_is_tracked() {
        let mut h = Harness::online();
        h.log.fail_stop(true);
        assert!(h.session.stop().await.is_err());

        assert!(h.session.bridge().is_some());
        assert_eq!(h.log.events().total_listeners(), 3);

        h.joined("general").await;

        assert_eq!(h.session.channel_names(), vec![ChannelName::from("general")]);
        assert!(!h.indicator.is_active(LoadingKey::ChannelJoin));
    }

    #[tokio::test]
    async fn test_retry_stops_transport_after_failure() {
        let mut h = Harness::online();
        h.transport.fail_stop(true);
        assert!(h.session.stop().await.is_err());

        h.transport.fail_stop(false);
        h.session.stop().await.unwrap();

        assert_eq!(h.transport.stop_calls(), 2);
        assert_eq!(h.log.stop_calls(), 1);
        assert_eq!(h.session.state(), NetworkState::Offline);

        // Completed, so a further call is a no-op again.
        h.session.stop().await.unwrap();
        assert_eq!(h.transport.stop_calls(), 2);
    }

    #[tokio::test]
    async fn test_new_transport_supersedes_failed_stop() {
        let mut h = Harness::online();
        h.transport.fail_stop(true);
        assert!(h.session.stop().await.is_err());

        let fresh = Arc::new(MemoryTransportNode::new("node-b"));
        h.session
            .on_transport_changed(Some(fresh.clone() as SharedTransport));
        h.session.stop().await.unwrap();

        assert_eq!(fresh.stop_calls(), 0);
    }

    #[tokio::test]
    async fn test_republishing_same_log_session_keeps_channels() {
        let mut h = Harness::online();
        h.joined("general").await;
        let generation = h.session.bridge().unwrap().generation();

        h.session
            .on_log_session_changed(Some(h.log.clone() as SharedLogSession));

        assert!(h.session.has_channel("general"));
        assert!(!h.log.channel_log("general").unwrap().is_closed());
        assert_eq!(h.session.bridge().unwrap().generation(), generation);
        assert_eq!(h.log.events().total_listeners(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_shutdown_times_out() {
        let mut h = Harness::online();
        h.log.hang_stop();

        let err = h.session.stop().await.unwrap_err();

        assert!(matches!(err, NetworkError::Timeout(_)));
        assert_eq!(h.transport.stop_calls(), 0);
    }

    #[tokio::test]
    async fn test_unbounded_shutdown_config() {
        let config = NetworkConfig::default().without_shutdown_timeout();
        assert!(config.shutdown_timeout.is_none());
        let config = config.with_shutdown_timeout(Duration::from_millis(5));
        assert_eq!(config.shutdown_timeout, Some(Duration::from_millis(5)));
    }

    #[tokio::test]
    async fn test_identity_change_stops_network() {
        let mut h = Harness::online();
        h.session.on_identity_changed(Some("alice".into())).await.unwrap();
        h.bring_online();
        h.joined("general").await;
        h.log.announce_peers(vec!["p".into()]);
        h.session.process_pending();

        h.session.on_identity_changed(Some("bob".into())).await.unwrap();

        assert!(h.session.channel_names().is_empty());
        assert!(h.session.peers().is_empty());
        assert!(!h.session.is_online());
        assert_eq!(h.session.username().map(Username::as_str), Some("bob"));
    }

    #[tokio::test]
    async fn test_same_identity_keeps_network() {
        let mut h = Harness::offline();
        h.session.on_identity_changed(Some("alice".into())).await.unwrap();
        h.bring_online();

        h.session.on_identity_changed(Some("alice".into())).await.unwrap();

        assert!(h.session.is_online());
        assert_eq!(h.log.stop_calls(), 0);
    }

    #[tokio::test]
    async fn test_identity_recorded_even_if_stop_fails() {
        let mut h = Harness::online();
        h.log.fail_stop(true);

        assert!(h.session.on_identity_changed(Some("carol".into())).await.is_err());
        assert_eq!(h.session.username().map(Username::as_str), Some("carol"));
        assert!(h.session.channel_names().is_empty());
    }

    #[tokio::test]
    async fn test_failed_join_leaves_indicator_raised() {
        let mut h = Harness::online();
        h.log.fail_join(true);

        let err = h.session.join_channel(&"general".into()).await.unwrap_err();

        assert!(matches!(err, NetworkError::Collaborator(_)));
        assert!(h.indicator.is_active(LoadingKey::ChannelJoin));
        assert!(!h.session.is_join_pending("general"));

        // A retry issues a fresh request.
        h.log.fail_join(false);
        h.session.join_channel(&"general".into()).await.unwrap();
        assert_eq!(h.log.join_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_leave_leaves_indicator_raised() {
        let mut h = Harness::online();
        h.joined("general").await;
        h.log.fail_leave(true);

        assert!(h.session.leave_channel(&"general".into()).await.is_err());
        assert!(h.indicator.is_active(LoadingKey::ChannelLeave));
        assert!(h.session.has_channel("general"));
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let mut h = Harness::online();
        h.session.on_identity_changed(Some("alice".into())).await.unwrap();
        h.bring_online();
        h.joined("b-chan").await;
        h.joined("a-chan").await;

        let status = h.session.status();

        assert_eq!(status.state, NetworkState::FullyOnline);
        assert!(status.online);
        assert_eq!(
            status.channels,
            vec![ChannelName::from("a-chan"), ChannelName::from("b-chan")]
        );
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "fully_online");
        assert_eq!(json["username"], "alice");
    }

    proptest! {
        #[test]
        fn prop_joined_events_keep_one_entry_per_name(names in prop::collection::vec("[a-d]", 0..24)) {
            let mut h = Harness::online();
            for name in &names {
                h.log.announce_joined(name.as_str());
            }
            h.session.process_pending();

            let distinct: HashSet<&str> = names.iter().map(String::as_str).collect();
            prop_assert_eq!(h.session.channels().count(), distinct.len());
            prop_assert_eq!(h.indicator.stops(LoadingKey::ChannelJoin), names.len());
        }
    }
}
