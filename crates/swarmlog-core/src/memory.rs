//! In-memory implementations of the collaborator traits.
//!
//! These behave like the real transport and log layers from the
//! coordinator's point of view (requests, descriptor table, events, shutdown)
//! and record every call so tests can assert on them. Failures and hangs can
//! be injected per operation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::error::{CoreError, Result};
use crate::events::{EventEmitter, LogEvent};
use crate::traits::{ChannelDescriptor, ChannelLog, LoadingIndicator, LogSession, TransportNode};
use crate::types::{ChannelName, LoadingKey, NodeId, PeerId, SessionId};

/// In-memory per-channel log.
#[derive(Debug)]
pub struct MemoryChannelLog {
    address: String,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl MemoryChannelLog {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// How many times `close` has been called.
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl ChannelLog for MemoryChannelLog {
    fn address(&self) -> &str {
        &self.address
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Failure modes that can be injected into an in-memory collaborator call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Fault {
    #[default]
    None,
    Fail,
    Hang,
}

async fn apply_fault(fault: Fault, err: impl FnOnce() -> CoreError) -> Result<()> {
    match fault {
        Fault::None => Ok(()),
        Fault::Fail => Err(err()),
        Fault::Hang => std::future::pending().await,
    }
}

/// In-memory transport node.
#[derive(Debug)]
pub struct MemoryTransportNode {
    id: NodeId,
    stop_calls: AtomicUsize,
    stop_fault: Mutex<Fault>,
}

impl MemoryTransportNode {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            stop_calls: AtomicUsize::new(0),
            stop_fault: Mutex::new(Fault::None),
        }
    }

    /// Make subsequent `stop` calls fail.
    pub fn fail_stop(&self, fail: bool) {
        *self.stop_fault.lock().unwrap() = if fail { Fault::Fail } else { Fault::None };
    }

    /// Make subsequent `stop` calls never complete.
    pub fn hang_stop(&self) {
        *self.stop_fault.lock().unwrap() = Fault::Hang;
    }

    /// How many times `stop` has been called.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportNode for MemoryTransportNode {
    fn id(&self) -> NodeId {
        self.id.clone()
    }

    async fn stop(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        let fault = *self.stop_fault.lock().unwrap();
        apply_fault(fault, || CoreError::Transport("stop rejected".into())).await
    }
}

struct LogSessionInner {
    /// Channels the session considers joined.
    joined: BTreeMap<ChannelName, Arc<MemoryChannelLog>>,
    join_requests: Vec<ChannelName>,
    leave_requests: Vec<ChannelName>,
    stop_calls: usize,
    auto_emit: bool,
    join_fault: Fault,
    leave_fault: Fault,
    stop_fault: Fault,
}

/// In-memory log session.
///
/// With auto-emit enabled (the default), a successful `join` or `leave`
/// updates the joined set and emits the matching event synchronously.
/// With auto-emit disabled, requests are only recorded and tests drive
/// events explicitly.
pub struct MemoryLogSession {
    id: SessionId,
    events: EventEmitter,
    inner: RwLock<LogSessionInner>,
}

impl MemoryLogSession {
    pub fn new(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            events: EventEmitter::new(),
            inner: RwLock::new(LogSessionInner {
                joined: BTreeMap::new(),
                join_requests: Vec::new(),
                leave_requests: Vec::new(),
                stop_calls: 0,
                auto_emit: true,
                join_fault: Fault::None,
                leave_fault: Fault::None,
                stop_fault: Fault::None,
            }),
        }
    }

    /// Toggle emitting events in response to join/leave requests.
    pub fn with_auto_emit(self, auto_emit: bool) -> Self {
        self.inner.write().unwrap().auto_emit = auto_emit;
        self
    }

    /// Make subsequent `join` calls fail.
    pub fn fail_join(&self, fail: bool) {
        self.inner.write().unwrap().join_fault = if fail { Fault::Fail } else { Fault::None };
    }

    /// Make subsequent `leave` calls fail.
    pub fn fail_leave(&self, fail: bool) {
        self.inner.write().unwrap().leave_fault = if fail { Fault::Fail } else { Fault::None };
    }

    /// Make subsequent `stop` calls fail.
    pub fn fail_stop(&self, fail: bool) {
        self.inner.write().unwrap().stop_fault = if fail { Fault::Fail } else { Fault::None };
    }

    /// Make subsequent `stop` calls never complete.
    pub fn hang_stop(&self) {
        self.inner.write().unwrap().stop_fault = Fault::Hang;
    }

    /// Mark a channel joined without emitting anything.
    pub fn insert_joined(&self, name: impl Into<ChannelName>) -> Arc<MemoryChannelLog> {
        let name = name.into();
        let log = Arc::new(MemoryChannelLog::new(format!("/log/{}/{}", self.id, name)));
        self.inner
            .write()
            .unwrap()
            .joined
            .insert(name, Arc::clone(&log));
        log
    }

    /// Mark a channel joined and emit `joined`.
    pub fn announce_joined(&self, name: impl Into<ChannelName>) -> Arc<MemoryChannelLog> {
        let name = name.into();
        let log = self.insert_joined(name.clone());
        self.events.emit(&LogEvent::Joined(name));
        log
    }

    /// Mark a channel left and emit `left`.
    pub fn announce_left(&self, name: impl Into<ChannelName>) {
        let name = name.into();
        self.inner.write().unwrap().joined.remove(&name);
        self.events.emit(&LogEvent::Left(name));
    }

    /// Emit a `peers` event.
    pub fn announce_peers(&self, peers: Vec<PeerId>) {
        self.events.emit(&LogEvent::Peers(peers));
    }

    /// The log backing a joined channel.
    pub fn channel_log(&self, name: &str) -> Option<Arc<MemoryChannelLog>> {
        self.inner.read().unwrap().joined.get(name).cloned()
    }

    /// Names the session currently considers joined.
    pub fn joined(&self) -> Vec<ChannelName> {
        self.inner.read().unwrap().joined.keys().cloned().collect()
    }

    pub fn join_requests(&self) -> Vec<ChannelName> {
        self.inner.read().unwrap().join_requests.clone()
    }

    pub fn leave_requests(&self) -> Vec<ChannelName> {
        self.inner.read().unwrap().leave_requests.clone()
    }

    pub fn stop_calls(&self) -> usize {
        self.inner.read().unwrap().stop_calls
    }
}

#[async_trait]
impl LogSession for MemoryLogSession {
    fn id(&self) -> SessionId {
        self.id.clone()
    }

    async fn join(&self, channel: &ChannelName) -> Result<()> {
        let (fault, auto_emit) = {
            let mut inner = self.inner.write().unwrap();
            inner.join_requests.push(channel.clone());
            (inner.join_fault, inner.auto_emit)
        };
        apply_fault(fault, || {
            CoreError::LogSession(format!("join {} rejected", channel))
        })
        .await?;

        if auto_emit {
            self.announce_joined(channel.clone());
        }
        Ok(())
    }

    async fn leave(&self, channel: &ChannelName) -> Result<()> {
        let (fault, auto_emit) = {
            let mut inner = self.inner.write().unwrap();
            inner.leave_requests.push(channel.clone());
            (inner.leave_fault, inner.auto_emit)
        };
        apply_fault(fault, || {
            CoreError::LogSession(format!("leave {} rejected", channel))
        })
        .await?;

        if auto_emit {
            self.announce_left(channel.clone());
        }
        Ok(())
    }

    fn channel(&self, name: &ChannelName) -> Option<ChannelDescriptor> {
        let log = self.channel_log(name.as_str())?;
        Some(
            ChannelDescriptor::new(name.clone(), log as Arc<dyn ChannelLog>)
                .with_metadata("session", self.id.as_str()),
        )
    }

    fn events(&self) -> &EventEmitter {
        &self.events
    }

    async fn stop(&self) -> Result<()> {
        let fault = {
            let mut inner = self.inner.write().unwrap();
            inner.stop_calls += 1;
            inner.stop_fault
        };
        apply_fault(fault, || CoreError::LogSession("stop rejected".into())).await
    }
}

/// A call made on a [`RecordingIndicator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorCall {
    Start(LoadingKey),
    Stop(LoadingKey),
}

/// Loading indicator that records every call.
#[derive(Debug, Default)]
pub struct RecordingIndicator {
    calls: Mutex<Vec<IndicatorCall>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call in order.
    pub fn calls(&self) -> Vec<IndicatorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of `start` calls for a key.
    pub fn starts(&self, key: LoadingKey) -> usize {
        self.count(IndicatorCall::Start(key))
    }

    /// Number of `stop` calls for a key.
    pub fn stops(&self, key: LoadingKey) -> usize {
        self.count(IndicatorCall::Stop(key))
    }

    /// Whether the most recent call for `key` was a `start`.
    pub fn is_active(&self, key: LoadingKey) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|call| match call {
                IndicatorCall::Start(k) if *k == key => Some(true),
                IndicatorCall::Stop(k) if *k == key => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn count(&self, wanted: IndicatorCall) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == wanted)
            .count()
    }
}

impl LoadingIndicator for RecordingIndicator {
    fn start(&self, key: LoadingKey) {
        self.calls.lock().unwrap().push(IndicatorCall::Start(key));
    }

    fn stop(&self, key: LoadingKey) {
        self.calls.lock().unwrap().push(IndicatorCall::Stop(key));
    }
}
