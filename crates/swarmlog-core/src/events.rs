//! Log session events and the listener registry that delivers them.
//!
//! A log session owns one [`EventEmitter`]. Listeners are attached with
//! [`EventEmitter::subscribe`], which returns a [`Subscription`]. The
//! listener stays attached exactly as long as the subscription lives:
//! dropping it (or calling [`Subscription::dispose`]) detaches it.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::types::{ChannelName, PeerId};

/// Notification emitted by a log session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// The session finished joining a channel.
    Joined(ChannelName),
    /// The session left a channel.
    Left(ChannelName),
    /// The full set of swarm peers changed.
    Peers(Vec<PeerId>),
}

impl LogEvent {
    /// The kind listeners subscribe to for this event.
    pub fn kind(&self) -> LogEventKind {
        match self {
            LogEvent::Joined(_) => LogEventKind::Joined,
            LogEvent::Left(_) => LogEventKind::Left,
            LogEvent::Peers(_) => LogEventKind::Peers,
        }
    }
}

/// The three event names a log session emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEventKind {
    Joined,
    Left,
    Peers,
}

impl LogEventKind {
    /// Every kind, in subscription order.
    pub const ALL: [LogEventKind; 3] = [LogEventKind::Joined, LogEventKind::Left, LogEventKind::Peers];

    /// Event name as emitted by the log session.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogEventKind::Joined => "joined",
            LogEventKind::Left => "left",
            LogEventKind::Peers => "peers",
        }
    }
}

impl fmt::Display for LogEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Listener = Arc<dyn Fn(&LogEvent) + Send + Sync>;

#[derive(Default)]
struct EmitterInner {
    next_id: u64,
    listeners: Vec<(u64, LogEventKind, Listener)>,
}

/// Listener registry owned by a log session.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone, Default)]
pub struct EventEmitter {
    inner: Arc<RwLock<EmitterInner>>,
}

impl EventEmitter {
    /// Create an emitter with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener for one event kind.
    pub fn subscribe<F>(&self, kind: LogEventKind, listener: F) -> Subscription
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        let mut inner = write(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, kind, Arc::new(listener)));

        tracing::trace!(kind = %kind, id, "listener attached");

        Subscription {
            id,
            kind,
            emitter: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every listener of its kind.
    ///
    /// Listeners run after the registry lock is released, so a listener may
    /// subscribe or unsubscribe without deadlocking. Returns the number of
    /// listeners invoked.
    pub fn emit(&self, event: &LogEvent) -> usize {
        let kind = event.kind();
        let targets: Vec<Listener> = read(&self.inner)
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, l)| Arc::clone(l))
            .collect();

        for listener in &targets {
            listener(event);
        }
        targets.len()
    }

    /// Number of listeners attached for a kind.
    pub fn listener_count(&self, kind: LogEventKind) -> usize {
        read(&self.inner)
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Number of listeners attached across all kinds.
    pub fn total_listeners(&self) -> usize {
        read(&self.inner).listeners.len()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

/// Handle to an attached listener.
///
/// The listener is detached when this handle is dropped.
#[must_use = "dropping a Subscription detaches its listener immediately"]
pub struct Subscription {
    id: u64,
    kind: LogEventKind,
    emitter: Weak<RwLock<EmitterInner>>,
}

impl Subscription {
    /// The event kind this listener receives.
    pub fn kind(&self) -> LogEventKind {
        self.kind
    }

    /// Whether the listener is still registered on a live emitter.
    pub fn is_attached(&self) -> bool {
        self.emitter
            .upgrade()
            .map(|inner| read(&inner).listeners.iter().any(|(id, _, _)| *id == self.id))
            .unwrap_or(false)
    }

    /// Detach the listener now.
    pub fn dispose(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.emitter.upgrade() {
            write(&inner).listeners.retain(|(id, _, _)| *id != self.id);
            tracing::trace!(kind = %self.kind, id = self.id, "listener detached");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

// A panicking listener must not wedge the registry, so poisoned locks are
// recovered rather than propagated.
fn read(lock: &RwLock<EmitterInner>) -> RwLockReadGuard<'_, EmitterInner> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(lock: &RwLock<EmitterInner>) -> RwLockWriteGuard<'_, EmitterInner> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
