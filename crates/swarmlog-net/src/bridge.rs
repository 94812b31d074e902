//! Event bridge: the coordinator's subscription to one log session.
//!
//! All three listeners (`joined`, `left`, `peers`) are attached together in
//! [`EventBridge::attach`] and detached together when the bridge is dropped.
//! Listeners do not touch coordinator state. They forward each event, tagged
//! with the bridge generation, into the coordinator's mailbox, where it is
//! applied on the coordinator's own turn.

use swarmlog_core::{LogEvent, LogEventKind, LogSession, SessionId, Subscription};
use tokio::sync::mpsc;

/// An event forwarded from a log session into the coordinator mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgedEvent {
    /// Generation of the bridge that forwarded the event.
    pub generation: u64,
    pub event: LogEvent,
}

/// The three listeners the coordinator holds on its current log session.
#[derive(Debug)]
pub struct EventBridge {
    session: SessionId,
    generation: u64,
    joined: Subscription,
    left: Subscription,
    peers: Subscription,
}

impl EventBridge {
    /// Subscribe all three listeners on `session`.
    pub fn attach(
        session: &dyn LogSession,
        generation: u64,
        mailbox: &mpsc::UnboundedSender<BridgedEvent>,
    ) -> Self {
        let forward = |kind: LogEventKind| {
            let mailbox = mailbox.clone();
            session.events().subscribe(kind, move |event: &LogEvent| {
                let bridged = BridgedEvent {
                    generation,
                    event: event.clone(),
                };
                if mailbox.send(bridged).is_err() {
                    tracing::trace!(generation, "mailbox closed, event dropped");
                }
            })
        };

        let bridge = Self {
            session: session.id(),
            generation,
            joined: forward(LogEventKind::Joined),
            left: forward(LogEventKind::Left),
            peers: forward(LogEventKind::Peers),
        };
        tracing::debug!(session = %bridge.session, generation, "event bridge attached");
        bridge
    }

    /// The session this bridge listens to.
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether all three listeners are still registered.
    pub fn is_attached(&self) -> bool {
        self.joined.is_attached() && self.left.is_attached() && self.peers.is_attached()
    }

    /// Unsubscribe all three listeners.
    pub fn detach(self) {
        tracing::debug!(session = %self.session, generation = self.generation, "event bridge detached");
    }
}
