//! Reactive sources observed by the coordinator.
//!
//! The transport node, the log session and the user identity are each
//! published on a `tokio::sync::watch` channel. The providers own the
//! senders; the coordinator task owns the receivers and reacts to every
//! published value.

use swarmlog_core::{SharedLogSession, SharedTransport, Username};
use tokio::sync::watch;

/// Publishing side of the three reactive sources.
#[derive(Debug)]
pub struct Providers {
    pub transport: watch::Sender<Option<SharedTransport>>,
    pub log_session: watch::Sender<Option<SharedLogSession>>,
    pub identity: watch::Sender<Option<Username>>,
}

/// Observing side of the three reactive sources.
#[derive(Debug, Clone)]
pub struct Sources {
    pub transport: watch::Receiver<Option<SharedTransport>>,
    pub log_session: watch::Receiver<Option<SharedLogSession>>,
    pub identity: watch::Receiver<Option<Username>>,
}

/// Create a connected provider/source pair, all three sources starting empty.
pub fn reactive_sources() -> (Providers, Sources) {
    let (transport_tx, transport_rx) = watch::channel(None);
    let (log_tx, log_rx) = watch::channel(None);
    let (identity_tx, identity_rx) = watch::channel(None);
    (
        Providers {
            transport: transport_tx,
            log_session: log_tx,
            identity: identity_tx,
        },
        Sources {
            transport: transport_rx,
            log_session: log_rx,
            identity: identity_rx,
        },
    )
}

impl Providers {
    /// Publish a new transport node (or its absence).
    pub fn set_transport(&self, node: Option<SharedTransport>) {
        self.transport.send_replace(node);
    }

    /// Publish a new log session (or its absence).
    pub fn set_log_session(&self, session: Option<SharedLogSession>) {
        self.log_session.send_replace(session);
    }

    /// Publish the current user identity.
    pub fn set_identity(&self, username: Option<Username>) {
        self.identity.send_replace(username);
    }
}
