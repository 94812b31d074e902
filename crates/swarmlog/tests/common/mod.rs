//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use swarmlog::core::{
    ChannelDescriptor, ChannelLog, ChannelName, EventEmitter, LogSession, MemoryLogSession,
    MemoryTransportNode, NodeId, Result, SessionId, TransportNode,
};

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Ordered record of collaborator shutdown calls.
#[derive(Debug, Default)]
pub struct Journal(Mutex<Vec<String>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A channel log that records `close` in a journal.
pub struct JournaledChannelLog {
    name: ChannelName,
    inner: Arc<dyn ChannelLog>,
    journal: Arc<Journal>,
}

impl ChannelLog for JournaledChannelLog {
    fn address(&self) -> &str {
        self.inner.address()
    }

    fn close(&self) {
        self.journal.record(format!("close {}", self.name));
        self.inner.close();
    }
}

/// A log session that records `stop`, and wraps its channel logs.
pub struct JournaledLogSession {
    pub inner: MemoryLogSession,
    journal: Arc<Journal>,
}

impl JournaledLogSession {
    pub fn new(id: &str, journal: Arc<Journal>) -> Self {
        Self {
            inner: MemoryLogSession::new(id),
            journal,
        }
    }
}

#[async_trait]
impl LogSession for JournaledLogSession {
    fn id(&self) -> SessionId {
        self.inner.id()
    }

    async fn join(&self, channel: &ChannelName) -> Result<()> {
        self.inner.join(channel).await
    }

    async fn leave(&self, channel: &ChannelName) -> Result<()> {
        self.inner.leave(channel).await
    }

    fn channel(&self, name: &ChannelName) -> Option<ChannelDescriptor> {
        let descriptor = self.inner.channel(name)?;
        let log = JournaledChannelLog {
            name: descriptor.name.clone(),
            inner: descriptor.log,
            journal: Arc::clone(&self.journal),
        };
        Some(ChannelDescriptor {
            log: Arc::new(log),
            ..descriptor
        })
    }

    fn events(&self) -> &EventEmitter {
        self.inner.events()
    }

    async fn stop(&self) -> Result<()> {
        self.journal.record("stop log session");
        self.inner.stop().await
    }
}

/// A transport node that records `stop`.
pub struct JournaledTransport {
    pub inner: MemoryTransportNode,
    journal: Arc<Journal>,
}

impl JournaledTransport {
    pub fn new(id: &str, journal: Arc<Journal>) -> Self {
        Self {
            inner: MemoryTransportNode::new(id),
            journal,
        }
    }
}

#[async_trait]
impl TransportNode for JournaledTransport {
    fn id(&self) -> NodeId {
        self.inner.id()
    }

    async fn stop(&self) -> Result<()> {
        self.journal.record("stop transport");
        self.inner.stop().await
    }
}
