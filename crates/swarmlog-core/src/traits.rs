//! Collaborator traits: the interface the coordinator requires from the
//! transport node, the log session, per-channel logs and the loading
//! indicator.
//!
//! The coordinator never mutates collaborator internals. It only calls the
//! operations below.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::events::EventEmitter;
use crate::types::{ChannelName, LoadingKey, NodeId, SessionId};

/// Shared handle to a transport node.
pub type SharedTransport = Arc<dyn TransportNode>;

/// Shared handle to a log session.
pub type SharedLogSession = Arc<dyn LogSession>;

/// Opaque handle to the peer-to-peer connectivity layer.
#[async_trait]
pub trait TransportNode: Send + Sync {
    /// Identity of this node.
    fn id(&self) -> NodeId;

    /// Shut the node down.
    async fn stop(&self) -> Result<()>;
}

impl fmt::Debug for dyn TransportNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransportNode({})", self.id())
    }
}

/// Opaque handle to the distributed-log layer that owns channel membership.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait LogSession: Send + Sync {
    /// Identity of this session instance.
    fn id(&self) -> SessionId;

    /// Request to join a channel.
    ///
    /// Completion is reported later through a `joined` event.
    async fn join(&self, channel: &ChannelName) -> Result<()>;

    /// Request to leave a channel.
    ///
    /// Completion is reported later through a `left` event.
    async fn leave(&self, channel: &ChannelName) -> Result<()>;

    /// Look up the descriptor of a channel the session considers joined.
    fn channel(&self, name: &ChannelName) -> Option<ChannelDescriptor>;

    /// The emitter for `joined`, `left` and `peers` events.
    fn events(&self) -> &EventEmitter;

    /// Shut the session down.
    async fn stop(&self) -> Result<()>;
}

impl fmt::Debug for dyn LogSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogSession({})", self.id())
    }
}

/// The external per-channel log.
pub trait ChannelLog: Send + Sync {
    /// Address of the underlying log.
    fn address(&self) -> &str;

    /// Tear down replication for this channel. Must not be used afterwards.
    fn close(&self);
}

/// Descriptor of a joined channel, as exposed by the log session.
#[derive(Clone)]
pub struct ChannelDescriptor {
    /// Channel name.
    pub name: ChannelName,
    /// The channel's log.
    pub log: Arc<dyn ChannelLog>,
    /// Extra fields supplied by the log session.
    pub metadata: BTreeMap<String, String>,
}

impl ChannelDescriptor {
    /// Descriptor with no metadata.
    pub fn new(name: ChannelName, log: Arc<dyn ChannelLog>) -> Self {
        Self {
            name,
            log,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDescriptor")
            .field("name", &self.name)
            .field("address", &self.log.address())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Keyed busy flag surfaced to the presentation layer.
pub trait LoadingIndicator: Send + Sync {
    fn start(&self, key: LoadingKey);
    fn stop(&self, key: LoadingKey);
}

/// Indicator that ignores every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndicator;

impl LoadingIndicator for NoopIndicator {
    fn start(&self, _key: LoadingKey) {}
    fn stop(&self, _key: LoadingKey) {}
}
