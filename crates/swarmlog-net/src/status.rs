//! Read-only snapshot of the coordinator for the presentation layer.

use serde::{Deserialize, Serialize};
use swarmlog_core::{ChannelName, NetworkState, PeerId, Username};

/// Point-in-time view of a network session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStatus {
    /// Derived connectivity state.
    pub state: NetworkState,
    /// True iff both transport node and log session are bound.
    pub online: bool,
    /// Last observed identity.
    pub username: Option<Username>,
    /// Joined channels, sorted by name.
    pub channels: Vec<ChannelName>,
    /// Current swarm peers, in the order the log session reported them.
    pub peers: Vec<PeerId>,
}
