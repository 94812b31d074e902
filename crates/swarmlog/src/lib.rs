//! # Swarmlog
//!
//! Network session coordination for a peer-to-peer channel log.
//!
//! ## Overview
//!
//! Swarmlog keeps track of whether a client is online, which channels it
//! has joined, and who its swarm peers are. It sits between:
//!
//! - **Transport node**: the peer-to-peer connectivity layer
//! - **Log session**: the distributed-log layer that owns channel membership
//! - **Identity**: the current user; a change stops the whole network
//! - **Loading indicator**: busy flags for pending join and leave requests
//!
//! ## Key Concepts
//!
//! - **Event-driven registry**: channels appear and disappear only when the
//!   log session reports `joined` and `left`
//! - **Derived online state**: online means both a transport node and a log
//!   session are bound
//! - **Ordered shutdown**: channel logs, then the log session, then the
//!   transport node
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swarmlog::{Network, NetworkConfig, NoopIndicator};
//!
//! async fn example() -> swarmlog::Result<()> {
//!     let network = Network::start(NetworkConfig::default(), Arc::new(NoopIndicator));
//!
//!     // network.bind_transport(Some(node));
//!     // network.bind_log_session(Some(log));
//!     network.join("general").await?;
//!
//!     let status = network.status().await?;
//!     println!("online: {}, channels: {:?}", status.online, status.channels);
//!
//!     network.shutdown().await
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `swarmlog::core` - Identifiers, events and collaborator traits
//! - `swarmlog::net` - The coordinator, its driver and command handle

pub mod error;
pub mod network;

// Re-export component crates
pub use swarmlog_core as core;
pub use swarmlog_net as net;

// Re-export main types for convenience
pub use error::{Result, SwarmlogError};
pub use network::Network;

pub use swarmlog_net::{
    ChannelSession, NetworkConfig, NetworkError, NetworkHandle, NetworkSession, NetworkStatus,
};

// Re-export commonly used core types
pub use swarmlog_core::{
    ChannelDescriptor, ChannelLog, ChannelName, LoadingIndicator, LoadingKey, LogEvent,
    LogSession, NetworkState, NoopIndicator, PeerId, TransportNode, Username,
};
