//! # Swarmlog Core
//!
//! Pure types and collaborator interfaces for the swarmlog network session layer.
//!
//! This crate contains no coordination logic. It defines the identifiers the
//! coordinator works with, the event vocabulary of a log session, the
//! subscribe/unsubscribe machinery for those events, and the traits that the
//! external transport and distributed-log subsystems implement.
//!
//! ## Key Types
//!
//! - [`ChannelName`] - Unique key of a joined channel
//! - [`PeerId`] - Identifier of a swarm peer
//! - [`LogEvent`] - `joined` / `left` / `peers` notifications from a log session
//! - [`EventEmitter`] - Listener registry owned by a log session
//! - [`Subscription`] - RAII handle; dropping it detaches the listener
//! - [`TransportNode`], [`LogSession`], [`ChannelLog`], [`LoadingIndicator`] - collaborator traits
//!
//! ## In-memory collaborators
//!
//! The [`memory`] module provides in-process implementations of every
//! collaborator trait, used by tests and local simulations.

pub mod error;
pub mod events;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use events::{EventEmitter, LogEvent, LogEventKind, Subscription};
pub use memory::{
    IndicatorCall, MemoryChannelLog, MemoryLogSession, MemoryTransportNode, RecordingIndicator,
};
pub use traits::{
    ChannelDescriptor, ChannelLog, LoadingIndicator, LogSession, NoopIndicator, SharedLogSession,
    SharedTransport, TransportNode,
};
pub use types::{ChannelName, LoadingKey, NetworkState, NodeId, PeerId, SessionId, Username};
