//! Property-based test generators using proptest.
//!
//! Names are drawn from a small pool so that generated sequences hit
//! duplicates and join/leave interleavings on the same channel.

use std::collections::BTreeSet;

use proptest::prelude::*;
use swarmlog_core::{ChannelName, LogEvent, PeerId};

/// Channel names used by [`channel_events`] and [`requests`].
pub const NAME_POOL: [&str; 5] = ["general", "dev", "random", "ops", "music"];

/// Strategy for an arbitrary channel name.
pub fn channel_name() -> impl Strategy<Value = ChannelName> {
    "[a-z][a-z0-9-]{0,15}".prop_map(ChannelName::from)
}

/// Strategy for a channel name from [`NAME_POOL`].
pub fn pooled_name() -> impl Strategy<Value = ChannelName> {
    prop::sample::select(NAME_POOL.to_vec()).prop_map(ChannelName::from)
}

/// Strategy for a peer identifier.
pub fn peer_id() -> impl Strategy<Value = PeerId> {
    "peer-[0-9a-f]{8}".prop_map(PeerId::from)
}

/// Strategy for a peer list of up to `max` entries.
pub fn peer_set(max: usize) -> impl Strategy<Value = Vec<PeerId>> {
    prop::collection::vec(peer_id(), 0..=max)
}

/// Strategy for a single log event over the pooled names.
pub fn log_event() -> impl Strategy<Value = LogEvent> {
    prop_oneof![
        4 => pooled_name().prop_map(LogEvent::Joined),
        3 => pooled_name().prop_map(LogEvent::Left),
        1 => peer_set(4).prop_map(LogEvent::Peers),
    ]
}

/// Strategy for a sequence of up to `max_len` log events.
pub fn channel_events(max_len: usize) -> impl Strategy<Value = Vec<LogEvent>> {
    prop::collection::vec(log_event(), 0..=max_len)
}

/// A join or leave request issued by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Join(ChannelName),
    Leave(ChannelName),
}

impl Request {
    pub fn channel(&self) -> &ChannelName {
        match self {
            Request::Join(name) | Request::Leave(name) => name,
        }
    }
}

/// Strategy for a sequence of up to `max_len` requests over the pooled names.
pub fn requests(max_len: usize) -> impl Strategy<Value = Vec<Request>> {
    let request = prop_oneof![
        pooled_name().prop_map(Request::Join),
        pooled_name().prop_map(Request::Leave),
    ];
    prop::collection::vec(request, 0..=max_len)
}

/// Channels a coordinator should hold after applying `events` in order,
/// starting from an empty registry.
pub fn expected_registry(events: &[LogEvent]) -> BTreeSet<ChannelName> {
    let mut registry = BTreeSet::new();
    for event in events {
        match event {
            LogEvent::Joined(name) => {
                registry.insert(name.clone());
            }
            LogEvent::Left(name) => {
                registry.remove(name);
            }
            LogEvent::Peers(_) => {}
        }
    }
    registry
}

/// The last peer list in `events`, or empty if none was announced.
pub fn expected_peers(events: &[LogEvent]) -> Vec<PeerId> {
    events
        .iter()
        .rev()
        .find_map(|event| match event {
            LogEvent::Peers(peers) => Some(peers.clone()),
            _ => None,
        })
        .unwrap_or_default()
}
