//! Strong type definitions for the network session layer.
//!
//! All identifiers are string newtypes so a channel name can never be passed
//! where a peer id is expected.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a string.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the underlying string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Name of a distributed log channel. Unique key of the channel registry.
    ChannelName
);

string_id!(
    /// Identifier of a peer in the swarm, as reported by the log session.
    PeerId
);

string_id!(
    /// Identity of the local user.
    Username
);

string_id!(
    /// Identifier of a transport node.
    NodeId
);

string_id!(
    /// Identifier of a log session instance.
    SessionId
);

/// Keys understood by the loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadingKey {
    /// A channel join request is in flight.
    #[serde(rename = "channel:join")]
    ChannelJoin,
    /// A channel leave request is in flight.
    #[serde(rename = "channel:leave")]
    ChannelLeave,
}

impl LoadingKey {
    /// The operation tag shown to the presentation layer.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LoadingKey::ChannelJoin => "channel:join",
            LoadingKey::ChannelLeave => "channel:leave",
        }
    }
}

impl fmt::Display for LoadingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connectivity state of the coordinator.
///
/// Never stored. Always derived from which handles are currently bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    /// No transport node bound. A bound log session alone is still offline.
    Offline,
    /// Transport node bound, no log session.
    TransportOnly,
    /// Both transport node and log session bound.
    FullyOnline,
}

impl NetworkState {
    /// Derive the state from which handles are present.
    pub const fn derive(has_transport: bool, has_log_session: bool) -> Self {
        match (has_transport, has_log_session) {
            (true, true) => NetworkState::FullyOnline,
            (true, false) => NetworkState::TransportOnly,
            (false, _) => NetworkState::Offline,
        }
    }

    /// Online iff both handles are bound.
    pub const fn is_online(&self) -> bool {
        matches!(self, NetworkState::FullyOnline)
    }
}
