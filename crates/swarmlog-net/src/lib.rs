//! # Swarmlog Net
//!
//! The network session coordinator: tracks the transport node and log session
//! lifecycle, reacts to their events, and keeps the registry of joined
//! channels consistent.
//!
//! ## Overview
//!
//! A [`NetworkSession`] observes three reactive sources (transport node, log
//! session, user identity). When a log session is bound it attaches an
//! [`EventBridge`] that forwards `joined`, `left` and `peers` events into the
//! session's mailbox. Those events are the only path that adds or removes
//! [`ChannelSession`]s; join and leave requests just ask the log session and
//! raise the loading indicator.
//!
//! ## Key Properties
//!
//! - **Event-driven registry**: requests never mutate the registry directly
//! - **Idempotent**: duplicate requests and duplicate events are no-ops
//! - **No listener leaks**: rebinding detaches the old bridge before attaching
//!   the new one, and events from a detached bridge are discarded
//! - **Derived state**: online/offline is computed from the bound handles,
//!   never cached
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swarmlog_core::NoopIndicator;
//! use swarmlog_net::{reactive_sources, NetworkConfig, NetworkSession};
//!
//! async fn example() {
//!     let (session, handle) = NetworkSession::new(NetworkConfig::default(), Arc::new(NoopIndicator));
//!     let (providers, sources) = reactive_sources();
//!     let task = session.spawn(sources);
//!
//!     // providers.set_transport(Some(node));
//!     // providers.set_log_session(Some(log));
//!     // handle.join("general").await?;
//!
//!     handle.shutdown().unwrap();
//!     task.await.unwrap().unwrap();
//! }
//! ```
//!
//! ## State
//!
//! ```text
//!                transport bound          log session bound
//!   Offline ─────────────────────> TransportOnly ─────────────> FullyOnline
//!      ^                                                            │
//!      └──────────────────────────── stop() ────────────────────────┘
//! ```

pub mod bridge;
pub mod channel;
pub mod config;
mod driver;
pub mod error;
pub mod handle;
pub mod session;
pub mod sources;
pub mod status;

pub use bridge::{BridgedEvent, EventBridge};
pub use channel::ChannelSession;
pub use config::NetworkConfig;
pub use error::{NetworkError, Result};
pub use handle::{Command, NetworkHandle, NetworkLink};
pub use session::NetworkSession;
pub use sources::{reactive_sources, Providers, Sources};
pub use status::NetworkStatus;
