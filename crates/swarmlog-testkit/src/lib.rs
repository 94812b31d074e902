//! # Swarmlog Testkit
//!
//! Testing utilities for the swarmlog network session layer.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a coordinator wired to in-memory collaborators, driven
//!   directly ([`TestNetwork`]) or as a spawned task ([`TestDriver`])
//! - **Generators**: proptest strategies for channel names, peers and log
//!   event sequences, plus a reference model of the expected registry
//!
//! ## Test Fixtures
//!
//! ```rust
//! use swarmlog_testkit::TestNetwork;
//!
//! let mut net = TestNetwork::online();
//! net.log.announce_joined("general");
//! net.session.process_pending();
//! assert!(net.session.has_channel("general"));
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use swarmlog_testkit::generators::{channel_events, expected_registry};
//!
//! proptest! {
//!     #[test]
//!     fn registry_matches_model(events in channel_events(20)) {
//!         // deliver events, compare with expected_registry(&events)
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{TestDriver, TestNetwork};
pub use generators::{
    channel_events, channel_name, expected_peers, expected_registry, log_event, peer_id, peer_set,
    pooled_name, requests, Request,
};
