//! # snbroker
//!
//! `snbroker` is a gateway for a compact, UDP-carried publish/subscribe
//! protocol aimed at constrained sensor-network clients. Topics travel as
//! 16-bit ids instead of names; the gateway hands the ids out, keeps track of
//! who registered what and forwards publishes to everyone registered on the
//! same topic.
//!
//! ## Core Modules
//!
//! - `protocol`: the binary packet codec (framing, flags, every message type).
//! - `broker`: the topic registry, the protocol dispatcher and the advertiser.
//! - `client`: per-client records and the client registry.
//! - `transport`: the UDP listener and a small client for smoke tests.
//! - `persistence`: client sessions, in memory or in `sled`.
//! - `config`: loading and defaulting the configuration.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod persistence;
pub mod protocol;
pub mod transport;
pub mod utils;
