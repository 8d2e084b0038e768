//! The `transport` module carries the protocol over UDP.
//!
//! `udp` is the gateway's listener: it owns the socket, runs the receive
//! loop and writes replies. `client` is a small client used for smoke tests.

pub mod client;
pub mod udp;

pub use client::GatewayClient;
pub use udp::Server;

#[cfg(test)]
mod tests;
