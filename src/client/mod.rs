//! The `client` module holds the gateway's view of its clients.
//!
//! A [`Client`] is created by a valid CONNECT and is keyed by the source
//! `address:port` of its datagrams, since that is the only identity available
//! for every packet other than CONNECT. The [`ClientRegistry`] owns all client
//! records; callers borrow them for the duration of one dispatch.

pub mod pubsub_client;
pub mod registry;

pub use pubsub_client::Client;
pub use registry::ClientRegistry;
