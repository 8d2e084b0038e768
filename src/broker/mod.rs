//! The gateway core: topic ids, the protocol dispatcher and the advertiser.

pub mod advertiser;
pub mod engine;
pub mod topic;

pub use advertiser::Advertiser;
pub use engine::{Broker, Outbound};
pub use topic::TopicRegistry;
