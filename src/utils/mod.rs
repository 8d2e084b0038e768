//! The `utils` module collects the pieces every other module leans on:
//! the crate's error types and the `tracing` subscriber setup.

pub mod error;
pub mod logging;

pub use error::{BrokerError, ValidationError};
