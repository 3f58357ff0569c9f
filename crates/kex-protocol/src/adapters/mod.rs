//! # Adapters
//!
//! Concrete implementations of the driven ports:
//!
//! - `http` - hosted relay over HTTP (reqwest)
//! - `memory` - in-process relay with long-poll semantics
//! - `clock` - system and test clocks

pub mod clock;
pub mod http;
pub mod memory;

pub use clock::{ControllableTimeSource, SystemTimeSource};
pub use http::HttpRelayClient;
pub use memory::InMemoryRelay;
