//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - the handler applications implement
//! - Driven Ports (outbound) - the relay transport and clock

pub mod inbound;
pub mod outbound;

pub use inbound::Handler;
pub use outbound::{ReceiveRequest, RelayClient, RelayMessage, SendRequest, TimeSource};
