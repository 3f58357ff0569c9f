//! # Kex Service
//!
//! Wires the domain to the ports: `Sender` posts authenticated messages,
//! `Receiver` long-polls and dispatches them, and `KexSession` ties both to
//! one pairing attempt with a timeout.

mod receiver;
mod sender;
mod session;

pub use receiver::{import, Receiver, DEFAULT_POLL_DURATION};
pub use sender::Sender;
pub use session::{KexSession, SessionStatus, DEFAULT_SESSION_TIMEOUT};
