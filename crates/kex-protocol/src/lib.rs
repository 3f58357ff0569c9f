//! # Kex Device-Pairing Protocol
//!
//! Two devices controlled by the same identity exchange authenticated
//! control messages through an untrusted store-and-forward relay to bring a
//! new device into trust.
//!
//! The relay only ever sees the public `WeakId` session handle and opaque
//! base64 bodies. Every body carries an HMAC-SHA256 tag keyed by the
//! out-of-band `StrongId`, and the receiver drops the whole batch if any
//! message fails to authenticate.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** ids, message model, codec (bincode + base64), MAC and
//!   pairing states
//! - **Ports Layer:** `Handler` (driving), `RelayClient` and `TimeSource`
//!   (driven)
//! - **Service Layer:** `Sender`, `Receiver` and the per-attempt `KexSession`
//! - **Adapters Layer:** HTTP relay client, in-memory relay, clocks
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kex_protocol::{
//!     Context, Direction, HttpRelayClient, KexConfig, SessionSecret, Sender,
//! };
//! use shared_types::{DeviceId, Uid};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = KexConfig::from_env()?;
//! let relay = Arc::new(HttpRelayClient::new(&config.relay));
//!
//! let secret = SessionSecret::generate();
//! let ctx = Context::new(
//!     Uid([1; 16]),
//!     DeviceId([2; 16]),
//!     DeviceId([3; 16]),
//!     secret.strong_id(),
//!     secret.weak_id(),
//!     Direction::Forward,
//! );
//!
//! Sender::new(relay).start_kex_session(&ctx, secret.strong_id()).await?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

// =============================================================================
// INTEGRATION MODULES
// =============================================================================

pub mod adapters;
pub mod handler;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use config::{KexConfig, RelayConfig};
pub use error::{ConfigError, DecodeError, EncodeError, HandlerError, KexError, TransportError};

pub use domain::{
    Args, Body, Context, Direction, MacTag, MessageKind, Meta, Msg, PairingState, SessionSecret,
    StrongId, WeakId, WireArgs, WireBody,
};

pub use ports::{Handler, ReceiveRequest, RelayClient, RelayMessage, SendRequest, TimeSource};

pub use service::{KexSession, Receiver, Sender, SessionStatus};

pub use adapters::{ControllableTimeSource, HttpRelayClient, InMemoryRelay, SystemTimeSource};
pub use handler::OrderedHandler;
