//! Domain layer: identifiers, message model, codec, MAC and pairing states.
//!
//! Pure logic, no I/O.

pub mod codec;
pub mod ids;
pub mod mac;
pub mod message;
pub mod pairing;

pub use codec::{WireArgs, WireBody, MAX_BODY_BYTES};
pub use ids::{Direction, SessionSecret, StrongId, WeakId};
pub use mac::{compute_mac, verify_mac, MacTag, MAC_LEN};
pub use message::{Args, Body, Context, MessageKind, Meta, Msg};
pub use pairing::PairingState;
