//! Wire codec for message bodies.
//!
//! Bodies travel through the relay as text in two stages:
//!
//! 1. Deterministic binary serialization (bincode, fixed-width little-endian
//!    integers, field order fixed by the struct declarations below).
//! 2. Base64 (standard alphabet, no line wrapping).
//!
//! The same binary encoding feeds the MAC, so sender and verifier hash
//! byte-identical input for the same logical message.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{DeviceId, Kid, MerkleTriple, SigningPublicKey};

use crate::domain::ids::StrongId;
use crate::error::{DecodeError, EncodeError};

/// Upper bound on a binary body. Adversarial length prefixes beyond this are
/// rejected before any allocation.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

fn binary_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_BODY_BYTES)
        .reject_trailing_bytes()
}

/// Canonical binary encoding shared by the codec and the MAC.
pub(crate) fn to_binary<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    binary_options()
        .serialize(value)
        .map_err(|e| EncodeError(e.to_string()))
}

fn from_binary<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    binary_options()
        .deserialize(bytes)
        .map_err(|e| DecodeError::Payload(e.to_string()))
}

/// Flat argument layout carried on the wire.
///
/// Holds the union of every kind's fields; a kind leaves the fields it does
/// not use at their zero value. Application code works with
/// [`Args`](crate::domain::Args) instead.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireArgs {
    pub strong_id: StrongId,
    pub device_id: DeviceId,
    pub dev_key_id: Kid,
    pub signing_key: SigningPublicKey,
    pub sig: String,
    pub dev_type: String,
    pub dev_desc: String,
    pub merkle_triple: MerkleTriple,
}

/// A message body exactly as it is encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireBody {
    /// Message kind tag (`startkex`, `hello`, ...).
    pub name: String,
    pub args: WireArgs,
    /// Authentication tag; empty while the tag is being computed.
    pub mac: Vec<u8>,
}

impl WireBody {
    /// Encodes the body to its text wire form.
    pub fn encode(&self) -> Result<String, EncodeError> {
        let bytes = to_binary(self)?;
        Ok(STANDARD.encode(bytes))
    }

    /// Decodes a body from its text wire form.
    ///
    /// Fails on malformed base64, truncated or oversized payloads, and
    /// trailing bytes. No partial body is ever returned.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| DecodeError::Base64(e.to_string()))?;
        from_binary(&bytes)
    }
}
