//! Session identifiers.
//!
//! A pairing session is addressed by two ids:
//!
//! - `StrongId`: the secret shared out of band. It keys every message MAC.
//! - `WeakId`: the public handle the relay files messages under.
//!
//! Both can be derived one-way from a `SessionSecret`, so the weak id never
//! reveals the strong id.

use std::fmt;

use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared_types::IdError;

type HmacSha256 = Hmac<Sha256>;

/// Domain separation label for the strong id derivation.
const STRONG_ID_LABEL: &[u8] = b"kex strong id";

/// Domain separation label for the weak id derivation.
const WEAK_ID_LABEL: &[u8] = b"kex weak id";

/// HMAC-SHA256 of `data` under `key`.
pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

fn decode_hex<const N: usize>(s: &str, kind: &'static str) -> Result<[u8; N], IdError> {
    let bytes = hex::decode(s).map_err(|e| IdError::InvalidHex {
        kind,
        reason: e.to_string(),
    })?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| IdError::InvalidLength {
        kind,
        expected: N,
        actual,
    })
}

// =============================================================================
// STRONG ID
// =============================================================================

/// Secret session key shared out of band between the two pairing devices.
///
/// `Debug` is redacted; use `to_hex` only where the relay protocol requires it.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StrongId(pub [u8; 32]);

impl StrongId {
    /// Parses a strong id from 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        decode_hex(s, "strong id").map(Self)
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derives the public weak id paired with this strong id.
    pub fn weak_id(&self) -> WeakId {
        let digest = hmac_sha256(&self.0, WEAK_ID_LABEL);
        let mut id = [0u8; 16];
        id.copy_from_slice(&digest[..16]);
        WeakId(id)
    }
}

impl fmt::Debug for StrongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StrongId(..)")
    }
}

// =============================================================================
// WEAK ID
// =============================================================================

/// Public session handle used to address the relay's message queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WeakId(pub [u8; 16]);

impl WeakId {
    /// Parses a weak id from 32 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        decode_hex(s, "weak id").map(Self)
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for WeakId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// =============================================================================
// SESSION SECRET
// =============================================================================

/// High-entropy secret from which a session's ids are derived.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret([u8; 32]);

impl SessionSecret {
    /// Generates a fresh secret from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wraps existing secret bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a secret from 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        decode_hex(s, "session secret").map(Self)
    }

    /// Lowercase hex rendering, for transfer out of band.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Strong id (MAC key) for this secret.
    pub fn strong_id(&self) -> StrongId {
        StrongId(hmac_sha256(&self.0, STRONG_ID_LABEL))
    }

    /// Weak id (relay handle) for this secret.
    pub fn weak_id(&self) -> WeakId {
        self.strong_id().weak_id()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(..)")
    }
}

// =============================================================================
// DIRECTION
// =============================================================================

/// Which of the two pairing roles produced a message.
///
/// Encoded as the integers 1 and 2 both on the wire and in the MAC input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Direction {
    /// Messages from the device that opened the session.
    #[default]
    Forward,
    /// Messages from the device that joined the session.
    Reverse,
}

impl Direction {
    /// Integer value used by the relay.
    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => 2,
        }
    }

    /// The opposite role's direction.
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

impl From<Direction> for i32 {
    fn from(direction: Direction) -> Self {
        direction.as_i32()
    }
}

impl TryFrom<i32> for Direction {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Forward),
            2 => Ok(Direction::Reverse),
            other => Err(format!("invalid direction {other}")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}
