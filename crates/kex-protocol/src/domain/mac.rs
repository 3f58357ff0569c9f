//! Message authentication.
//!
//! The tag is HMAC-SHA256, keyed by the raw strong id, over the canonical
//! binary encoding of the whole message (meta, kind name, args) with an empty
//! MAC field. The input is built from a borrowed view, so the message itself
//! is never mutated while hashing.
//!
//! Verification is constant-time.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::domain::codec::{to_binary, WireArgs, WireBody};
use crate::domain::ids::{hmac_sha256, StrongId};
use crate::domain::message::Meta;
use crate::error::{EncodeError, KexError};

type HmacSha256 = Hmac<Sha256>;

/// Tag length in bytes.
pub const MAC_LEN: usize = 32;

/// A 32-byte authentication tag.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MacTag(pub [u8; MAC_LEN]);

impl MacTag {
    /// Builds a tag from exactly `MAC_LEN` bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }
}

impl fmt::Debug for MacTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacTag({})", hex::encode(self.0))
    }
}

/// Borrowed view of a message laid out like `Meta` followed by `WireBody`,
/// with the MAC field always empty.
#[derive(Serialize)]
struct MacInput<'a> {
    meta: &'a Meta,
    name: &'a str,
    args: &'a WireArgs,
    mac: &'a [u8],
}

/// Canonical bytes the tag is computed over.
pub fn mac_input(meta: &Meta, body: &WireBody) -> Result<Vec<u8>, EncodeError> {
    to_binary(&MacInput {
        meta,
        name: &body.name,
        args: &body.args,
        mac: &[],
    })
}

/// HMAC-SHA256 of `message` under `key`.
pub fn compute_tag(key: &StrongId, message: &[u8]) -> MacTag {
    MacTag(hmac_sha256(key.as_bytes(), message))
}

/// Constant-time check of `tag` against `message` under `key`.
///
/// Tags of the wrong length fail like any other mismatch.
pub fn verify_tag(key: &StrongId, message: &[u8], tag: &[u8]) -> bool {
    let mut mac = match HmacSha256::new_from_slice(key.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}

/// Tag for a message keyed by `key`. Any MAC already in `body` is ignored.
pub fn compute_mac(meta: &Meta, body: &WireBody, key: &StrongId) -> Result<MacTag, EncodeError> {
    Ok(compute_tag(key, &mac_input(meta, body)?))
}

/// Verifies the MAC carried in `body` under `key`.
pub fn verify_mac(meta: &Meta, body: &WireBody, key: &StrongId) -> Result<(), KexError> {
    let input = mac_input(meta, body)?;
    if verify_tag(key, &input, &body.mac) {
        Ok(())
    } else {
        Err(KexError::MacMismatch)
    }
}
