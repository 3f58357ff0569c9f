//! # Core Identity Entities
//!
//! Defines the identity values exchanged while pairing a new device.
//!
//! ## Clusters
//!
//! - **Identity**: `Uid`
//! - **Devices**: `DeviceId`, `Kid`, `SigningPublicKey`
//! - **Proofs**: `MerkleTriple`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::IdError;

/// Declares a fixed-size identifier with hex text conversions.
macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident, $len:expr, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Length of the identifier in bytes.
            pub const LEN: usize = $len;

            /// Builds the identifier from a byte slice of exactly `LEN` bytes.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
                let arr: [u8; $len] = bytes.try_into().map_err(|_| IdError::InvalidLength {
                    kind: $kind,
                    expected: $len,
                    actual: bytes.len(),
                })?;
                Ok(Self(arr))
            }

            /// Parses the identifier from lowercase or uppercase hex.
            pub fn from_hex(s: &str) -> Result<Self, IdError> {
                let bytes = hex::decode(s).map_err(|e| IdError::InvalidHex {
                    kind: $kind,
                    reason: e.to_string(),
                })?;
                Self::from_slice(&bytes)
            }

            /// Renders the identifier as lowercase hex.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Raw bytes of the identifier.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }
    };
}

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

fixed_id!(
    /// Identifier of the user identity that owns both pairing devices.
    Uid,
    16,
    "uid"
);

// =============================================================================
// CLUSTER B: DEVICES
// =============================================================================

fixed_id!(
    /// Identifier of a single device belonging to a user.
    DeviceId,
    16,
    "device id"
);

fixed_id!(
    /// NaCl (Ed25519) public signing key of a device.
    ///
    /// Carried opaquely; this workspace never signs or verifies with it.
    SigningPublicKey,
    32,
    "signing key"
);

/// Key identifier of a device's public key.
///
/// Variable length: the identifier embeds a key-type prefix and suffix around
/// the key material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Kid(pub Vec<u8>);

impl Kid {
    /// Parses a key identifier from hex. An empty identifier is rejected.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        let bytes = hex::decode(s).map_err(|e| IdError::InvalidHex {
            kind: "kid",
            reason: e.to_string(),
        })?;
        if bytes.is_empty() {
            return Err(IdError::Empty { kind: "kid" });
        }
        Ok(Self(bytes))
    }

    /// Renders the key identifier as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// True for the zero-value identifier.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Kid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Kid {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// =============================================================================
// CLUSTER C: PROOFS
// =============================================================================

/// Position of a signature link in the identity's Merkle-tree backed sigchain.
///
/// Sent with the final pairing message so the new device can locate the link
/// that added it. Treated as opaque data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MerkleTriple {
    /// Sequence number of the sigchain link.
    pub seqno: i64,
    /// Hash identifying the link.
    pub link_id: Vec<u8>,
    /// Identifier of the signature that produced the link.
    pub sig_id: String,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_hex_roundtrip() {
        let id = DeviceId([0xab; 16]);
        let parsed: DeviceId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.to_hex().len(), 32);
    }

    #[test]
    fn test_uid_rejects_wrong_length() {
        let err = Uid::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            IdError::InvalidLength {
                kind: "uid",
                expected: 16,
                actual: 2
            }
        );
    }

    #[test]
    fn test_signing_key_rejects_bad_hex() {
        let err = SigningPublicKey::from_hex("zz").unwrap_err();
        assert!(matches!(err, IdError::InvalidHex { kind: "signing key", .. }));
    }

    #[test]
    fn test_kid_rejects_empty() {
        assert_eq!(Kid::from_hex("").unwrap_err(), IdError::Empty { kind: "kid" });
        let kid = Kid::from_hex("0120aa0a").unwrap();
        assert_eq!(kid.0, vec![0x01, 0x20, 0xaa, 0x0a]);
        assert_eq!(kid.to_string(), "0120aa0a");
    }

    #[test]
    fn test_fixed_ids_have_stable_binary_layout() {
        // Fixed-size ids encode as raw bytes with no length prefix.
        let bytes = bincode::serialize(&DeviceId([7; 16])).unwrap();
        assert_eq!(bytes, vec![7; 16]);
    }
}
