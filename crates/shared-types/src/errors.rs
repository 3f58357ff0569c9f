//! # Error Types
//!
//! Defines error types for parsing identifiers.

use thiserror::Error;

/// Errors that can occur when parsing an identifier from text or bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input was not valid hex.
    #[error("Invalid hex for {kind}: {reason}")]
    InvalidHex { kind: &'static str, reason: String },

    /// The decoded identifier had the wrong length.
    #[error("Invalid length for {kind}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The identifier was empty where a value is required.
    #[error("Empty {kind}")]
    Empty { kind: &'static str },
}
