//! Error types for the kex protocol.
//!
//! Every error is local to a single send or receive call. Nothing in this
//! crate retries; recovery is left to the caller.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{MessageKind, PairingState};

/// Errors surfaced by `Sender`, `Receiver` and `KexSession` calls.
#[derive(Debug, Error)]
pub enum KexError {
    #[error("Relay transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The authentication tag did not match the message.
    #[error("Computed HMAC doesn't match message HMAC")]
    MacMismatch,

    #[error("Unhandled message kind: {0:?}")]
    UnknownMessageKind(String),

    #[error("Expected {expected} message, received {received}")]
    UnexpectedMessageKind {
        expected: MessageKind,
        received: MessageKind,
    },

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Session timed out after {elapsed:?} (limit {limit:?})")]
    SessionTimedOut { elapsed: Duration, limit: Duration },

    /// The session already failed; no further calls are made.
    #[error("Session abandoned: {0}")]
    SessionAbandoned(String),

    #[error("Session already completed")]
    SessionCompleted,
}

/// Errors from the relay client (driven port).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Relay returned HTTP status {code}")]
    Status { code: u16 },

    #[error("Relay API error {code}: {desc}")]
    Api { code: i64, desc: String },

    #[error("Invalid relay response: {0}")]
    InvalidResponse(String),
}

/// Errors decoding an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Malformed base64: {0}")]
    Base64(String),

    #[error("Invalid binary payload: {0}")]
    Payload(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Errors encoding an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to encode message: {0}")]
pub struct EncodeError(pub String);

/// Errors loading or validating `KexConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors returned by `Handler` implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// A message arrived that is not legal in the current pairing state.
    #[error("Out of order: {kind} message in state {state:?}")]
    OutOfOrder {
        state: PairingState,
        kind: MessageKind,
    },

    /// The handler refused the message for an application reason.
    #[error("Rejected: {0}")]
    Rejected(String),
}
