//! Outbound Ports (Driven Ports)
//!
//! Dependencies the protocol needs from the host application: the relay
//! transport and a clock.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// One outbound message for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub direction: i32,
    pub strong_id_hex: String,
    /// Base64 encoded body.
    pub body: String,
    pub receiver_device_id: String,
    pub sender_device_id: String,
    pub seqno: i64,
    pub weak_id_hex: String,
}

/// Long-poll for messages addressed to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveRequest {
    pub weak_id_hex: String,
    /// Only messages produced in this direction are returned.
    pub direction: i32,
    /// Earliest seqno of interest.
    pub low_watermark: i64,
    /// How long the relay may hold the request open waiting for messages.
    pub poll_seconds: u64,
}

/// A stored message as the relay returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub uid: String,
    pub sender: String,
    pub receiver: String,
    pub seqno: i64,
    pub dir: i32,
    /// Strong id hex.
    #[serde(rename = "I")]
    pub strong_id_hex: String,
    /// Weak id hex.
    #[serde(rename = "w")]
    pub weak_id_hex: String,
    /// Base64 encoded body.
    pub msg: String,
}

/// Store-and-forward relay (Driven Port).
///
/// Implementations must be safe for concurrent use: a session's sender and
/// receiver share one client.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Submits one outbound message.
    async fn send(&self, request: SendRequest) -> Result<(), TransportError>;

    /// Fetches messages, blocking server-side for up to `poll_seconds`.
    /// Returns them in relay order; an empty batch means the poll expired.
    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<RelayMessage>, TransportError>;
}

/// Monotonic clock used for the session timeout.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}
