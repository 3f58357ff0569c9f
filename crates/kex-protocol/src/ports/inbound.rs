//! Inbound Ports (Driving Ports)
//!
//! The capability set an application implements to react to each message
//! kind. The `Receiver` holds exactly one `Handler` for the lifetime of a
//! session and calls it only for messages that decoded and authenticated.

use async_trait::async_trait;
use shared_types::{DeviceId, Kid, MerkleTriple, SigningPublicKey};

use crate::domain::{Context, MessageKind, StrongId};
use crate::error::HandlerError;

/// Reaction to each kex message kind (Driving Port).
///
/// Implementations own their session state; the transport does not enforce
/// message order. Wrap an implementation in
/// [`OrderedHandler`](crate::handler::OrderedHandler) to reject out-of-order
/// messages.
#[async_trait]
pub trait Handler: Send + Sync {
    /// The peer opened a session with the given strong id.
    async fn start_kex_session(&self, ctx: &Context, id: StrongId) -> Result<(), HandlerError>;

    /// The peer opened a reverse-initiated session.
    async fn start_reverse_kex_session(&self, ctx: &Context) -> Result<(), HandlerError>;

    /// The peer introduced a device and its key.
    async fn hello(&self, ctx: &Context, device_id: DeviceId, key_id: Kid)
        -> Result<(), HandlerError>;

    /// The peer asks for the new device's key to be signed.
    async fn please_sign(
        &self,
        ctx: &Context,
        signing_key: SigningPublicKey,
        sig: String,
        device_type: String,
        device_description: String,
    ) -> Result<(), HandlerError>;

    /// The peer finished the session.
    async fn done(&self, ctx: &Context, merkle_triple: MerkleTriple) -> Result<(), HandlerError>;

    /// This side is about to send a message of `kind`.
    ///
    /// Called by `KexSession` before the message reaches the relay; an error
    /// stops the send. Allows everything by default.
    async fn before_send(&self, _ctx: &Context, _kind: MessageKind) -> Result<(), HandlerError> {
        Ok(())
    }

    /// This side's message of `kind` was accepted by the relay.
    ///
    /// Called by `KexSession` after each successful send. Does nothing by
    /// default.
    async fn sent(&self, _ctx: &Context, _kind: MessageKind) -> Result<(), HandlerError> {
        Ok(())
    }
}
