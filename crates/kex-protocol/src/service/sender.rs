//! Outbound half of the protocol.
//!
//! Each method builds a typed body, stamps the sender's direction, attaches
//! the MAC, encodes the body and hands one `SendRequest` to the relay.
//! Transport failures are returned unchanged; nothing is retried here.

use std::sync::Arc;

use shared_types::{DeviceId, Kid, MerkleTriple, SigningPublicKey};
use tracing::debug;

use crate::domain::{Args, Context, Direction, Msg, StrongId};
use crate::error::KexError;
use crate::ports::{RelayClient, SendRequest};

/// Posts kex messages through a relay.
pub struct Sender<R: RelayClient> {
    relay: Arc<R>,
    direction: Direction,
}

impl<R: RelayClient> Sender<R> {
    /// Sender producing `Direction::Forward` messages.
    pub fn new(relay: Arc<R>) -> Self {
        Self::with_direction(relay, Direction::Forward)
    }

    pub fn with_direction(relay: Arc<R>, direction: Direction) -> Self {
        Self { relay, direction }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub async fn start_kex_session(&self, ctx: &Context, id: StrongId) -> Result<(), KexError> {
        self.send(ctx, Args::StartKex { strong_id: id }).await
    }

    pub async fn start_reverse_kex_session(&self, ctx: &Context) -> Result<(), KexError> {
        self.send(ctx, Args::StartReverseKex).await
    }

    pub async fn hello(
        &self,
        ctx: &Context,
        device_id: DeviceId,
        key_id: Kid,
    ) -> Result<(), KexError> {
        self.send(ctx, Args::Hello { device_id, key_id }).await
    }

    pub async fn please_sign(
        &self,
        ctx: &Context,
        signing_key: SigningPublicKey,
        sig: String,
        device_type: String,
        device_description: String,
    ) -> Result<(), KexError> {
        self.send(
            ctx,
            Args::PleaseSign {
                signing_key,
                sig,
                device_type,
                device_description,
            },
        )
        .await
    }

    pub async fn done(&self, ctx: &Context, merkle_triple: MerkleTriple) -> Result<(), KexError> {
        self.send(ctx, Args::Done { merkle_triple }).await
    }

    /// Authenticates, encodes and posts one message.
    pub async fn send(&self, ctx: &Context, args: Args) -> Result<(), KexError> {
        let mut msg = Msg::new(ctx, args);
        msg.meta.direction = self.direction;
        let msg = msg.seal()?;
        let body = msg.body.encode()?;

        let request = SendRequest {
            direction: msg.meta.direction.as_i32(),
            strong_id_hex: msg.meta.strong_id.to_hex(),
            body,
            receiver_device_id: msg.meta.dst.to_hex(),
            sender_device_id: msg.meta.src.to_hex(),
            seqno: msg.meta.seqno,
            weak_id_hex: msg.meta.weak_id.to_hex(),
        };

        debug!(
            kind = %msg.body.kind(),
            seqno = msg.meta.seqno,
            direction = %msg.meta.direction,
            weak_id = %msg.meta.weak_id,
            "Sending kex message"
        );

        self.relay.send(request).await?;
        Ok(())
    }
}
