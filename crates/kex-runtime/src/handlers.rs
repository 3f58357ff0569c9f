//! Handler that reports each pairing message to the log.

use async_trait::async_trait;
use kex_protocol::{Context, Handler, HandlerError, MessageKind, StrongId};
use shared_types::{DeviceId, Kid, MerkleTriple, SigningPublicKey};
use tracing::info;

pub struct LoggingHandler;

#[async_trait]
impl Handler for LoggingHandler {
    async fn start_kex_session(&self, ctx: &Context, _id: StrongId) -> Result<(), HandlerError> {
        info!(peer = %ctx.meta.dst, "Peer started a kex session");
        Ok(())
    }

    async fn start_reverse_kex_session(&self, ctx: &Context) -> Result<(), HandlerError> {
        info!(peer = %ctx.meta.dst, "Peer started a reverse kex session");
        Ok(())
    }

    async fn hello(
        &self,
        _ctx: &Context,
        device_id: DeviceId,
        key_id: Kid,
    ) -> Result<(), HandlerError> {
        if key_id.is_empty() {
            return Err(HandlerError::Rejected("hello without a key id".to_string()));
        }
        info!(device = %device_id, key = %key_id, "Peer said hello");
        Ok(())
    }

    async fn please_sign(
        &self,
        _ctx: &Context,
        signing_key: SigningPublicKey,
        _sig: String,
        device_type: String,
        device_description: String,
    ) -> Result<(), HandlerError> {
        info!(
            key = %signing_key,
            device_type = %device_type,
            description = %device_description,
            "Peer asked for a signature"
        );
        Ok(())
    }

    async fn done(&self, _ctx: &Context, merkle_triple: MerkleTriple) -> Result<(), HandlerError> {
        info!(
            seqno = merkle_triple.seqno,
            sig_id = %merkle_triple.sig_id,
            "Peer finished pairing"
        );
        Ok(())
    }

    async fn sent(&self, _ctx: &Context, kind: MessageKind) -> Result<(), HandlerError> {
        info!(kind = %kind, "Message delivered to relay");
        Ok(())
    }
}
