use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{DeviceId, Kid, MerkleTriple, SigningPublicKey};
use tracing::{debug, warn};

use crate::domain::{Context, MessageKind, PairingState, StrongId};
use crate::error::HandlerError;
use crate::ports::Handler;

/// Handler wrapper that rejects messages arriving out of protocol order.
///
/// Tracks the whole conversation: received messages arrive through the
/// dispatch methods, sent ones through [`Handler::sent`]. Outgoing messages
/// are checked in [`Handler::before_send`], so an out-of-order send never
/// reaches the relay. The state only advances when the inner handler accepts
/// the message, so a rejected message can be retried.
pub struct OrderedHandler<H> {
    inner: H,
    state: Mutex<PairingState>,
}

impl<H: Handler> OrderedHandler<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            state: Mutex::new(PairingState::Idle),
        }
    }

    pub fn state(&self) -> PairingState {
        *self.state.lock()
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    fn check(&self, kind: MessageKind) -> Result<PairingState, HandlerError> {
        let state = *self.state.lock();
        state.advance(kind).inspect_err(|e| {
            warn!(error = %e, "Rejected out-of-order kex message");
        })
    }

    fn commit(&self, next: PairingState) {
        let mut state = self.state.lock();
        debug!(from = ?*state, to = ?next, "Pairing state advanced");
        *state = next;
    }
}

#[async_trait]
impl<H: Handler> Handler for OrderedHandler<H> {
    async fn start_kex_session(&self, ctx: &Context, id: StrongId) -> Result<(), HandlerError> {
        let next = self.check(MessageKind::StartKex)?;
        self.inner.start_kex_session(ctx, id).await?;
        self.commit(next);
        Ok(())
    }

    async fn start_reverse_kex_session(&self, ctx: &Context) -> Result<(), HandlerError> {
        let next = self.check(MessageKind::StartReverseKex)?;
        self.inner.start_reverse_kex_session(ctx).await?;
        self.commit(next);
        Ok(())
    }

    async fn hello(
        &self,
        ctx: &Context,
        device_id: DeviceId,
        key_id: Kid,
    ) -> Result<(), HandlerError> {
        let next = self.check(MessageKind::Hello)?;
        self.inner.hello(ctx, device_id, key_id).await?;
        self.commit(next);
        Ok(())
    }

    async fn please_sign(
        &self,
        ctx: &Context,
        signing_key: SigningPublicKey,
        sig: String,
        device_type: String,
        device_description: String,
    ) -> Result<(), HandlerError> {
        let next = self.check(MessageKind::PleaseSign)?;
        self.inner
            .please_sign(ctx, signing_key, sig, device_type, device_description)
            .await?;
        self.commit(next);
        Ok(())
    }

    async fn done(&self, ctx: &Context, merkle_triple: MerkleTriple) -> Result<(), HandlerError> {
        let next = self.check(MessageKind::Done)?;
        self.inner.done(ctx, merkle_triple).await?;
        self.commit(next);
        Ok(())
    }

    async fn before_send(&self, ctx: &Context, kind: MessageKind) -> Result<(), HandlerError> {
        self.check(kind)?;
        self.inner.before_send(ctx, kind).await
    }

    async fn sent(&self, ctx: &Context, kind: MessageKind) -> Result<(), HandlerError> {
        let next = self.check(kind)?;
        self.inner.sent(ctx, kind).await?;
        self.commit(next);
        Ok(())
    }
}
