//! Inbound half of the protocol.
//!
//! One `receive` call issues one long poll. The whole batch is imported,
//! decoded and authenticated before anything reaches the handler: a single
//! bad message fails the call and nothing in that batch is dispatched.
//! Good batches are then dispatched in relay order, and the low watermark
//! moves past every dispatched seqno so later polls only return newer
//! messages. A message below the watermark or filed under another weak id
//! fails the batch like any other bad message.

use std::sync::Arc;
use std::time::Duration;

use shared_types::{DeviceId, Uid};
use tracing::{debug, warn};

use crate::domain::{
    verify_mac, Args, Body, Context, Direction, MessageKind, Meta, Msg, StrongId, WeakId, WireBody,
};
use crate::error::{DecodeError, HandlerError, KexError};
use crate::ports::{Handler, ReceiveRequest, RelayClient, RelayMessage};

/// Default server-side poll duration.
pub const DEFAULT_POLL_DURATION: Duration = Duration::from_secs(20);

/// Polls the relay and dispatches authenticated messages to a handler.
pub struct Receiver<R: RelayClient, H: Handler> {
    relay: Arc<R>,
    handler: Arc<H>,
    direction: Direction,
    poll_duration: Duration,
    low_watermark: i64,
}

impl<R: RelayClient, H: Handler> Receiver<R, H> {
    /// Receiver for `Direction::Forward` messages with the default poll duration.
    pub fn new(relay: Arc<R>, handler: Arc<H>) -> Self {
        Self {
            relay,
            handler,
            direction: Direction::Forward,
            poll_duration: DEFAULT_POLL_DURATION,
            low_watermark: 0,
        }
    }

    /// Only accept messages produced in `direction`.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_poll_duration(mut self, poll_duration: Duration) -> Self {
        self.poll_duration = poll_duration;
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Earliest seqno the next poll asks for.
    pub fn low_watermark(&self) -> i64 {
        self.low_watermark
    }

    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    /// Polls once and dispatches every message in the batch.
    ///
    /// Returns the kinds dispatched, in order; empty if the poll expired.
    pub async fn receive(&mut self, ctx: &Context) -> Result<Vec<MessageKind>, KexError> {
        let batch = self.fetch(ctx).await?;
        self.dispatch_all(ctx, batch).await
    }

    /// Like [`receive`](Self::receive), but fails before dispatching anything
    /// if the batch holds a kind other than `expected`.
    pub async fn receive_expecting(
        &mut self,
        ctx: &Context,
        expected: MessageKind,
    ) -> Result<Vec<MessageKind>, KexError> {
        let batch = self.fetch(ctx).await?;
        if let Some(msg) = batch.iter().find(|msg| msg.body.kind() != expected) {
            return Err(KexError::UnexpectedMessageKind {
                expected,
                received: msg.body.kind(),
            });
        }
        self.dispatch_all(ctx, batch).await
    }

    async fn fetch(&self, ctx: &Context) -> Result<Vec<Msg>, KexError> {
        let request = ReceiveRequest {
            weak_id_hex: ctx.weak_id().to_hex(),
            direction: self.direction.as_i32(),
            low_watermark: self.low_watermark,
            poll_seconds: self.poll_duration.as_secs(),
        };

        let raw = self.relay.receive(request).await?;
        debug!(
            count = raw.len(),
            low = self.low_watermark,
            weak_id = %ctx.weak_id(),
            "Polled kex relay"
        );

        raw.iter().map(|m| self.authenticate(m, ctx)).collect()
    }

    fn authenticate(&self, raw: &RelayMessage, ctx: &Context) -> Result<Msg, KexError> {
        let (meta, wire) = import(raw)?;

        if let Err(e) = verify_mac(&meta, &wire, ctx.strong_id()) {
            warn!(
                seqno = meta.seqno,
                sender = %meta.src,
                "Rejected kex message with invalid MAC"
            );
            return Err(e);
        }

        // The relay could hand back our own authenticated messages.
        if meta.direction != self.direction {
            return Err(DecodeError::InvalidField {
                field: "dir",
                reason: format!("expected {}, got {}", self.direction, meta.direction),
            }
            .into());
        }

        if meta.weak_id != *ctx.weak_id() {
            return Err(invalid("w", format!("message filed under {}", meta.weak_id)).into());
        }

        // Already dispatched, or never asked for.
        if meta.seqno < self.low_watermark {
            warn!(
                seqno = meta.seqno,
                low = self.low_watermark,
                "Rejected replayed kex message"
            );
            return Err(invalid(
                "seqno",
                format!("{} is below the low watermark {}", meta.seqno, self.low_watermark),
            )
            .into());
        }

        let body = Body::try_from(wire)?;
        Ok(Msg { meta, body })
    }

    async fn dispatch_all(
        &mut self,
        ctx: &Context,
        batch: Vec<Msg>,
    ) -> Result<Vec<MessageKind>, KexError> {
        let mut kinds = Vec::with_capacity(batch.len());
        for msg in batch {
            let kind = msg.body.kind();
            self.low_watermark = self.low_watermark.max(msg.meta.seqno.saturating_add(1));
            debug!(kind = %kind, seqno = msg.meta.seqno, "Dispatching kex message");
            self.dispatch(ctx, msg.body.args).await?;
            kinds.push(kind);
        }
        Ok(kinds)
    }

    async fn dispatch(&self, ctx: &Context, args: Args) -> Result<(), HandlerError> {
        match args {
            Args::StartKex { strong_id } => self.handler.start_kex_session(ctx, strong_id).await,
            Args::StartReverseKex => self.handler.start_reverse_kex_session(ctx).await,
            Args::Hello { device_id, key_id } => self.handler.hello(ctx, device_id, key_id).await,
            Args::PleaseSign {
                signing_key,
                sig,
                device_type,
                device_description,
            } => {
                self.handler
                    .please_sign(ctx, signing_key, sig, device_type, device_description)
                    .await
            }
            Args::Done { merkle_triple } => self.handler.done(ctx, merkle_triple).await,
        }
    }
}

fn invalid(field: &'static str, reason: impl ToString) -> DecodeError {
    DecodeError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

/// Rebuilds metadata and the still-unauthenticated wire body from a relay message.
pub fn import(raw: &RelayMessage) -> Result<(Meta, WireBody), DecodeError> {
    let meta = Meta {
        uid: Uid::from_hex(&raw.uid).map_err(|e| invalid("uid", e))?,
        src: DeviceId::from_hex(&raw.sender).map_err(|e| invalid("sender", e))?,
        dst: DeviceId::from_hex(&raw.receiver).map_err(|e| invalid("receiver", e))?,
        strong_id: StrongId::from_hex(&raw.strong_id_hex).map_err(|e| invalid("I", e))?,
        weak_id: WeakId::from_hex(&raw.weak_id_hex).map_err(|e| invalid("w", e))?,
        seqno: raw.seqno,
        direction: Direction::try_from(raw.dir).map_err(|e| invalid("dir", e))?,
    };
    let body = WireBody::decode(&raw.msg)?;
    Ok((meta, body))
}
