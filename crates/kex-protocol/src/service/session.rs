//! Per-attempt pairing session.
//!
//! Bundles everything one pairing attempt needs: the context, a sender and a
//! receiver over a shared relay client, and a clock for the session-wide
//! timeout. No state is global, so several sessions can run side by side.
//!
//! ## Lifecycle
//!
//! - `Active` until a `done` message is sent or received (`Completed`), or
//!   until any call fails or the timeout passes (`Failed`).
//! - A closed session refuses every further call without touching the relay.
//! - The handler can veto each outgoing message through
//!   [`Handler::before_send`] and hears about every message this side sent
//!   through [`Handler::sent`], so it can track the whole conversation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use shared_types::{DeviceId, Kid, MerkleTriple, SigningPublicKey};
use tracing::{info, warn};

use crate::config::KexConfig;
use crate::domain::{Args, Context, MessageKind};
use crate::error::KexError;
use crate::ports::{Handler, RelayClient, TimeSource};
use crate::service::receiver::{Receiver, DEFAULT_POLL_DURATION};
use crate::service::sender::Sender;

/// Default bound on how long a pairing attempt may stay open.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Outcome of a session so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Completed,
    /// Failed with a user-facing reason (`pairing failed: ...`).
    Failed(String),
}

/// One pairing attempt.
///
/// Outbound messages use the context's direction; inbound messages are
/// accepted only from the opposite direction.
pub struct KexSession<R: RelayClient, H: Handler, T: TimeSource> {
    ctx: Context,
    sender: Sender<R>,
    receiver: Receiver<R, H>,
    clock: T,
    started_at: Instant,
    timeout: Duration,
    status: SessionStatus,
}

impl<R: RelayClient, H: Handler, T: TimeSource> KexSession<R, H, T> {
    /// Starts the session clock with default poll duration and timeout.
    pub fn new(ctx: Context, relay: Arc<R>, handler: Arc<H>, clock: T) -> Self {
        let direction = ctx.meta.direction;
        let started_at = clock.now();
        Self {
            sender: Sender::with_direction(Arc::clone(&relay), direction),
            receiver: Receiver::new(relay, handler)
                .with_direction(direction.reverse())
                .with_poll_duration(DEFAULT_POLL_DURATION),
            ctx,
            clock,
            started_at,
            timeout: DEFAULT_SESSION_TIMEOUT,
            status: SessionStatus::Active,
        }
    }

    /// Session using the poll duration and timeout from `config`.
    pub fn from_config(
        ctx: Context,
        relay: Arc<R>,
        handler: Arc<H>,
        clock: T,
        config: &KexConfig,
    ) -> Self {
        Self::new(ctx, relay, handler, clock)
            .with_poll_duration(config.poll_duration())
            .with_timeout(config.session_timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_duration(mut self, poll_duration: Duration) -> Self {
        self.receiver = self.receiver.with_poll_duration(poll_duration);
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn handler(&self) -> &Arc<H> {
        self.receiver.handler()
    }

    /// Time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started_at)
    }

    /// Announces the session's strong id to the peer.
    pub async fn start_kex_session(&mut self) -> Result<(), KexError> {
        let strong_id = *self.ctx.strong_id();
        self.send(Args::StartKex { strong_id }).await
    }

    pub async fn start_reverse_kex_session(&mut self) -> Result<(), KexError> {
        self.send(Args::StartReverseKex).await
    }

    pub async fn hello(&mut self, device_id: DeviceId, key_id: Kid) -> Result<(), KexError> {
        self.send(Args::Hello { device_id, key_id }).await
    }

    pub async fn please_sign(
        &mut self,
        signing_key: SigningPublicKey,
        sig: String,
        device_type: String,
        device_description: String,
    ) -> Result<(), KexError> {
        self.send(Args::PleaseSign {
            signing_key,
            sig,
            device_type,
            device_description,
        })
        .await
    }

    /// Sends the final message and completes the session.
    pub async fn done(&mut self, merkle_triple: MerkleTriple) -> Result<(), KexError> {
        self.send(Args::Done { merkle_triple }).await
    }

    /// Polls once. Receiving `done` completes the session.
    pub async fn receive(&mut self) -> Result<Vec<MessageKind>, KexError> {
        self.ensure_open()?;
        match self.receiver.receive(&self.ctx).await {
            Ok(kinds) => {
                if kinds.contains(&MessageKind::Done) {
                    self.complete();
                }
                Ok(kinds)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Polls until the session completes, fails, or times out.
    pub async fn run_until_complete(&mut self) -> Result<(), KexError> {
        while self.status == SessionStatus::Active {
            self.receive().await?;
        }
        Ok(())
    }

    async fn send(&mut self, args: Args) -> Result<(), KexError> {
        self.ensure_open()?;
        let kind = args.kind();
        if let Err(e) = self.receiver.handler().before_send(&self.ctx, kind).await {
            return Err(self.fail(e.into()));
        }
        match self.sender.send(&self.ctx, args).await {
            Ok(()) => self.ctx.advance_seqno(),
            Err(e) => return Err(self.fail(e)),
        }

        if let Err(e) = self.receiver.handler().sent(&self.ctx, kind).await {
            return Err(self.fail(e.into()));
        }
        if kind == MessageKind::Done {
            self.complete();
        }
        Ok(())
    }

    fn ensure_open(&mut self) -> Result<(), KexError> {
        match &self.status {
            SessionStatus::Failed(reason) => {
                return Err(KexError::SessionAbandoned(reason.clone()));
            }
            SessionStatus::Completed => return Err(KexError::SessionCompleted),
            SessionStatus::Active => {}
        }

        let elapsed = self.elapsed();
        if elapsed > self.timeout {
            return Err(self.fail(KexError::SessionTimedOut {
                elapsed,
                limit: self.timeout,
            }));
        }
        Ok(())
    }

    fn complete(&mut self) {
        info!(
            weak_id = %self.ctx.weak_id(),
            elapsed_ms = self.elapsed().as_millis() as u64,
            "Pairing session completed"
        );
        self.status = SessionStatus::Completed;
    }

    /// Marks the session failed and hands the error back to the caller.
    fn fail(&mut self, err: KexError) -> KexError {
        let reason = format!("pairing failed: {err}");
        warn!(weak_id = %self.ctx.weak_id(), "{}", reason);
        self.status = SessionStatus::Failed(reason);
        err
    }
}
