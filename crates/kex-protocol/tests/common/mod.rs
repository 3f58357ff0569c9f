//! Shared fixtures for the kex integration suites.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kex_protocol::{
    Context, Direction, Handler, HandlerError, InMemoryRelay, MessageKind, SessionSecret, StrongId,
};
use parking_lot::Mutex;
use shared_types::{DeviceId, Kid, MerkleTriple, SigningPublicKey, Uid};

pub const UID: Uid = Uid([0x11; 16]);
pub const DEVICE_A: DeviceId = DeviceId([0xA1; 16]);
pub const DEVICE_B: DeviceId = DeviceId([0xB2; 16]);

/// One handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StartKex(StrongId),
    StartReverseKex,
    Hello(DeviceId, Kid),
    PleaseSign {
        signing_key: SigningPublicKey,
        sig: String,
        device_type: String,
        device_description: String,
    },
    Done(MerkleTriple),
    Sent(MessageKind),
}

/// Records every call; optionally rejects one kind.
#[derive(Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<Call>>,
    reject: Mutex<Option<MessageKind>>,
}

impl RecordingHandler {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Calls other than `Sent` notifications.
    pub fn received(&self) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|c| !matches!(c, Call::Sent(_)))
            .cloned()
            .collect()
    }

    pub fn reject(&self, kind: MessageKind) {
        *self.reject.lock() = Some(kind);
    }

    fn record(&self, kind: MessageKind, call: Call) -> Result<(), HandlerError> {
        if *self.reject.lock() == Some(kind) {
            return Err(HandlerError::Rejected(format!("{kind} not wanted")));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    async fn start_kex_session(&self, _ctx: &Context, id: StrongId) -> Result<(), HandlerError> {
        self.record(MessageKind::StartKex, Call::StartKex(id))
    }

    async fn start_reverse_kex_session(&self, _ctx: &Context) -> Result<(), HandlerError> {
        self.record(MessageKind::StartReverseKex, Call::StartReverseKex)
    }

    async fn hello(
        &self,
        _ctx: &Context,
        device_id: DeviceId,
        key_id: Kid,
    ) -> Result<(), HandlerError> {
        self.record(MessageKind::Hello, Call::Hello(device_id, key_id))
    }

    async fn please_sign(
        &self,
        _ctx: &Context,
        signing_key: SigningPublicKey,
        sig: String,
        device_type: String,
        device_description: String,
    ) -> Result<(), HandlerError> {
        self.record(
            MessageKind::PleaseSign,
            Call::PleaseSign {
                signing_key,
                sig,
                device_type,
                device_description,
            },
        )
    }

    async fn done(&self, _ctx: &Context, merkle_triple: MerkleTriple) -> Result<(), HandlerError> {
        self.record(MessageKind::Done, Call::Done(merkle_triple))
    }

    async fn sent(&self, _ctx: &Context, kind: MessageKind) -> Result<(), HandlerError> {
        self.calls.lock().push(Call::Sent(kind));
        Ok(())
    }
}

pub fn secret() -> SessionSecret {
    SessionSecret::from_bytes([0x5E; 32])
}

/// Initiating device: sends forward, receives reverse.
pub fn ctx_a(secret: &SessionSecret) -> Context {
    Context::new(
        UID,
        DEVICE_A,
        DEVICE_B,
        secret.strong_id(),
        secret.weak_id(),
        Direction::Forward,
    )
}

/// Responding device: sends reverse, receives forward.
pub fn ctx_b(secret: &SessionSecret) -> Context {
    Context::new(
        UID,
        DEVICE_B,
        DEVICE_A,
        secret.strong_id(),
        secret.weak_id(),
        Direction::Reverse,
    )
}

/// Relay whose polls return quickly when nothing is queued.
pub fn relay() -> Arc<InMemoryRelay> {
    Arc::new(InMemoryRelay::new(UID).with_max_poll(Duration::from_millis(20)))
}

pub fn merkle_triple() -> MerkleTriple {
    MerkleTriple {
        seqno: 42,
        link_id: vec![0xCD; 32],
        sig_id: "sig-42".to_string(),
    }
}
