//! In-process relay.
//!
//! Stores messages per weak id and answers long polls the way the hosted
//! relay does: messages filtered by direction and low watermark, in the
//! order they were posted. Used by tests and for running two devices in one
//! process.

use std::collections::HashMap;
use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Uid;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

use crate::error::TransportError;
use crate::ports::{ReceiveRequest, RelayClient, RelayMessage, SendRequest};

#[derive(Default)]
struct RelayState {
    sessions: HashMap<String, Vec<RelayMessage>>,
    sent: Vec<SendRequest>,
    polls: Vec<ReceiveRequest>,
    fail_next_send: Option<TransportError>,
    fail_next_receive: Option<TransportError>,
}

/// Relay held in memory.
pub struct InMemoryRelay {
    uid: Uid,
    max_poll: Option<Duration>,
    state: Mutex<RelayState>,
    arrivals: Notify,
}

impl InMemoryRelay {
    /// Relay that stamps `uid` on every stored message.
    pub fn new(uid: Uid) -> Self {
        Self {
            uid,
            max_poll: None,
            state: Mutex::new(RelayState::default()),
            arrivals: Notify::new(),
        }
    }

    /// Caps how long a poll may block, whatever the request asks for.
    pub fn with_max_poll(mut self, max_poll: Duration) -> Self {
        self.max_poll = Some(max_poll);
        self
    }

    /// Every send request accepted so far.
    pub fn sent_requests(&self) -> Vec<SendRequest> {
        self.state.lock().sent.clone()
    }

    /// Every receive request seen so far.
    pub fn receive_requests(&self) -> Vec<ReceiveRequest> {
        self.state.lock().polls.clone()
    }

    /// Stores a message as-is, bypassing `send`.
    pub fn inject(&self, message: RelayMessage) {
        self.state
            .lock()
            .sessions
            .entry(message.weak_id_hex.clone())
            .or_default()
            .push(message);
        self.arrivals.notify_waiters();
    }

    /// Makes the next `send` fail with `error`.
    pub fn fail_next_send(&self, error: TransportError) {
        self.state.lock().fail_next_send = Some(error);
    }

    /// Makes the next `receive` fail with `error`.
    pub fn fail_next_receive(&self, error: TransportError) {
        self.state.lock().fail_next_receive = Some(error);
    }

    fn pending(&self, request: &ReceiveRequest) -> Vec<RelayMessage> {
        self.state
            .lock()
            .sessions
            .get(&request.weak_id_hex)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.dir == request.direction && m.seqno >= request.low_watermark)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl RelayClient for InMemoryRelay {
    async fn send(&self, request: SendRequest) -> Result<(), TransportError> {
        let message = {
            let mut state = self.state.lock();
            if let Some(error) = state.fail_next_send.take() {
                return Err(error);
            }
            state.sent.push(request.clone());
            RelayMessage {
                uid: self.uid.to_hex(),
                sender: request.sender_device_id,
                receiver: request.receiver_device_id,
                seqno: request.seqno,
                dir: request.direction,
                strong_id_hex: request.strong_id_hex,
                weak_id_hex: request.weak_id_hex,
                msg: request.body,
            }
        };
        self.inject(message);
        Ok(())
    }

    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<RelayMessage>, TransportError> {
        {
            let mut state = self.state.lock();
            if let Some(error) = state.fail_next_receive.take() {
                return Err(error);
            }
            state.polls.push(request.clone());
        }

        let mut wait = Duration::from_secs(request.poll_seconds);
        if let Some(max_poll) = self.max_poll {
            wait = wait.min(max_poll);
        }
        let deadline = Instant::now() + wait;

        loop {
            let mut arrival = pin!(self.arrivals.notified());
            arrival.as_mut().enable();

            let found = self.pending(&request);
            if !found.is_empty() {
                return Ok(found);
            }
            if timeout_at(deadline, arrival).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }
}
