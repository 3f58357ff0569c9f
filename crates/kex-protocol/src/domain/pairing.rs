//! Pairing state progression.
//!
//! The transport layer never enforces message order. Handlers that want to
//! reject out-of-order messages track a `PairingState` and call
//! [`PairingState::advance`] for each message sent or received, since each
//! device only receives half of the conversation.
//!
//! ```text
//! Idle ──startkex──→ KexStarted ──hello──→ HelloExchanged
//!  │                     ↑                      │
//!  └─startrevkex─→ ReverseKexStarted ─hello─────┤
//!                                               ↓
//!                  Done ←──done── SignatureRequested ←──pleasesign
//! ```

use crate::domain::message::MessageKind;
use crate::error::HandlerError;

/// Where a pairing session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PairingState {
    #[default]
    Idle,
    KexStarted,
    ReverseKexStarted,
    HelloExchanged,
    SignatureRequested,
    Done,
}

impl PairingState {
    /// State after receiving `kind`, or `OutOfOrder` if `kind` is not legal here.
    pub fn advance(self, kind: MessageKind) -> Result<Self, HandlerError> {
        use MessageKind as K;
        use PairingState as S;

        let next = match (self, kind) {
            (S::Idle, K::StartKex) => S::KexStarted,
            (S::Idle, K::StartReverseKex) => S::ReverseKexStarted,
            (S::ReverseKexStarted, K::StartKex) => S::KexStarted,
            (S::KexStarted | S::ReverseKexStarted, K::Hello) => S::HelloExchanged,
            (S::HelloExchanged, K::PleaseSign) => S::SignatureRequested,
            (S::SignatureRequested, K::Done) => S::Done,
            (state, kind) => return Err(HandlerError::OutOfOrder { state, kind }),
        };
        Ok(next)
    }

    pub fn is_terminal(self) -> bool {
        self == PairingState::Done
    }
}
