//! Protocol messages.
//!
//! A `Msg` is cleartext routing metadata (`Meta`) plus an integrity-protected
//! `Body`. Bodies are typed by [`Args`], a tagged union over the five message
//! kinds; the kind name on the wire is derived from the tag.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared_types::{DeviceId, Kid, MerkleTriple, SigningPublicKey, Uid};

use crate::domain::codec::{WireArgs, WireBody};
use crate::domain::ids::{Direction, StrongId, WeakId};
use crate::domain::mac::{self, MacTag};
use crate::error::{DecodeError, EncodeError, KexError};

// =============================================================================
// META / CONTEXT
// =============================================================================

/// Routing and session metadata. Travels in cleartext but is covered by the MAC.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Meta {
    /// Identity owning the pairing flow.
    pub uid: Uid,
    /// Sending device.
    pub src: DeviceId,
    /// Receiving device.
    pub dst: DeviceId,
    pub strong_id: StrongId,
    pub weak_id: WeakId,
    /// Per-session message counter.
    pub seqno: i64,
    pub direction: Direction,
}

/// State of one pairing attempt, threaded through every send and receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub meta: Meta,
}

impl Context {
    /// Creates a context for a new pairing attempt with seqno 0.
    pub fn new(
        uid: Uid,
        src: DeviceId,
        dst: DeviceId,
        strong_id: StrongId,
        weak_id: WeakId,
        direction: Direction,
    ) -> Self {
        Self {
            meta: Meta {
                uid,
                src,
                dst,
                strong_id,
                weak_id,
                seqno: 0,
                direction,
            },
        }
    }

    pub fn strong_id(&self) -> &StrongId {
        &self.meta.strong_id
    }

    pub fn weak_id(&self) -> &WeakId {
        &self.meta.weak_id
    }

    /// Moves to the next sequence number.
    pub fn advance_seqno(&mut self) {
        self.meta.seqno = self.meta.seqno.saturating_add(1);
    }
}

// =============================================================================
// MESSAGE KINDS
// =============================================================================

/// The five recognized message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    StartKex,
    StartReverseKex,
    Hello,
    PleaseSign,
    Done,
}

impl MessageKind {
    /// All kinds in protocol order.
    pub const ALL: [MessageKind; 5] = [
        MessageKind::StartKex,
        MessageKind::StartReverseKex,
        MessageKind::Hello,
        MessageKind::PleaseSign,
        MessageKind::Done,
    ];

    /// Wire name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::StartKex => "startkex",
            MessageKind::StartReverseKex => "startrevkex",
            MessageKind::Hello => "hello",
            MessageKind::PleaseSign => "pleasesign",
            MessageKind::Done => "done",
        }
    }

    /// Looks up a kind by wire name. Unknown names return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ARGS / BODY
// =============================================================================

/// Arguments of each message kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Args {
    /// Opens a session, announcing the shared strong id.
    StartKex { strong_id: StrongId },
    /// Opens a session initiated from the other side.
    StartReverseKex,
    /// Introduces a device and its key.
    Hello { device_id: DeviceId, key_id: Kid },
    /// Asks the peer to sign the new device's key.
    PleaseSign {
        signing_key: SigningPublicKey,
        sig: String,
        device_type: String,
        device_description: String,
    },
    /// Completes the session with the sigchain position of the new link.
    Done { merkle_triple: MerkleTriple },
}

impl Args {
    pub fn kind(&self) -> MessageKind {
        match self {
            Args::StartKex { .. } => MessageKind::StartKex,
            Args::StartReverseKex => MessageKind::StartReverseKex,
            Args::Hello { .. } => MessageKind::Hello,
            Args::PleaseSign { .. } => MessageKind::PleaseSign,
            Args::Done { .. } => MessageKind::Done,
        }
    }

    /// Flattens into the wire layout, leaving unused fields zeroed.
    pub fn to_wire(&self) -> WireArgs {
        match self {
            Args::StartKex { strong_id } => WireArgs {
                strong_id: *strong_id,
                ..WireArgs::default()
            },
            Args::StartReverseKex => WireArgs::default(),
            Args::Hello { device_id, key_id } => WireArgs {
                device_id: *device_id,
                dev_key_id: key_id.clone(),
                ..WireArgs::default()
            },
            Args::PleaseSign {
                signing_key,
                sig,
                device_type,
                device_description,
            } => WireArgs {
                signing_key: *signing_key,
                sig: sig.clone(),
                dev_type: device_type.clone(),
                dev_desc: device_description.clone(),
                ..WireArgs::default()
            },
            Args::Done { merkle_triple } => WireArgs {
                merkle_triple: merkle_triple.clone(),
                ..WireArgs::default()
            },
        }
    }

    /// Picks the fields `kind` uses out of the wire layout.
    pub fn from_wire(kind: MessageKind, wire: WireArgs) -> Self {
        match kind {
            MessageKind::StartKex => Args::StartKex {
                strong_id: wire.strong_id,
            },
            MessageKind::StartReverseKex => Args::StartReverseKex,
            MessageKind::Hello => Args::Hello {
                device_id: wire.device_id,
                key_id: wire.dev_key_id,
            },
            MessageKind::PleaseSign => Args::PleaseSign {
                signing_key: wire.signing_key,
                sig: wire.sig,
                device_type: wire.dev_type,
                device_description: wire.dev_desc,
            },
            MessageKind::Done => Args::Done {
                merkle_triple: wire.merkle_triple,
            },
        }
    }
}

/// Integrity-protected payload of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub args: Args,
    /// Authentication tag, once computed.
    pub mac: Option<MacTag>,
}

impl Body {
    /// Creates an unauthenticated body.
    pub fn new(args: Args) -> Self {
        Self { args, mac: None }
    }

    pub fn kind(&self) -> MessageKind {
        self.args.kind()
    }

    /// Wire name, derived from the args tag.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn to_wire(&self) -> WireBody {
        WireBody {
            name: self.name().to_string(),
            args: self.args.to_wire(),
            mac: self.mac.map(|tag| tag.0.to_vec()).unwrap_or_default(),
        }
    }

    /// Encodes the body to its text wire form.
    pub fn encode(&self) -> Result<String, EncodeError> {
        self.to_wire().encode()
    }

    /// Decodes a body from its text wire form.
    pub fn decode(text: &str) -> Result<Self, KexError> {
        Self::try_from(WireBody::decode(text)?)
    }
}

impl TryFrom<WireBody> for Body {
    type Error = KexError;

    fn try_from(wire: WireBody) -> Result<Self, Self::Error> {
        let kind =
            MessageKind::from_name(&wire.name).ok_or(KexError::UnknownMessageKind(wire.name))?;
        let mac = match wire.mac.len() {
            0 => None,
            _ => Some(MacTag::from_slice(&wire.mac).ok_or_else(|| {
                DecodeError::InvalidField {
                    field: "mac",
                    reason: format!("expected {} bytes, got {}", mac::MAC_LEN, wire.mac.len()),
                }
            })?),
        };
        Ok(Self {
            args: Args::from_wire(kind, wire.args),
            mac,
        })
    }
}

// =============================================================================
// MSG
// =============================================================================

/// A complete protocol message: metadata plus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Msg {
    pub meta: Meta,
    pub body: Body,
}

impl Msg {
    /// Builds an unauthenticated message from the session context.
    pub fn new(ctx: &Context, args: Args) -> Self {
        Self {
            meta: ctx.meta.clone(),
            body: Body::new(args),
        }
    }

    /// MAC of this message keyed by its own strong id. Any tag already set is
    /// excluded from the input.
    pub fn compute_mac(&self) -> Result<MacTag, EncodeError> {
        mac::compute_mac(&self.meta, &self.body.to_wire(), &self.meta.strong_id)
    }

    /// Attaches the MAC.
    pub fn seal(mut self) -> Result<Self, EncodeError> {
        self.body.mac = Some(self.compute_mac()?);
        Ok(self)
    }

    /// Checks the carried MAC against `key`.
    pub fn verify(&self, key: &StrongId) -> Result<(), KexError> {
        mac::verify_mac(&self.meta, &self.body.to_wire(), key)
    }
}
