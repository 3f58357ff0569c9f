//! Property tests for the body codec and the MAC.
//!
//! Bodies are generated over every message kind, with and without a tag,
//! including empty strings and zeroed ids.

use kex_protocol::{Args, Body, Context, Direction, KexError, MacTag, Msg, StrongId, WeakId};
use proptest::prelude::*;
use shared_types::{DeviceId, Kid, MerkleTriple, SigningPublicKey, Uid};

fn arb_merkle_triple() -> impl Strategy<Value = MerkleTriple> {
    (any::<i64>(), prop::collection::vec(any::<u8>(), 0..48), ".{0,24}").prop_map(
        |(seqno, link_id, sig_id)| MerkleTriple {
            seqno,
            link_id,
            sig_id,
        },
    )
}

fn arb_args() -> impl Strategy<Value = Args> {
    prop_oneof![
        prop::array::uniform32(any::<u8>()).prop_map(|b| Args::StartKex {
            strong_id: StrongId(b)
        }),
        Just(Args::StartReverseKex),
        (
            prop::array::uniform16(any::<u8>()),
            prop::collection::vec(any::<u8>(), 0..40)
        )
            .prop_map(|(d, k)| Args::Hello {
                device_id: DeviceId(d),
                key_id: Kid(k),
            }),
        (
            prop::array::uniform32(any::<u8>()),
            ".{0,64}",
            ".{0,16}",
            ".{0,32}"
        )
            .prop_map(|(key, sig, device_type, device_description)| Args::PleaseSign {
                signing_key: SigningPublicKey(key),
                sig,
                device_type,
                device_description,
            }),
        arb_merkle_triple().prop_map(|merkle_triple| Args::Done { merkle_triple }),
    ]
}

fn arb_body() -> impl Strategy<Value = Body> {
    (arb_args(), prop::option::of(prop::array::uniform32(any::<u8>()))).prop_map(|(args, mac)| {
        Body {
            args,
            mac: mac.map(MacTag),
        }
    })
}

fn ctx(seqno: i64) -> Context {
    let mut ctx = Context::new(
        Uid([1; 16]),
        DeviceId([2; 16]),
        DeviceId([3; 16]),
        StrongId([4; 32]),
        WeakId([5; 16]),
        Direction::Forward,
    );
    ctx.meta.seqno = seqno;
    ctx
}

proptest! {
    #[test]
    fn prop_body_roundtrip(body in arb_body()) {
        let text = body.encode().unwrap();
        prop_assert_eq!(Body::decode(&text).unwrap(), body);
    }

    #[test]
    fn prop_sealed_message_verifies_only_under_its_key(
        args in arb_args(),
        seqno in any::<i64>(),
        other in prop::array::uniform32(any::<u8>()),
    ) {
        prop_assume!(other != [4; 32]);
        let msg = Msg::new(&ctx(seqno), args).seal().unwrap();

        prop_assert!(msg.verify(&StrongId([4; 32])).is_ok());
        prop_assert!(matches!(msg.verify(&StrongId(other)), Err(KexError::MacMismatch)));
    }

    #[test]
    fn prop_decode_never_panics(text in ".{0,128}") {
        let _ = Body::decode(&text);
    }
}
