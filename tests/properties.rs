// Property tests for the codec
// Tests cover: round trips of generated values, strict prefixes, arbitrary
// stream splits, arbitrary input never panicking

use bytes::Bytes;
use msgpack_bridge::{Map, Unpacked, Unpacker, Value, pack, unpack};
use proptest::prelude::*;

/// Values that survive a round trip unchanged.
fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-(1i64 << 53)..=(1i64 << 53)).prop_map(|n| Value::Number(n as f64)),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::Number),
        ".{0,40}".prop_map(Value::from),
    ];

    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{0,6}", inner), 0..8)
                .prop_map(|entries| Value::Map(entries.into_iter().collect::<Map>())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_round_trip(value in arb_value()) {
        let packed = pack(std::slice::from_ref(&value)).unwrap();
        let unpacked = unpack(packed.into_bytes()).unwrap();

        match unpacked {
            Unpacked::Value { value: decoded, bytes_remaining } => {
                prop_assert_eq!(bytes_remaining, 0);
                // -0.0 comes back as 0, which compares equal
                prop_assert_eq!(decoded, value);
            }
            Unpacked::Incomplete => prop_assert!(false, "complete value reported incomplete"),
        }
    }

    #[test]
    fn prop_strict_prefix_is_incomplete(value in arb_value(), cut in any::<prop::sample::Index>()) {
        let packed = pack(&[value]).unwrap();
        let end = cut.index(packed.len());

        let unpacked = unpack(Bytes::copy_from_slice(&packed[..end])).unwrap();
        prop_assert!(unpacked.is_incomplete());
    }

    #[test]
    fn prop_split_stream_matches(
        values in prop::collection::vec(arb_value(), 1..5),
        sizes in prop::collection::vec(1usize..16, 1..32),
    ) {
        let packed = pack(&values).unwrap();

        let mut unpacker = Unpacker::default();
        let mut decoded = Vec::new();
        let mut pos = 0;
        let mut sizes = sizes.iter().cycle();
        while pos < packed.len() {
            let end = (pos + sizes.next().copied().unwrap_or(1)).min(packed.len());
            decoded.extend(unpacker.push(packed[pos..end].to_vec()).unwrap());
            pos = end;
        }

        prop_assert_eq!(unpacker.finish(), 0);
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn prop_arbitrary_input_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = unpack(data.clone());

        let mut unpacker = Unpacker::default();
        for piece in data.chunks(7) {
            if unpacker.push(piece.to_vec()).is_err() {
                break;
            }
        }
    }
}
