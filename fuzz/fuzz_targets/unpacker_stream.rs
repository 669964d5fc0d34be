#![no_main]

use libfuzzer_sys::fuzz_target;
use msgpack_bridge::{UnpackConfig, Unpacker, Value};

fuzz_target!(|input: (u8, Vec<u8>)| {
    let (split, data) = input;
    let split = (split as usize).max(1);
    let config = UnpackConfig::default().with_max_depth(Some(256));

    // Whole-buffer decode
    let mut whole = Unpacker::new(config);
    let whole_result = whole.push(data.clone());

    // Same bytes in pieces
    let mut pieces = Unpacker::new(config);
    let mut values: Vec<Value> = Vec::new();
    let mut failed = false;
    for piece in data.chunks(split) {
        match pieces.push(piece.to_vec()) {
            Ok(v) => values.extend(v),
            Err(_) => {
                failed = true;
                break;
            }
        }
    }

    // Splitting never changes the outcome
    match whole_result {
        Ok(expected) => {
            assert!(!failed);
            assert_eq!(values, expected);
            assert_eq!(whole.pending_len(), pieces.pending_len());
        }
        Err(_) => assert!(failed),
    }
});
