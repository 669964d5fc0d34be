#![no_main]

use libfuzzer_sys::fuzz_target;
use msgpack_bridge::{UnpackConfig, Unpacked, pack, unpack_with};

fuzz_target!(|data: Vec<u8>| {
    let config = UnpackConfig::default().with_max_depth(Some(256));
    let len = data.len();

    let Ok(Unpacked::Value {
        value,
        bytes_remaining,
    }) = unpack_with(data, &config)
    else {
        return;
    };
    assert!(bytes_remaining < len);

    // Decoded values always re-pack, and re-decode to an equal value
    let packed = pack(std::slice::from_ref(&value)).expect("decoded value should pack");
    let again = unpack_with(packed.into_bytes(), &config).expect("re-packed value should decode");
    assert_eq!(again.bytes_remaining(), 0);
    assert_eq!(again.into_value(), Some(value));
});
