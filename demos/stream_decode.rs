//! Decodes values from a stream that arrives in small pieces.
//!
//! Run with:
//!     cargo run --example stream_decode

use std::io::Cursor;

use msgpack_bridge::{Unpacker, Value, pack};

fn main() -> msgpack_bridge::Result<()> {
    let values: Vec<Value> = (0..5)
        .map(|i| Value::Array(vec![Value::from(i), Value::from(format!("item {i}"))]))
        .collect();
    let packed = pack(&values)?;

    // Push three bytes at a time
    let mut unpacker = Unpacker::default();
    for piece in packed.chunks(3) {
        for value in unpacker.push(piece.to_vec())? {
            println!("push -> {value:?} (offset {})", unpacker.offset());
        }
    }
    println!("leftover bytes: {}", unpacker.finish());

    // Or let the iterator drive a reader
    let reader = Cursor::new(packed.to_vec());
    for value in Unpacker::default().decode_reader(reader) {
        println!("read -> {:?}", value?);
    }
    Ok(())
}
