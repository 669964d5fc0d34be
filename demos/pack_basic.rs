//! Packs a few values, prints the encoding, and decodes it again.
//!
//! Run with:
//!     cargo run --example pack_basic

use msgpack_bridge::{Map, Unpacked, Value, pack, unpack};

fn main() -> msgpack_bridge::Result<()> {
    let map: Map = [
        ("name", Value::from("bridge")),
        ("version", Value::from(1)),
        ("ratio", Value::from(0.5)),
        ("tags", Value::Array(vec![Value::from("fast"), Value::Null])),
    ]
    .into_iter()
    .collect();

    let packed = pack(&[Value::Map(map), Value::Bool(true)])?;
    let hex: Vec<String> = packed.iter().map(|b| format!("{b:02x}")).collect();
    println!("{} bytes: {}", packed.len(), hex.join(" "));

    let mut data = packed.into_bytes();
    while !data.is_empty() {
        match unpack(data.clone())? {
            Unpacked::Value {
                value,
                bytes_remaining,
            } => {
                println!("{value:?} ({bytes_remaining} bytes left)");
                data = data.slice(data.len() - bytes_remaining..);
            }
            Unpacked::Incomplete => break,
        }
    }
    Ok(())
}
