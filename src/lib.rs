//! msgpack-bridge
//!
//! A codec between a dynamic value model and MessagePack.
//!
//! `msgpack-bridge` packs [`Value`] graphs (the shapes a scripting host
//! hands over: null, booleans, doubles, strings, dates, byte buffers,
//! arrays, maps, objects with a conversion hook) into MessagePack, and
//! decodes MessagePack back into values. It is meant as the core of a
//! language binding:
//!
//! - packing writes into pooled buffers, so steady-state encoding does not
//!   allocate output storage
//! - decoding reports an incomplete input instead of failing, so callers can
//!   wait for more bytes
//! - an [`Unpacker`] session resumes a half-parsed value where it stopped
//!
//! The crate intentionally:
//! - does NOT support extension types
//! - does NOT do network or file I/O (beyond reading a caller's [`std::io::Read`])
//! - does NOT map values onto Rust structs
//!
//! # Pack and unpack
//!
//! ```
//! use msgpack_bridge::{pack, unpack, Map, Unpacked, Value};
//!
//! let map: Map = [
//!     ("a", Value::from(1)),
//!     ("b", Value::Array(vec![Value::Bool(true), Value::Null])),
//! ]
//! .into_iter()
//! .collect();
//!
//! let packed = pack(&[Value::Map(map.clone())])?;
//! let unpacked = unpack(packed.into_bytes())?;
//!
//! assert_eq!(
//!     unpacked,
//!     Unpacked::Value { value: Value::Map(map), bytes_remaining: 0 }
//! );
//! # Ok::<(), msgpack_bridge::Error>(())
//! ```
//!
//! # Streaming
//!
//! ```
//! use msgpack_bridge::{pack, Unpacker, Value};
//!
//! let packed = pack(&[Value::from("hello"), Value::from(-7)])?;
//! let (head, tail) = packed.split_at(3);
//!
//! let mut unpacker = Unpacker::default();
//! assert!(unpacker.push(head.to_vec())?.is_empty());
//! assert_eq!(unpacker.push(tail.to_vec())?, [Value::from("hello"), Value::from(-7)]);
//! # Ok::<(), msgpack_bridge::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod codec;
mod config;
mod error;
mod object;
mod packer;
mod unpack;
mod value;

mod classify; // internal (value -> object tree)

//
// Public surface
//

pub use buffer::{BufferPool, Packed, PoolStats};
pub use codec::{MsgPack, pack};
pub use config::{
    DEFAULT_BUFFER_SIZE, DEFAULT_MAX_DEPTH, DEFAULT_MAX_POOLED, DEFAULT_OVERSIZE_FACTOR,
    PackConfig, PoolConfig, RawProjection, UnpackConfig, WireFormat,
};
pub use error::{Error, Result};
pub use object::{Arena, Object, ObjectTree, Raw, RawKind};
pub use packer::Packer;
pub use unpack::{Step, Unpacked, Unpacker, ValueIter, unpack, unpack_step, unpack_with};
pub use value::{DateLike, Map, ToValue, Value};
