//! The combined codec surface.
//!
//! [`MsgPack`] bundles a [`Packer`] with decode settings and remembers how
//! many bytes trailed the last decoded value, for callers that only get a
//! single return value per call. The free functions [`pack`] and
//! [`unpack`](crate::unpack()) cover the common case without any setup.

use bytes::Bytes;
use tracing::trace;

use crate::buffer::{BufferPool, Packed};
use crate::config::{PackConfig, UnpackConfig};
use crate::error::{Error, Result};
use crate::packer::Packer;
use crate::unpack::{Unpacked, unpack_with};
use crate::value::Value;

/// Packs `values` back to back using the thread's default pool.
///
/// # Example
///
/// ```
/// use msgpack_bridge::{pack, Value};
///
/// let packed = pack(&[Value::from(3.0), Value::from(3.5), Value::from(-3.0)])?;
/// assert_eq!(packed[0], 0x03);
/// assert_eq!(packed[1], 0xcb);
/// assert_eq!(packed[10], 0xfd);
/// # Ok::<(), msgpack_bridge::Error>(())
/// ```
pub fn pack(values: &[Value]) -> Result<Packed> {
    Packer::default().pack(values)
}

/// A packer and an unpacker behind one handle.
///
/// # Example
///
/// ```
/// use msgpack_bridge::{Map, MsgPack, Value};
///
/// let mut codec = MsgPack::new();
/// let map: Map = [("a", Value::from(1))].into_iter().collect();
///
/// let packed = codec.pack(&[Value::Map(map.clone()), Value::Null])?;
/// let value = codec.unpack(&Value::Buffer(packed.into_bytes()))?;
///
/// assert_eq!(value, Some(Value::Map(map)));
/// assert_eq!(codec.bytes_remaining(), 1);
/// # Ok::<(), msgpack_bridge::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MsgPack {
    packer: Packer,
    unpack_config: UnpackConfig,
    bytes_remaining: usize,
}

impl MsgPack {
    /// Creates a codec with default settings and the thread's default pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if either configuration is invalid.
    pub fn with_config(pack: PackConfig, unpack: UnpackConfig) -> Result<Self> {
        Self::with_pool(pack, unpack, BufferPool::thread_default())
    }

    /// Creates a codec that draws output buffers from `pool`.
    pub fn with_pool(pack: PackConfig, unpack: UnpackConfig, pool: BufferPool) -> Result<Self> {
        pack.validate()?;
        unpack.validate()?;
        Ok(Self {
            packer: Packer::with_pool(pack, pool),
            unpack_config: unpack,
            bytes_remaining: 0,
        })
    }

    /// Packs `values` back to back into one buffer.
    pub fn pack(&self, values: &[Value]) -> Result<Packed> {
        self.packer.pack(values)
    }

    /// Decodes the first value of a [`Value::Buffer`].
    ///
    /// Returns `Ok(None)` if the buffer holds only part of a value. After a
    /// successful decode, [`MsgPack::bytes_remaining`] reports how many bytes
    /// followed it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Type`] if `input` is not a buffer, and parse or limit
    /// errors from decoding.
    pub fn unpack(&mut self, input: &Value) -> Result<Option<Value>> {
        let Value::Buffer(data) = input else {
            return Err(Error::Type {
                expected: "a byte buffer",
            });
        };
        self.unpack_bytes(data.clone())
    }

    /// Decodes the first value of `data`.
    pub fn unpack_bytes(&mut self, data: impl Into<Bytes>) -> Result<Option<Value>> {
        match unpack_with(data, &self.unpack_config)? {
            Unpacked::Value {
                value,
                bytes_remaining,
            } => {
                trace!(bytes_remaining, "unpacked value");
                self.bytes_remaining = bytes_remaining;
                Ok(Some(value))
            }
            Unpacked::Incomplete => Ok(None),
        }
    }

    /// Bytes that followed the value returned by the last successful
    /// [`MsgPack::unpack`]. Left unchanged by incomplete or failed calls.
    pub fn bytes_remaining(&self) -> usize {
        self.bytes_remaining
    }

    /// Returns the packer.
    pub fn packer(&self) -> &Packer {
        &self.packer
    }

    /// Returns the decode settings.
    pub fn unpack_config(&self) -> &UnpackConfig {
        &self.unpack_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolConfig, RawProjection, WireFormat};

    #[test]
    fn test_unpack_rejects_non_buffer() {
        let mut codec = MsgPack::new();
        for input in [Value::Null, Value::from("\u{c0}"), Value::Array(vec![])] {
            let err = codec.unpack(&input).unwrap_err();
            assert!(matches!(err, Error::Type { .. }));
        }
    }

    #[test]
    fn test_bytes_remaining_tracks_last_success() {
        let mut codec = MsgPack::new();
        assert_eq!(codec.unpack_bytes(&b"\x01\x02\x03"[..]).unwrap(), Some(Value::from(1)));
        assert_eq!(codec.bytes_remaining(), 2);

        assert_eq!(codec.unpack_bytes(&b"\x92\x01"[..]).unwrap(), None);
        assert_eq!(codec.bytes_remaining(), 2);

        assert!(codec.unpack_bytes(&b"\xc1"[..]).is_err());
        assert_eq!(codec.bytes_remaining(), 2);

        assert_eq!(codec.unpack_bytes(&b"\xc0"[..]).unwrap(), Some(Value::Null));
        assert_eq!(codec.bytes_remaining(), 0);
    }

    #[test]
    fn test_buffer_round_trip_preserved() {
        let pool = BufferPool::new(PoolConfig::default());
        let mut codec = MsgPack::with_pool(
            PackConfig::default().with_wire_format(WireFormat::Modern),
            UnpackConfig::default().with_raw_projection(RawProjection::Preserve),
            pool.clone(),
        )
        .unwrap();

        let buf = Value::Buffer(Bytes::from_static(b"\x00\xffraw"));
        let packed = codec.pack(&[buf.clone(), Value::from("text")]).unwrap();
        let decoded = codec.unpack_bytes(packed.as_slice().to_vec()).unwrap();
        assert_eq!(decoded, Some(buf));
        assert_eq!(codec.bytes_remaining(), 5);

        drop(packed);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = MsgPack::with_config(
            PackConfig::default(),
            UnpackConfig::default().with_max_depth(Some(0)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
