//! The packer - classifies values and writes them into pooled buffers.

use tracing::trace;

use crate::buffer::{BufferPool, Packed};
use crate::classify::Classifier;
use crate::config::PackConfig;
use crate::error::{Error, Result};
use crate::object::Arena;
use crate::value::Value;

use super::writer::Writer;

/// Encodes values into MessagePack.
///
/// Output buffers come from a [`BufferPool`]; by default the calling
/// thread's pool. Several values packed in one call are written back to
/// back into the same buffer with no separator.
///
/// # Example
///
/// ```
/// use msgpack_bridge::{Packer, PackConfig, Value};
///
/// let packer = Packer::new(PackConfig::default());
/// let packed = packer.pack(&[Value::from(1), Value::from("two")])?;
///
/// assert_eq!(&packed[..], b"\x01\xa3two");
/// # Ok::<(), msgpack_bridge::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Packer {
    config: PackConfig,
    pool: BufferPool,
}

impl Packer {
    /// Creates a packer that draws buffers from the thread's default pool.
    pub fn new(config: PackConfig) -> Self {
        Self::with_pool(config, BufferPool::thread_default())
    }

    /// Creates a packer that draws buffers from `pool`.
    pub fn with_pool(config: PackConfig, pool: BufferPool) -> Self {
        Self { config, pool }
    }

    /// Packs `values` back to back into one buffer.
    ///
    /// Fails without producing output if any value cannot be classified or
    /// written; the buffer goes back to the pool.
    pub fn pack(&self, values: &[Value]) -> Result<Packed> {
        let mut out = Packed::take(&self.pool);
        let mut arena = Arena::new();

        for value in values {
            arena.clear();
            let root = Classifier::new(&mut arena, self.config.max_depth()).classify(value)?;
            let object = arena
                .get(root)
                .ok_or(Error::UnknownObjectType { index: root })?;
            Writer::new(out.buf_mut(), self.config.wire_format()).write(&arena, object)?;
        }

        trace!(values = values.len(), bytes = out.len(), "packed values");
        Ok(out)
    }

    /// Packs a single value.
    pub fn pack_value(&self, value: &Value) -> Result<Packed> {
        self.pack(std::slice::from_ref(value))
    }

    /// Returns the configuration used by this packer.
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Returns the pool this packer draws buffers from.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }
}

impl Default for Packer {
    fn default() -> Self {
        Self::new(PackConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolConfig, WireFormat};
    use crate::value::Map;

    fn private_packer() -> Packer {
        Packer::with_pool(PackConfig::default(), BufferPool::new(PoolConfig::default()))
    }

    #[test]
    fn test_pack_nothing() {
        let packed = private_packer().pack(&[]).unwrap();
        assert!(packed.is_empty());
    }

    #[test]
    fn test_pack_scalars() {
        let packer = private_packer();
        assert_eq!(&packer.pack_value(&Value::Null).unwrap()[..], [0xc0]);
        assert_eq!(&packer.pack_value(&Value::Undefined).unwrap()[..], [0xc0]);
        assert_eq!(&packer.pack_value(&Value::Bool(true)).unwrap()[..], [0xc3]);
        assert_eq!(&packer.pack_value(&Value::from(3.0)).unwrap()[..], [0x03]);
        assert_eq!(&packer.pack_value(&Value::from(-3.0)).unwrap()[..], [0xfd]);
        assert_eq!(packer.pack_value(&Value::from(3.5)).unwrap()[0], 0xcb);
    }

    #[test]
    fn test_pack_concatenates() {
        let packer = private_packer();
        let packed = packer
            .pack(&[Value::from(1), Value::Null, Value::from("a")])
            .unwrap();
        assert_eq!(&packed[..], [0x01, 0xc0, 0xa1, b'a']);
    }

    #[test]
    fn test_pack_map() {
        let map: Map = [("a", Value::from(1)), ("b", Value::Bool(false))]
            .into_iter()
            .collect();
        let packed = private_packer().pack_value(&Value::Map(map)).unwrap();
        assert_eq!(&packed[..], [0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0xc2]);
    }

    #[test]
    fn test_failure_returns_buffer_to_pool() {
        let packer = Packer::with_pool(
            PackConfig::default().with_max_depth(2),
            BufferPool::new(PoolConfig::default()),
        );
        let deep = Value::Array(vec![Value::Array(vec![Value::Null])]);

        let err = packer.pack(&[Value::Null, deep]).unwrap_err();
        assert!(matches!(err, Error::Classification { depth: 3 }));
        assert_eq!(packer.pool().len(), 1);
    }

    #[test]
    fn test_modern_wire_format_uses_bin() {
        let packer = Packer::with_pool(
            PackConfig::default().with_wire_format(WireFormat::Modern),
            BufferPool::new(PoolConfig::default()),
        );
        let packed = packer
            .pack_value(&Value::Buffer(bytes::Bytes::from_static(b"\x00\x01")))
            .unwrap();
        assert_eq!(&packed[..], [0xc4, 0x02, 0x00, 0x01]);
    }
}
