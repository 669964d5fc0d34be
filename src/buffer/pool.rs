//! Output buffer pool and the handle that returns buffers to it.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::PoolConfig;

/// Counters describing how a [`BufferPool`] has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers allocated because the pool was empty.
    pub allocated: u64,
    /// Buffers handed out from the pool.
    pub reused: u64,
    /// Returned buffers freed because they outgrew the oversize threshold.
    pub evicted: u64,
    /// Returned buffers freed because the pool was full.
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct State {
    idle: Vec<Vec<u8>>,
    stats: PoolStats,
}

#[derive(Debug)]
struct Inner {
    config: PoolConfig,
    state: Mutex<State>,
}

/// A bounded stack of reusable output buffers.
///
/// Cloning the handle shares the same pool. Buffers are handed out by
/// [`Packer`](crate::Packer) and come back when the [`Packed`] output that
/// owns them is dropped.
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<Inner>,
}

impl BufferPool {
    /// Creates an empty pool.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Returns this thread's default pool.
    pub fn thread_default() -> Self {
        THREAD_BUFFER_POOL.with(Clone::clone)
    }

    /// Takes a buffer from the pool or allocates a new one.
    pub(crate) fn take(&self) -> Vec<u8> {
        let mut state = self.inner.state.lock();
        match state.idle.pop() {
            Some(buf) => {
                state.stats.reused += 1;
                trace!(capacity = buf.capacity(), "reusing pooled buffer");
                buf
            }
            None => {
                state.stats.allocated += 1;
                drop(state);
                trace!(
                    capacity = self.inner.config.initial_capacity(),
                    "allocating output buffer"
                );
                Vec::with_capacity(self.inner.config.initial_capacity())
            }
        }
    }

    /// Returns a buffer to the pool, or frees it if it is oversized or the
    /// pool is at capacity.
    pub(crate) fn release(&self, mut buf: Vec<u8>) {
        let config = &self.inner.config;
        let mut state = self.inner.state.lock();

        if buf.capacity() > config.oversize_threshold() {
            state.stats.evicted += 1;
            debug!(
                capacity = buf.capacity(),
                threshold = config.oversize_threshold(),
                "freeing oversized output buffer"
            );
            return;
        }

        if state.idle.len() >= config.max_pooled() {
            state.stats.discarded += 1;
            debug!(pooled = state.idle.len(), "buffer pool full, freeing buffer");
            return;
        }

        buf.clear();
        state.idle.push(buf);
    }

    /// Number of idle buffers currently held.
    pub fn len(&self) -> usize {
        self.inner.state.lock().idle.len()
    }

    /// Returns true if no idle buffers are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        self.inner.state.lock().stats
    }

    /// Returns the pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Frees every idle buffer.
    pub fn clear(&self) {
        self.inner.state.lock().idle.clear();
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

thread_local! {
    static THREAD_BUFFER_POOL: BufferPool = BufferPool::default();
}

/// Encoded MessagePack output.
///
/// Dereferences to the encoded bytes. Dropping it hands the backing buffer
/// back to the pool it came from.
pub struct Packed {
    data: Vec<u8>,
    pool: BufferPool,
}

impl Packed {
    /// Takes a buffer from `pool` to encode into.
    pub(crate) fn take(pool: &BufferPool) -> Self {
        Self {
            data: pool.take(),
            pool: pool.clone(),
        }
    }

    pub(crate) fn buf_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Returns the encoded bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of encoded bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing was encoded.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Converts the output into [`Bytes`].
    ///
    /// No copy is made; the buffer returns to the pool when the last clone
    /// of the returned `Bytes` is dropped.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from_owner(self)
    }

    /// Detaches the buffer from the pool and returns it.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}

impl Deref for Packed {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for Packed {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Packed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packed({} bytes)", self.data.len())
    }
}

impl Drop for Packed {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        if data.capacity() > 0 {
            self.pool.release(data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(max_pooled: usize) -> BufferPool {
        BufferPool::new(
            PoolConfig::default()
                .with_initial_capacity(64)
                .with_max_pooled(max_pooled),
        )
    }

    #[test]
    fn test_take_allocates_initial_capacity() {
        let pool = small_pool(4);
        let buf = pool.take();
        assert!(buf.capacity() >= 64);
        assert_eq!(pool.stats().allocated, 1);
    }

    #[test]
    fn test_buffer_reuse() {
        let pool = small_pool(4);
        {
            let mut packed = Packed::take(&pool);
            packed.buf_mut().extend_from_slice(b"test data");
        }
        assert_eq!(pool.len(), 1);

        let packed = Packed::take(&pool);
        // Returned buffers come back empty with their capacity
        assert!(packed.is_empty());
        assert!(packed.data.capacity() >= 64);
        assert_eq!(pool.stats().reused, 1);
        assert_eq!(pool.stats().allocated, 1);
    }

    #[test]
    fn test_oversized_buffer_is_evicted() {
        let pool = small_pool(4);
        {
            let mut packed = Packed::take(&pool);
            packed.buf_mut().extend_from_slice(&[0u8; 64 * 5 + 1]);
        }
        assert!(pool.is_empty());
        assert_eq!(pool.stats().evicted, 1);
    }

    #[test]
    fn test_full_pool_discards() {
        let pool = small_pool(1);
        let a = Packed::take(&pool);
        let b = Packed::take(&pool);
        drop(a);
        drop(b);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_into_vec_detaches() {
        let pool = small_pool(4);
        let mut packed = Packed::take(&pool);
        packed.buf_mut().push(0xc0);
        let vec = packed.into_vec();
        assert_eq!(vec, vec![0xc0]);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_into_bytes_releases_on_last_drop() {
        let pool = small_pool(4);
        let mut packed = Packed::take(&pool);
        packed.buf_mut().extend_from_slice(b"\x93\x01\x02\x03");

        let bytes = packed.into_bytes();
        let clone = bytes.clone();
        drop(bytes);
        assert!(pool.is_empty());
        assert_eq!(&clone[..], b"\x93\x01\x02\x03");

        drop(clone);
        assert_eq!(pool.len(), 1);
    }
}
