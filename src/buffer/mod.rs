//! Output buffer management.
//!
//! Encoded output is written into buffers borrowed from a [`BufferPool`].
//! The [`Packed`] handle returned to callers gives the buffer back when it
//! is dropped, so steady-state packing does not allocate.

mod pool;

pub use pool::{BufferPool, Packed, PoolStats};
