//! Configuration for packing, unpacking and buffer pooling.
//!
//! - [`PoolConfig`] - Output buffer pool sizing and eviction
//! - [`PackConfig`] - Depth guard and wire format for encoding
//! - [`UnpackConfig`] - Decode limits and raw payload projection
//!
//! # Example
//!
//! ```
//! use msgpack_bridge::{PackConfig, UnpackConfig, WireFormat};
//!
//! let pack = PackConfig::default().with_wire_format(WireFormat::Modern);
//! let unpack = UnpackConfig::default().with_max_depth(Some(64));
//!
//! pack.validate()?;
//! unpack.validate()?;
//! # Ok::<(), msgpack_bridge::Error>(())
//! ```

use crate::error::{Error, Result};

/// Default initial capacity of a pooled output buffer (8 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Default number of idle buffers the pool retains.
pub const DEFAULT_MAX_POOLED: usize = 50_000;

/// Buffers that grew beyond `initial_capacity * factor` are freed on release.
pub const DEFAULT_OVERSIZE_FACTOR: usize = 5;

/// Default classifier depth guard.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Sizing and eviction policy for a [`BufferPool`](crate::BufferPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolConfig {
    initial_capacity: usize,
    max_pooled: usize,
    oversize_factor: usize,
}

impl PoolConfig {
    /// Creates a new pool configuration.
    ///
    /// Returns error if the initial capacity or oversize factor is zero.
    pub fn new(initial_capacity: usize, max_pooled: usize, oversize_factor: usize) -> Result<Self> {
        let config = Self {
            initial_capacity,
            max_pooled,
            oversize_factor,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the capacity freshly allocated buffers start with.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the maximum number of idle buffers kept for reuse.
    pub fn with_max_pooled(mut self, max: usize) -> Self {
        self.max_pooled = max;
        self
    }

    /// Sets the growth factor past which a buffer is freed instead of pooled.
    pub fn with_oversize_factor(mut self, factor: usize) -> Self {
        self.oversize_factor = factor;
        self
    }

    /// Returns the initial buffer capacity.
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Returns the maximum number of pooled buffers.
    pub fn max_pooled(&self) -> usize {
        self.max_pooled
    }

    /// Returns the oversize factor.
    pub fn oversize_factor(&self) -> usize {
        self.oversize_factor
    }

    /// Capacity above which a returned buffer is freed.
    pub fn oversize_threshold(&self) -> usize {
        self.initial_capacity.saturating_mul(self.oversize_factor)
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(Error::InvalidConfig {
                message: "initial_capacity must be non-zero",
            });
        }
        if self.oversize_factor == 0 {
            return Err(Error::InvalidConfig {
                message: "oversize_factor must be non-zero",
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_BUFFER_SIZE,
            max_pooled: DEFAULT_MAX_POOLED,
            oversize_factor: DEFAULT_OVERSIZE_FACTOR,
        }
    }
}

/// How raw payloads are tagged on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WireFormat {
    /// Every raw payload uses fixraw/raw16/raw32 (0xa0, 0xda, 0xdb).
    ///
    /// Readable by decoders that predate the str8 and bin types.
    #[default]
    Legacy,
    /// Text uses fixstr/str8/str16/str32, byte buffers use bin8/bin16/bin32.
    Modern,
}

/// Configuration for the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackConfig {
    max_depth: usize,
    wire_format: WireFormat,
}

impl PackConfig {
    /// Sets the classifier depth guard.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the wire format for raw payloads.
    pub fn with_wire_format(mut self, format: WireFormat) -> Self {
        self.wire_format = format;
        self
    }

    /// Returns the classifier depth guard.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the wire format.
    pub fn wire_format(&self) -> WireFormat {
        self.wire_format
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::InvalidConfig {
                message: "max_depth must be non-zero",
            });
        }
        Ok(())
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            wire_format: WireFormat::default(),
        }
    }
}

/// How decoded raw payloads become [`Value`](crate::Value)s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RawProjection {
    /// Every raw payload becomes a string; invalid UTF-8 is replaced.
    #[default]
    Text,
    /// Payloads tagged bin8/bin16/bin32 become byte buffers.
    Preserve,
}

/// Configuration for the decoder.
///
/// Nesting is limited to [`DEFAULT_MAX_DEPTH`] levels by default, the same
/// bound the packer uses. Container lengths are unlimited by default and are
/// only bounded by the bytes actually available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnpackConfig {
    max_depth: Option<usize>,
    max_container_len: Option<usize>,
    raw_projection: RawProjection,
}

impl Default for UnpackConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            max_container_len: None,
            raw_projection: RawProjection::default(),
        }
    }
}

impl UnpackConfig {
    /// Limits container nesting.
    ///
    /// `None` removes the limit. Projection recurses once per nesting level,
    /// so only lift it for trusted input.
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Limits the declared element count of any single array or map.
    pub fn with_max_container_len(mut self, len: Option<usize>) -> Self {
        self.max_container_len = len;
        self
    }

    /// Sets how raw payloads are projected.
    pub fn with_raw_projection(mut self, projection: RawProjection) -> Self {
        self.raw_projection = projection;
        self
    }

    /// Returns the nesting limit, if any.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Returns the container length limit, if any.
    pub fn max_container_len(&self) -> Option<usize> {
        self.max_container_len
    }

    /// Returns the raw projection mode.
    pub fn raw_projection(&self) -> RawProjection {
        self.raw_projection
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(Error::InvalidConfig {
                message: "max_depth must be non-zero when set",
            });
        }
        Ok(())
    }
}
