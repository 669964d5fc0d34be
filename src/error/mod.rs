//! Error types for msgpack-bridge.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while packing or unpacking.
///
/// An incomplete input is *not* an error: decoding reports it through
/// [`Unpacked::Incomplete`](crate::Unpacked::Incomplete) so callers can
/// supply more bytes and try again.
#[derive(Debug, Error)]
pub enum Error {
    /// The classifier hit its depth guard, either because the value graph
    /// is cyclic or because it is nested too deeply.
    #[error("cowardly refusing to pack value nested {depth} levels deep (circular reference?)")]
    Classification {
        /// The depth at which classification was abandoned.
        depth: usize,
    },

    /// Writing the encoded form failed, e.g. a length does not fit the wire.
    #[error("error serializing value: {message}")]
    Serialization {
        /// Description of what could not be written.
        message: String,
    },

    /// An entry point received a value of the wrong shape.
    #[error("type error: expected {expected}")]
    Type {
        /// Description of the accepted input.
        expected: &'static str,
    },

    /// The input is not valid MessagePack.
    #[error("error de-serializing value: unexpected byte 0x{byte:02x} at offset {offset}")]
    Parse {
        /// Offset of the offending byte in the input.
        offset: usize,
        /// The byte that could not be interpreted.
        byte: u8,
    },

    /// An object tree node had no projection. Indicates a decoder bug.
    #[error("unknown object type at node {index}")]
    UnknownObjectType {
        /// Arena index of the node.
        index: usize,
    },

    /// A configured decode limit was exceeded.
    #[error("decode limit exceeded: {what} {actual} (max {max})")]
    LimitExceeded {
        /// Which limit was hit.
        what: &'static str,
        /// The value found in the input.
        actual: usize,
        /// The configured maximum.
        max: usize,
    },

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// An I/O error occurred while reading input data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
