//! The MessagePack object tree.
//!
//! - [`Object`] - One node of the tree
//! - [`Raw`] - A raw (string or binary) payload
//! - [`Arena`] - Call-scoped storage for nodes and text payloads
//! - [`ObjectTree`] - A completed tree and its arena

mod arena;

use bytes::Bytes;

pub use arena::{Arena, ObjectTree};

/// Whether a raw payload came from text or from a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKind {
    /// Text (strings, dates, str-family tags on the wire).
    Text,
    /// Opaque bytes (byte buffers, bin-family tags on the wire).
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawData {
    /// Bytes copied into the arena heap.
    Heap { start: usize, len: usize },
    /// Bytes borrowed from a reference-counted buffer.
    Shared(Bytes),
}

/// A raw payload. Resolve its bytes with [`Arena::raw_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw {
    pub(crate) data: RawData,
    pub(crate) kind: RawKind,
}

impl Raw {
    pub(crate) fn shared(bytes: Bytes, kind: RawKind) -> Self {
        Self {
            data: RawData::Shared(bytes),
            kind,
        }
    }

    /// Returns the payload kind.
    pub fn kind(&self) -> RawKind {
        self.kind
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        match &self.data {
            RawData::Heap { len, .. } => *len,
            RawData::Shared(bytes) => bytes.len(),
        }
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One MessagePack object.
///
/// Containers do not own their children: they name a contiguous block of
/// arena slots. An array of `len` elements occupies `len` slots starting at
/// `first`; a map of `len` entries occupies `2 * len` slots holding each key
/// followed by its value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// A reserved slot that was never filled.
    Vacant,
    /// nil.
    Nil,
    /// true / false.
    Boolean(bool),
    /// A non-negative integer of any wire width.
    PositiveInteger(u64),
    /// A negative (or, from the packer, zero) integer of any wire width.
    NegativeInteger(i64),
    /// float32 or float64, widened.
    Float(f64),
    /// A raw byte string.
    Raw(Raw),
    /// An array.
    Array {
        /// Arena index of the first element.
        first: usize,
        /// Number of elements.
        len: usize,
    },
    /// A map.
    Map {
        /// Arena index of the first key.
        first: usize,
        /// Number of key/value pairs.
        len: usize,
    },
}

impl Object {
    /// Number of arena slots the node's children occupy.
    pub(crate) fn slot_count(&self) -> usize {
        match self {
            Object::Array { len, .. } => *len,
            Object::Map { len, .. } => len.saturating_mul(2),
            _ => 0,
        }
    }
}
