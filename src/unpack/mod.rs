//! Decoding direction.
//!
//! - [`unpack_step`] - Parses one value from a buffer into an object tree
//! - [`unpack`] - Parses and projects the first value of a buffer
//! - [`Unpacker`] - Incremental session for values split across pushes
//! - [`ValueIter`] - Values decoded from a [`std::io::Read`] source

mod iter;
mod project;
mod session;
mod template;

use bytes::Bytes;
use tracing::trace;

use crate::config::UnpackConfig;
use crate::error::Result;
use crate::object::ObjectTree;
use crate::value::Value;

pub use iter::ValueIter;
pub use session::Unpacker;

use template::{Progress, Template};

/// Outcome of [`unpack_step`].
#[derive(Debug)]
pub enum Step {
    /// One value consumed the buffer exactly.
    Success(ObjectTree),
    /// One value was parsed and bytes remain after it.
    ExtraBytes(ObjectTree),
    /// The buffer ends before the value does.
    Incomplete,
}

/// Parses one value from `data` starting at `*offset`.
///
/// On success `*offset` moves past the value. On [`Step::Incomplete`] or an
/// error it is left unchanged. An offset at or past the end of `data` is
/// `Incomplete`.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use msgpack_bridge::{unpack_step, Object, Step, UnpackConfig};
///
/// let data = Bytes::from_static(b"\x2a\xc0");
/// let mut offset = 0;
///
/// let Step::ExtraBytes(tree) = unpack_step(&data, &mut offset, &UnpackConfig::default())? else {
///     panic!("expected trailing bytes");
/// };
/// assert_eq!(tree.root(), &Object::PositiveInteger(42));
/// assert_eq!(offset, 1);
/// # Ok::<(), msgpack_bridge::Error>(())
/// ```
pub fn unpack_step(data: &Bytes, offset: &mut usize, config: &UnpackConfig) -> Result<Step> {
    if *offset >= data.len() {
        return Ok(Step::Incomplete);
    }

    let mut off = *offset;
    let mut template = Template::new(*config);
    let root = match template.execute(data, &mut off)? {
        Progress::Complete { root } => root,
        Progress::Incomplete => return Ok(Step::Incomplete),
    };
    *offset = off;

    let tree = ObjectTree::new(template.into_arena(), root);
    if off < data.len() {
        Ok(Step::ExtraBytes(tree))
    } else {
        Ok(Step::Success(tree))
    }
}

/// Result of decoding the first value of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unpacked {
    /// A complete value.
    Value {
        /// The decoded value.
        value: Value,
        /// Bytes left in the buffer after the value.
        bytes_remaining: usize,
    },
    /// The buffer holds only part of a value (or nothing at all).
    Incomplete,
}

impl Unpacked {
    /// Returns the decoded value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Unpacked::Value { value, .. } => Some(value),
            Unpacked::Incomplete => None,
        }
    }

    /// Consumes `self` and returns the decoded value, if any.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Unpacked::Value { value, .. } => Some(value),
            Unpacked::Incomplete => None,
        }
    }

    /// Returns the bytes left after the value; zero when incomplete.
    pub fn bytes_remaining(&self) -> usize {
        match self {
            Unpacked::Value {
                bytes_remaining, ..
            } => *bytes_remaining,
            Unpacked::Incomplete => 0,
        }
    }

    /// Returns true if no complete value was found.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Unpacked::Incomplete)
    }
}

/// Decodes the first value of `data` with the default configuration.
///
/// # Example
///
/// ```
/// use msgpack_bridge::{unpack, Value};
///
/// let unpacked = unpack(&b"\x93\x01\x02\x03\xff"[..])?;
/// assert_eq!(unpacked.bytes_remaining(), 1);
/// assert_eq!(
///     unpacked.into_value(),
///     Some(Value::Array(vec![1.into(), 2.into(), 3.into()]))
/// );
/// # Ok::<(), msgpack_bridge::Error>(())
/// ```
pub fn unpack(data: impl Into<Bytes>) -> Result<Unpacked> {
    unpack_with(data, &UnpackConfig::default())
}

/// Decodes the first value of `data`.
pub fn unpack_with(data: impl Into<Bytes>, config: &UnpackConfig) -> Result<Unpacked> {
    let data = data.into();
    let mut offset = 0;

    let tree = match unpack_step(&data, &mut offset, config)? {
        Step::Success(tree) | Step::ExtraBytes(tree) => tree,
        Step::Incomplete => {
            trace!(len = data.len(), "incomplete value");
            return Ok(Unpacked::Incomplete);
        }
    };

    Ok(Unpacked::Value {
        value: tree.project(config.raw_projection())?,
        bytes_remaining: data.len() - offset,
    })
}
