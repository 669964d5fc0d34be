//! Value classification - maps a [`Value`] graph onto an object tree.
//!
//! Every value is matched once against the closed set of shapes and lands in
//! a pre-reserved arena slot. Container children are reserved as one block
//! before any child is classified, so a container's children stay contiguous
//! no matter how deep they nest.

use crate::error::{Error, Result};
use crate::object::{Arena, Object, Raw, RawKind};
use crate::value::Value;

/// 2^64, the first integral `f64` that does not fit a `u64`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// -2^63, the most negative integral `f64` that fits an `i64`.
const I64_MIN: f64 = -9_223_372_036_854_775_808.0;

/// Classifies values into one arena.
pub(crate) struct Classifier<'a> {
    arena: &'a mut Arena,
    max_depth: usize,
}

impl<'a> Classifier<'a> {
    pub(crate) fn new(arena: &'a mut Arena, max_depth: usize) -> Self {
        Self { arena, max_depth }
    }

    /// Classifies `value` as a new root and returns its arena index.
    pub(crate) fn classify(&mut self, value: &Value) -> Result<usize> {
        let root = self.arena.push(Object::Vacant);
        self.classify_into(root, value, 0)?;
        Ok(root)
    }

    fn classify_into(&mut self, slot: usize, value: &Value, depth: usize) -> Result<()> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(Error::Classification { depth });
        }

        let object = match value {
            Value::Undefined | Value::Null => Object::Nil,
            Value::Bool(b) => Object::Boolean(*b),
            Value::Number(d) => classify_number(*d),
            Value::String(s) => Object::Raw(self.arena.alloc_raw(s.as_bytes(), RawKind::Text)),
            Value::Date(date) => {
                let iso = date.to_iso_string();
                Object::Raw(self.arena.alloc_raw(iso.as_bytes(), RawKind::Text))
            }
            Value::Buffer(bytes) => Object::Raw(Raw::shared(bytes.clone(), RawKind::Binary)),
            Value::Array(items) => {
                let first = self.arena.reserve(items.len());
                for (i, item) in items.iter().enumerate() {
                    self.classify_into(first + i, item, depth)?;
                }
                Object::Array {
                    first,
                    len: items.len(),
                }
            }
            Value::Map(map) => {
                let first = self.arena.reserve(map.len() * 2);
                for (i, (key, val)) in map.iter().enumerate() {
                    self.classify_into(first + 2 * i, key, depth)?;
                    self.classify_into(first + 2 * i + 1, val, depth)?;
                }
                Object::Map {
                    first,
                    len: map.len(),
                }
            }
            Value::Object(hook) => {
                let converted = hook.to_value();
                return self.classify_into(slot, &converted, depth);
            }
            Value::Shared(cell) => {
                let inner = cell.try_borrow().map_err(|_| Error::Serialization {
                    message: "shared value is mutably borrowed".to_owned(),
                })?;
                return self.classify_into(slot, &inner, depth);
            }
        };

        self.arena.set(slot, object);
        Ok(())
    }
}

/// Picks the integer or float representation of a number.
///
/// Non-integral values (and NaN) are floats; positive integral values are
/// unsigned; zero and negative integral values are signed. Integral values
/// outside the 64-bit ranges stay floats.
pub(crate) fn classify_number(d: f64) -> Object {
    if d.trunc() != d {
        Object::Float(d)
    } else if d > 0.0 {
        if d < U64_LIMIT {
            Object::PositiveInteger(d as u64)
        } else {
            Object::Float(d)
        }
    } else if d >= I64_MIN {
        Object::NegativeInteger(d as i64)
    } else {
        Object::Float(d)
    }
}
