//! The dynamic value model.
//!
//! - [`Value`] - Everything the codec can pack or produce when unpacking
//! - [`Map`] - Insertion-ordered mapping with overwrite-in-place semantics
//! - [`ToValue`] - Conversion hook consulted before packing an object
//! - [`DateLike`] - Values packed through their ISO-8601 representation

mod map;

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use bytes::Bytes;

pub use map::Map;

/// An object that converts itself to another value before being packed.
///
/// The packer calls [`ToValue::to_value`] and packs the result in place of
/// the object; the object itself is never traversed.
pub trait ToValue {
    /// Returns the value to pack in place of `self`.
    fn to_value(&self) -> Value;
}

/// A date/time value.
///
/// Dates are packed as raw text holding their ISO-8601 form.
pub trait DateLike {
    /// Returns the ISO-8601 representation, e.g. `2011-10-05T14:48:00.000Z`.
    fn to_iso_string(&self) -> String;
}

/// A dynamically typed value.
///
/// Numbers carry no integer/float distinction; the packer infers it from
/// whether the value is integral. [`Value::Shared`] lets a value graph refer
/// to the same node more than once, which is also how cyclic graphs are
/// expressed.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value. Packs as nil.
    #[default]
    Undefined,
    /// Null. Packs as nil; nil always unpacks to `Null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// UTF-8 text.
    String(String),
    /// Date, packed as its ISO-8601 string.
    Date(Rc<dyn DateLike>),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Opaque byte buffer.
    Buffer(Bytes),
    /// Insertion-ordered mapping.
    Map(Map),
    /// Object exposing a conversion hook.
    Object(Rc<dyn ToValue>),
    /// Shared, mutable reference to another value.
    Shared(Rc<RefCell<Value>>),
}

impl Value {
    /// Wraps a value in a shared cell.
    pub fn shared(value: Value) -> Rc<RefCell<Value>> {
        Rc::new(RefCell::new(value))
    }

    /// Returns true for `Null` and `Undefined`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes, if this is a buffer.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Buffer(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping, if this is a map.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

// Numbers compare with SameValueZero semantics so `Value` can be a map key:
// NaN equals itself and the two zeros are equal. Host objects compare by
// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Buffer(a), Value::Buffer(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (Value::Shared(a), Value::Shared(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Undefined | Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => {
                let bits = if *n == 0.0 {
                    0
                } else if n.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    n.to_bits()
                };
                bits.hash(state);
            }
            Value::String(s) => s.hash(state),
            Value::Date(d) => (Rc::as_ptr(d) as *const () as usize).hash(state),
            Value::Array(items) => items.hash(state),
            Value::Buffer(b) => b.hash(state),
            Value::Map(map) => map.hash(state),
            Value::Object(o) => (Rc::as_ptr(o) as *const () as usize).hash(state),
            Value::Shared(cell) => (Rc::as_ptr(cell) as usize).hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Date(d) => write!(f, "Date({})", d.to_iso_string()),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Buffer(b) => write!(f, "Buffer({b:?})"),
            Value::Map(map) => fmt::Debug::fmt(map, f),
            Value::Object(_) => write!(f, "Object(..)"),
            // Shared cells may be cyclic
            Value::Shared(cell) => write!(f, "Shared({:p})", Rc::as_ptr(cell)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Buffer(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Rc<RefCell<Value>>> for Value {
    fn from(cell: Rc<RefCell<Value>>) -> Self {
        Value::Shared(cell)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_equality_is_same_value_zero() {
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
        assert_ne!(Value::Number(1.0), Value::Number(1.5));
    }

    #[test]
    fn test_null_and_undefined_differ() {
        assert_ne!(Value::Null, Value::Undefined);
        assert!(Value::Null.is_null());
        assert!(Value::Undefined.is_null());
    }

    #[test]
    fn test_shared_compares_by_identity() {
        let a = Value::shared(Value::Null);
        let b = Value::shared(Value::Null);
        assert_eq!(Value::Shared(a.clone()), Value::Shared(a));
        assert_ne!(Value::Shared(b), Value::Shared(Value::shared(Value::Null)));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(3), Value::Number(3.0));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(None::<bool>), Value::Null);
        let arr: Value = vec![Value::from(true)].into_iter().collect();
        assert_eq!(arr.as_array().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn test_debug_does_not_follow_shared() {
        let cell = Value::shared(Value::Null);
        *cell.borrow_mut() = Value::Array(vec![Value::Shared(cell.clone())]);
        let s = format!("{:?}", Value::Shared(cell.clone()));
        assert!(s.starts_with("Shared("));
        *cell.borrow_mut() = Value::Null;
    }
}
