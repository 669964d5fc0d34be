//! Projection of a decoded object tree into values.

use crate::config::RawProjection;
use crate::error::{Error, Result};
use crate::object::{Arena, Object, ObjectTree, RawKind};
use crate::value::{Map, Value};

impl ObjectTree {
    /// Builds the [`Value`] this tree describes.
    ///
    /// The result owns its data; it stays valid after the tree is dropped.
    pub fn project(&self, mode: RawProjection) -> Result<Value> {
        project(self.arena(), self.root_index(), mode)
    }
}

/// Projects the node at `index` and everything under it.
///
/// Recursion depth equals container nesting, which the decoder bounds by
/// `UnpackConfig::max_depth`.
pub(crate) fn project(arena: &Arena, index: usize, mode: RawProjection) -> Result<Value> {
    let object = arena
        .get(index)
        .ok_or(Error::UnknownObjectType { index })?;

    let value = match object {
        Object::Vacant => return Err(Error::UnknownObjectType { index }),
        Object::Nil => Value::Null,
        Object::Boolean(b) => Value::Bool(*b),
        Object::PositiveInteger(n) => Value::Number(*n as f64),
        Object::NegativeInteger(n) => Value::Number(*n as f64),
        Object::Float(f) => Value::Number(*f),
        Object::Raw(raw) => match (mode, raw.kind()) {
            (RawProjection::Preserve, RawKind::Binary) => Value::Buffer(arena.raw_to_bytes(raw)),
            _ => Value::String(String::from_utf8_lossy(arena.raw_bytes(raw)).into_owned()),
        },
        Object::Array { first, len } => Value::Array(
            (*first..*first + *len)
                .map(|child| project(arena, child, mode))
                .collect::<Result<Vec<_>>>()?,
        ),
        Object::Map { first, len } => {
            let mut map = Map::with_capacity(*len);
            for pair in 0..*len {
                let key = project(arena, first + 2 * pair, mode)?;
                let value = project(arena, first + 2 * pair + 1, mode)?;
                map.insert(key, value);
            }
            Value::Map(map)
        }
    };
    Ok(value)
}
