//! Scratch arena holding one object tree.

use bytes::Bytes;

use super::{Object, Raw, RawData, RawKind};

/// Default number of node slots reserved up front.
pub(crate) const DEFAULT_ARENA_NODES: usize = 64;

/// Flat, call-scoped storage for [`Object`] nodes.
///
/// Nodes live in one vector and text payloads copied while packing live in
/// one byte heap, so a whole tree is released by dropping (or clearing) the
/// arena.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Object>,
    heap: Vec<u8>,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(DEFAULT_ARENA_NODES),
            heap: Vec::new(),
        }
    }

    /// Appends a node and returns its index.
    pub(crate) fn push(&mut self, object: Object) -> usize {
        self.nodes.push(object);
        self.nodes.len() - 1
    }

    /// Reserves `count` vacant slots and returns the index of the first.
    pub(crate) fn reserve(&mut self, count: usize) -> usize {
        let first = self.nodes.len();
        self.nodes.resize(first + count, Object::Vacant);
        first
    }

    /// Overwrites the node at `index`.
    pub(crate) fn set(&mut self, index: usize, object: Object) {
        self.nodes[index] = object;
    }

    /// Copies `bytes` into the heap.
    pub(crate) fn alloc_raw(&mut self, bytes: &[u8], kind: RawKind) -> Raw {
        let start = self.heap.len();
        self.heap.extend_from_slice(bytes);
        Raw {
            data: RawData::Heap {
                start,
                len: bytes.len(),
            },
            kind,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.heap.clear();
    }

    /// Returns the node at `index`.
    pub fn get(&self, index: usize) -> Option<&Object> {
        self.nodes.get(index)
    }

    /// Returns the bytes of a raw payload stored in this arena.
    ///
    /// A heap payload that does not belong to this arena resolves to an
    /// empty slice.
    pub fn raw_bytes<'a>(&'a self, raw: &'a Raw) -> &'a [u8] {
        match &raw.data {
            RawData::Heap { start, len } => self.heap_slice(*start, *len),
            RawData::Shared(bytes) => bytes,
        }
    }

    /// Returns an owned handle to a raw payload. Shared payloads are not
    /// copied.
    pub(crate) fn raw_to_bytes(&self, raw: &Raw) -> Bytes {
        match &raw.data {
            RawData::Heap { start, len } => Bytes::copy_from_slice(self.heap_slice(*start, *len)),
            RawData::Shared(bytes) => bytes.clone(),
        }
    }

    fn heap_slice(&self, start: usize, len: usize) -> &[u8] {
        start
            .checked_add(len)
            .and_then(|end| self.heap.get(start..end))
            .unwrap_or(&[])
    }

    /// Returns the child slots of a container node (empty for scalars).
    ///
    /// For maps the slots alternate key, value. A container whose slots are
    /// not in this arena has no children.
    pub fn children(&self, object: &Object) -> &[Object] {
        match object {
            Object::Array { first, .. } | Object::Map { first, .. } => first
                .checked_add(object.slot_count())
                .and_then(|end| self.nodes.get(*first..end))
                .unwrap_or(&[]),
            _ => &[],
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A completed object tree.
#[derive(Debug)]
pub struct ObjectTree {
    arena: Arena,
    root: usize,
}

impl ObjectTree {
    pub(crate) fn new(arena: Arena, root: usize) -> Self {
        Self { arena, root }
    }

    /// Returns the root node.
    pub fn root(&self) -> &Object {
        &self.arena.nodes[self.root]
    }

    /// Returns the root's arena index.
    pub fn root_index(&self) -> usize {
        self.root
    }

    /// Returns the arena holding the tree.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_reserve_fills_vacant_slots() {
        let mut arena = Arena::new();
        let root = arena.push(Object::Nil);
        let first = arena.reserve(3);
        assert_eq!(root, 0);
        assert_eq!(first, 1);
        assert_eq!(arena.len(), 4);
        assert_eq!(arena.get(3), Some(&Object::Vacant));
    }

    #[test]
    fn test_children_of_map_alternate() {
        let mut arena = Arena::new();
        let map = Object::Map { first: 1, len: 2 };
        arena.push(map.clone());
        arena.reserve(4);
        arena.set(1, Object::Boolean(true));
        arena.set(4, Object::Nil);
        let children = arena.children(&map);
        assert_eq!(children.len(), 4);
        assert_eq!(children[0], Object::Boolean(true));
        assert_eq!(children[3], Object::Nil);
        assert!(arena.children(&Object::Nil).is_empty());
    }

    #[test]
    fn test_foreign_nodes_have_no_children() {
        let mut arena = Arena::new();
        arena.push(Object::Nil);

        assert!(arena.children(&Object::Array { first: 100, len: 3 }).is_empty());
        assert!(arena.children(&Object::Array { first: 0, len: 2 }).is_empty());
        assert!(arena.children(&Object::Map { first: usize::MAX, len: usize::MAX }).is_empty());

        let mut other = Arena::new();
        other.alloc_raw(b"elsewhere", RawKind::Text);
        let foreign = other.alloc_raw(b"!", RawKind::Text);
        assert!(arena.raw_bytes(&foreign).is_empty());
    }

    #[test]
    fn test_raw_bytes_resolve() {
        let mut arena = Arena::new();
        let heap = arena.alloc_raw(b"hello", RawKind::Text);
        let shared = Raw::shared(Bytes::from_static(b"world"), RawKind::Binary);
        assert_eq!(arena.raw_bytes(&heap), b"hello");
        assert_eq!(arena.raw_bytes(&shared), b"world");
        assert_eq!(shared.kind(), RawKind::Binary);

        arena.clear();
        assert!(arena.is_empty());
    }
}
