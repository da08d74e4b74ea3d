//! The Map container: an insertion-ordered mapping keyed by value identity.
//!
//! Because scalars are interned, identity keying gives the natural
//! semantics: equal scalar content is one key, while each structured value
//! is its own key. Keys hash through a `MapKey` projection (content bits
//! for scalars, arena id for structured values).

use indexmap::IndexMap;

use crate::{
    heap::{Heap, HeapData, HeapId},
    intern::{StaticName, StringId},
    types::{expect_arity, iter::Iter},
    value::Value,
};

/// Hashable projection of a value's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKey {
    Undefined,
    Null,
    Bool(bool),
    /// Canonicalized bit pattern (`Value::num` already normalised `-0.0`
    /// and NaN).
    Num(u64),
    Str(StringId),
    Native(u8),
    Ref(HeapId),
}

impl MapKey {
    #[must_use]
    pub fn of(value: Value) -> Self {
        match value {
            Value::Undefined => Self::Undefined,
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Num(n) => Self::Num(n.to_bits()),
            Value::Str(id) => Self::Str(id),
            Value::NativeFn(f) => Self::Native(f as u8),
            Value::NativeAsyncFn(f) => Self::Native(128 + f as u8),
            Value::Ref(id) => Self::Ref(id),
        }
    }
}

/// An insertion-ordered mapping from value to value.
#[derive(Debug, Default)]
pub struct Map {
    entries: IndexMap<MapKey, (Value, Value)>,
}

impl Map {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        self.entries.insert(MapKey::of(key), (key, value));
    }

    #[must_use]
    pub fn get(&self, key: Value) -> Option<Value> {
        self.entries.get(&MapKey::of(key)).map(|(_, v)| *v)
    }

    #[must_use]
    pub fn contains(&self, key: Value) -> bool {
        self.entries.contains_key(&MapKey::of(key))
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: Value) -> bool {
        self.entries.shift_remove(&MapKey::of(key)).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.entries.values().copied()
    }

    /// The entry at a position, if still in range.
    #[must_use]
    pub fn entry_at(&self, index: usize) -> Option<(Value, Value)> {
        self.entries.get_index(index).map(|(_, pair)| *pair)
    }
}

/// Whether `Map` has a built-in method with this name.
#[must_use]
pub fn has_method(name: StaticName) -> bool {
    use StaticName as N;
    matches!(
        name,
        N::Len | N::Get | N::Set | N::Has | N::Delete | N::Keys | N::Values | N::Iter
    )
}

/// Invokes a `Map` method on the map at `id`.
pub fn invoke(id: HeapId, name: StaticName, args: &[Value], heap: &mut Heap) -> Result<Value, String> {
    use StaticName as N;

    match name {
        N::Len => {
            expect_arity("len", args, 0)?;
            Ok(Value::num(map(heap, id).len() as f64))
        }
        N::Get => {
            expect_arity("get", args, 1)?;
            Ok(map(heap, id).get(args[0]).unwrap_or(Value::Null))
        }
        N::Set => {
            expect_arity("set", args, 2)?;
            map_mut(heap, id).insert(args[0], args[1]);
            Ok(Value::Ref(id))
        }
        N::Has => {
            expect_arity("has", args, 1)?;
            Ok(Value::Bool(map(heap, id).contains(args[0])))
        }
        N::Delete => {
            expect_arity("delete", args, 1)?;
            Ok(Value::Bool(map_mut(heap, id).remove(args[0])))
        }
        N::Keys => {
            expect_arity("keys", args, 0)?;
            let iter = heap.alloc(HeapData::Iter(Iter::map_keys(id)));
            Ok(Value::Ref(iter))
        }
        N::Values => {
            expect_arity("values", args, 0)?;
            let iter = heap.alloc(HeapData::Iter(Iter::map_values(id)));
            Ok(Value::Ref(iter))
        }
        N::Iter => {
            expect_arity("iter", args, 0)?;
            let iter = heap.alloc(HeapData::Iter(Iter::map_entries(id)));
            Ok(Value::Ref(iter))
        }
        other => {
            let text: &'static str = other.into();
            Err(format!("Invalid method `{text}'"))
        }
    }
}

fn map(heap: &Heap, id: HeapId) -> &Map {
    match heap.get(id) {
        HeapData::Map(map) => map,
        other => panic!("expected map, found {}", other.type_name()),
    }
}

fn map_mut(heap: &mut Heap, id: HeapId) -> &mut Map {
    match heap.get_mut(id) {
        HeapData::Map(map) => map,
        other => panic!("expected map, found {}", other.type_name()),
    }
}
