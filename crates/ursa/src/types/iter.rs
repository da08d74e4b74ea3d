//! Callable iterators. `iter()` on a container returns one of these; each
//! call produces the next element, then `Null` forever once exhausted.
//!
//! Iteration indexes the container live (no snapshot): elements appended
//! during iteration are observed, and `Map` iterators walk the insertion
//! order by position.

use crate::{
    heap::{Heap, HeapData, HeapId},
    intern::{Interns, StringId},
    types::{list::List, map::Map},
    value::Value,
};

/// Iterator state over a container.
#[derive(Debug, Clone, Copy)]
pub struct Iter {
    kind: IterKind,
    index: usize,
}

#[derive(Debug, Clone, Copy)]
enum IterKind {
    List(HeapId),
    MapEntries(HeapId),
    MapKeys(HeapId),
    MapValues(HeapId),
    Chars(StringId),
}

impl Iter {
    #[must_use]
    pub fn list(id: HeapId) -> Self {
        Self {
            kind: IterKind::List(id),
            index: 0,
        }
    }

    #[must_use]
    pub fn map_entries(id: HeapId) -> Self {
        Self {
            kind: IterKind::MapEntries(id),
            index: 0,
        }
    }

    #[must_use]
    pub fn map_keys(id: HeapId) -> Self {
        Self {
            kind: IterKind::MapKeys(id),
            index: 0,
        }
    }

    #[must_use]
    pub fn map_values(id: HeapId) -> Self {
        Self {
            kind: IterKind::MapValues(id),
            index: 0,
        }
    }

    #[must_use]
    pub fn chars(s: StringId) -> Self {
        Self {
            kind: IterKind::Chars(s),
            index: 0,
        }
    }
}

/// Advances the iterator at `id`, returning the next element or `Null`.
pub fn advance(id: HeapId, heap: &mut Heap, interns: &mut Interns) -> Value {
    let HeapData::Iter(state) = heap.get(id) else {
        panic!("expected iterator, found {}", heap.get(id).type_name());
    };
    let Iter { kind, index } = *state;

    let next = match kind {
        IterKind::List(list_id) => list_at(heap, list_id, index),
        IterKind::MapEntries(map_id) => map_at(heap, map_id, index).map(|(k, v)| {
            let pair = heap.alloc(HeapData::List(List::new(vec![k, v])));
            Value::Ref(pair)
        }),
        IterKind::MapKeys(map_id) => map_at(heap, map_id, index).map(|(k, _)| k),
        IterKind::MapValues(map_id) => map_at(heap, map_id, index).map(|(_, v)| v),
        IterKind::Chars(s) => interns
            .get(s)
            .chars()
            .nth(index)
            .map(|ch| ch.to_string())
            .map(|text| Value::Str(interns.intern_owned(text))),
    };

    if next.is_some() {
        if let HeapData::Iter(state) = heap.get_mut(id) {
            state.index = index + 1;
        }
    }
    next.unwrap_or(Value::Null)
}

fn list_at(heap: &Heap, id: HeapId, index: usize) -> Option<Value> {
    match heap.get(id) {
        HeapData::List(List { items }) => items.get(index).copied(),
        other => panic!("expected list, found {}", other.type_name()),
    }
}

fn map_at(heap: &Heap, id: HeapId, index: usize) -> Option<(Value, Value)> {
    match heap.get(id) {
        HeapData::Map(map) => Map::entry_at(map, index),
        other => panic!("expected map, found {}", other.type_name()),
    }
}
