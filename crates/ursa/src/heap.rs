//! Arena storage for structured values.
//!
//! Structured values live in a slotted arena addressed by `HeapId`; a
//! `Value::Ref` is just an id. Local and capture slots are `Cell` entries,
//! the one-level indirection boxes that make closure capture by reference
//! and recursive `let`s work: the closure holds the cell, not the value.
//!
//! Entries stay live for the lifetime of the owning `Runtime`; there is no
//! reclamation pass (the language values stability of semantics over
//! performance, and the host drops the whole arena at once).

use std::collections::BTreeMap;

use crate::{
    tasks::Frame,
    types::{
        closure::{Closure, Continuation},
        iter::Iter,
        list::List,
        map::Map,
        native::NativeObject,
        promise::Promise,
        struct_::Struct,
    },
    value::Value,
};

/// Index of a structured value in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct HeapId(u32);

impl HeapId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A structured value held by the arena.
#[derive(Debug)]
pub enum HeapData {
    List(List),
    Map(Map),
    Struct(Struct),
    /// A local/capture slot: one level of indirection over a value.
    Cell(Value),
    Closure(Closure),
    Continuation(Continuation),
    Promise(Promise),
    Iter(Iter),
    /// A method name bound to a receiver, produced by property reads of
    /// method members; calling it dispatches the method.
    BoundMethod(BoundMethod),
    Native(Box<dyn NativeObject>),
}

impl HeapData {
    /// A short name for the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::List(_) => "List",
            Self::Map(_) => "Map",
            Self::Struct(_) => "Struct",
            Self::Cell(_) => "Cell",
            Self::Closure(c) => {
                if c.is_generator {
                    "GeneratorClosure"
                } else {
                    "Closure"
                }
            }
            Self::Continuation(_) => "Continuation",
            Self::Promise(_) => "Promise",
            Self::Iter(_) => "Iter",
            Self::BoundMethod(_) => "BoundMethod",
            Self::Native(object) => object.type_name(),
        }
    }
}

/// A method bound to its receiver.
#[derive(Debug, Clone, Copy)]
pub struct BoundMethod {
    pub receiver: Value,
    pub name: crate::intern::StringId,
}

/// The arena. Allocation only ever appends; ids are stable.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<HeapData>,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(64),
        }
    }

    /// Allocates a new entry and returns its id.
    pub fn alloc(&mut self, data: HeapData) -> HeapId {
        let id = HeapId(u32::try_from(self.slots.len()).expect("heap exceeds u32 slots"));
        self.slots.push(data);
        id
    }

    /// Allocates a fresh cell holding `value`.
    pub fn alloc_cell(&mut self, value: Value) -> HeapId {
        self.alloc(HeapData::Cell(value))
    }

    /// Borrows an entry.
    ///
    /// # Panics
    /// Panics if the id did not come from this arena.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        &self.slots[id.index()]
    }

    /// Mutably borrows an entry.
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        &mut self.slots[id.index()]
    }

    /// Reads the value inside a cell.
    ///
    /// # Panics
    /// Panics if `id` is not a cell; cell ids never escape frame slots.
    #[must_use]
    pub fn cell_get(&self, id: HeapId) -> Value {
        match self.get(id) {
            HeapData::Cell(value) => *value,
            other => panic!("expected cell, found {}", other.type_name()),
        }
    }

    /// Writes the value inside a cell.
    pub fn cell_set(&mut self, id: HeapId, value: Value) {
        match self.get_mut(id) {
            HeapData::Cell(slot) => *slot = value,
            other => panic!("expected cell, found {}", other.type_name()),
        }
    }

    /// Takes a parked continuation frame out of the arena for resumption.
    /// The caller must put it back (or mark the continuation done).
    pub fn continuation_take(&mut self, id: HeapId) -> Option<Frame> {
        match self.get_mut(id) {
            HeapData::Continuation(cont) => cont.frame.take(),
            other => panic!("expected continuation, found {}", other.type_name()),
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Snapshot of the arena's population, for embedders watching a
    /// session's growth.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut objects_by_type: BTreeMap<&'static str, usize> = BTreeMap::new();
        for slot in &self.slots {
            *objects_by_type.entry(slot.type_name()).or_insert(0) += 1;
        }
        HeapStats {
            live_objects: self.slots.len(),
            objects_by_type,
        }
    }
}

/// Snapshot of heap state at a point in time.
///
/// The `objects_by_type` map uses `BTreeMap` for deterministic iteration
/// order, so snapshots render and compare stably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live entries in the arena.
    pub live_objects: usize,
    /// Breakdown of entries by variant name (cells included: they back
    /// every local and capture slot).
    pub objects_by_type: BTreeMap<&'static str, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_round_trip() {
        let mut heap = Heap::new();
        let cell = heap.alloc_cell(Value::Null);
        assert_eq!(heap.cell_get(cell), Value::Null);
        heap.cell_set(cell, Value::num(4.0));
        assert_eq!(heap.cell_get(cell), Value::num(4.0));
    }

    #[test]
    fn ids_are_stable_across_allocation() {
        let mut heap = Heap::new();
        let a = heap.alloc_cell(Value::Bool(true));
        for _ in 0..100 {
            heap.alloc_cell(Value::Null);
        }
        assert_eq!(heap.cell_get(a), Value::Bool(true));
    }
}
