//! The List container and its methods.

use std::cmp::Ordering;

use crate::{
    heap::{Heap, HeapData, HeapId},
    intern::{Interns, StaticName},
    types::{expect_arity, iter::Iter, to_text},
    value::Value,
};

/// An ordered sequence of values.
#[derive(Debug, Default)]
pub struct List {
    pub items: Vec<Value>,
}

impl List {
    #[must_use]
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Whether `List` has a built-in method with this name.
#[must_use]
pub fn has_method(name: StaticName) -> bool {
    use StaticName as N;
    matches!(
        name,
        N::Len
            | N::Get
            | N::Set
            | N::Push
            | N::Pop
            | N::Insert
            | N::Iter
            | N::Sorted
            | N::Reversed
            | N::Join
            | N::Slice
            | N::Contains
            | N::IndexOf
    )
}

/// Invokes a `List` method on the list at `id`.
pub fn invoke(
    id: HeapId,
    name: StaticName,
    args: &[Value],
    heap: &mut Heap,
    interns: &mut Interns,
) -> Result<Value, String> {
    use StaticName as N;

    match name {
        N::Len => {
            expect_arity("len", args, 0)?;
            Ok(Value::num(list(heap, id).len() as f64))
        }
        N::Get => {
            expect_arity("get", args, 1)?;
            let index = index_arg(args[0], "get")?;
            Ok(index
                .and_then(|i| list(heap, id).items.get(i).copied())
                .unwrap_or(Value::Null))
        }
        N::Set => {
            expect_arity("set", args, 2)?;
            let index = index_arg(args[0], "set")?;
            let items = &mut list_mut(heap, id).items;
            match index {
                Some(i) if i < items.len() => {
                    items[i] = args[1];
                    Ok(args[1])
                }
                _ => Err("`set' index out of range".to_owned()),
            }
        }
        N::Push => {
            expect_arity("push", args, 1)?;
            list_mut(heap, id).items.push(args[0]);
            Ok(Value::Ref(id))
        }
        N::Pop => {
            expect_arity("pop", args, 0)?;
            Ok(list_mut(heap, id).items.pop().unwrap_or(Value::Null))
        }
        N::Insert => {
            expect_arity("insert", args, 2)?;
            let index = index_arg(args[0], "insert")?;
            let items = &mut list_mut(heap, id).items;
            let at = index.unwrap_or(0).min(items.len());
            items.insert(at, args[1]);
            Ok(Value::Ref(id))
        }
        N::Iter => {
            expect_arity("iter", args, 0)?;
            let iter = heap.alloc(HeapData::Iter(Iter::list(id)));
            Ok(Value::Ref(iter))
        }
        N::Sorted => {
            expect_arity("sorted", args, 0)?;
            let mut items = list(heap, id).items.clone();
            let mut comparable = true;
            items.sort_by(|a, b| match a.compare(*b, interns) {
                Some(ordering) => ordering,
                None => {
                    comparable = false;
                    Ordering::Equal
                }
            });
            if !comparable {
                return Err("`sorted' requires all-Num or all-Str elements".to_owned());
            }
            Ok(Value::Ref(heap.alloc(HeapData::List(List::new(items)))))
        }
        N::Reversed => {
            expect_arity("reversed", args, 0)?;
            let mut items = list(heap, id).items.clone();
            items.reverse();
            Ok(Value::Ref(heap.alloc(HeapData::List(List::new(items)))))
        }
        N::Join => {
            expect_arity("join", args, 1)?;
            let Value::Str(sep) = args[0] else {
                return Err("`join' expects a Str argument".to_owned());
            };
            let items = list(heap, id).items.clone();
            let sep = interns.get(sep).to_owned();
            let joined = items
                .iter()
                .map(|item| to_text(*item, heap, interns))
                .collect::<Vec<_>>()
                .join(&sep);
            Ok(Value::Str(interns.intern_owned(joined)))
        }
        N::Slice => {
            expect_arity("slice", args, 2)?;
            let len = list(heap, id).len();
            let start = clamp_bound(args[0], len, "slice")?;
            let end = clamp_bound(args[1], len, "slice")?;
            let items = if start < end {
                list(heap, id).items[start..end].to_vec()
            } else {
                Vec::new()
            };
            Ok(Value::Ref(heap.alloc(HeapData::List(List::new(items)))))
        }
        N::Contains => {
            expect_arity("contains", args, 1)?;
            let found = list(heap, id).items.iter().any(|item| item.identical(args[0]));
            Ok(Value::Bool(found))
        }
        N::IndexOf => {
            expect_arity("indexOf", args, 1)?;
            let found = list(heap, id).items.iter().position(|item| item.identical(args[0]));
            Ok(Value::num(found.map_or(-1.0, |i| i as f64)))
        }
        other => {
            let text: &'static str = other.into();
            Err(format!("Invalid method `{text}'"))
        }
    }
}

fn list(heap: &Heap, id: HeapId) -> &List {
    match heap.get(id) {
        HeapData::List(list) => list,
        other => panic!("expected list, found {}", other.type_name()),
    }
}

fn list_mut(heap: &mut Heap, id: HeapId) -> &mut List {
    match heap.get_mut(id) {
        HeapData::List(list) => list,
        other => panic!("expected list, found {}", other.type_name()),
    }
}

fn index_arg(value: Value, method: &str) -> Result<Option<usize>, String> {
    match value {
        Value::Num(n) if n.is_finite() && n == n.trunc() => {
            if n < 0.0 {
                Ok(None)
            } else {
                Ok(Some(n as usize))
            }
        }
        _ => Err(format!("`{method}' expects an integral Num argument")),
    }
}

/// Clamps a slice bound into `0..=len`; negative bounds count from the end.
fn clamp_bound(value: Value, len: usize, method: &str) -> Result<usize, String> {
    match value {
        Value::Num(n) if n.is_finite() && n == n.trunc() => {
            let n = n as i64;
            let len = len as i64;
            let bound = if n < 0 { (len + n).max(0) } else { n.min(len) };
            Ok(bound as usize)
        }
        _ => Err(format!("`{method}' expects integral Num bounds")),
    }
}
