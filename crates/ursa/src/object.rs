//! Host-facing values: the `toHost()`/`fromHost()` bridge.
//!
//! `Object` is the detached, owning form of a value: embedders pass
//! inputs and receive results as `Object`s without touching the arena or
//! the interner. Values with no host shape (closures, continuations,
//! promises, natives) convert to `Object::Repr` adapters carrying their
//! rendered form. `serde_json::Value` bridges both ways for embedders
//! that speak JSON.

use std::fmt;

use indexmap::IndexMap;

use crate::{
    heap::{Heap, HeapData},
    intern::Interns,
    value::{Value, format_num},
};

/// Conversion depth bound; cyclic values fall back to `Repr`.
const MAX_DEPTH: usize = 64;

/// A host-side value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Object {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Object>),
    /// Ordered key/value pairs (map keys need not be strings).
    Map(Vec<(Object, Object)>),
    /// Name-keyed record with fixed member order.
    Struct(IndexMap<String, Object>),
    /// Rendered form of a value with no host shape.
    Repr(String),
}

impl Object {
    /// Converts a runtime value to its host form.
    #[must_use]
    pub fn new(value: Value, heap: &Heap, interns: &Interns) -> Self {
        Self::convert(value, heap, interns, 0)
    }

    fn convert(value: Value, heap: &Heap, interns: &Interns, depth: usize) -> Self {
        if depth > MAX_DEPTH {
            return Self::Repr(value.repr(heap, interns));
        }
        match value {
            Value::Undefined => Self::Repr("undefined".to_owned()),
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Num(n) => Self::Num(n),
            Value::Str(id) => Self::Str(interns.get(id).to_owned()),
            Value::Ref(id) => match heap.get(id) {
                HeapData::List(list) => Self::List(
                    list.items
                        .iter()
                        .map(|item| Self::convert(*item, heap, interns, depth + 1))
                        .collect(),
                ),
                HeapData::Map(map) => Self::Map(
                    map.entries()
                        .map(|(k, v)| {
                            (
                                Self::convert(k, heap, interns, depth + 1),
                                Self::convert(v, heap, interns, depth + 1),
                            )
                        })
                        .collect(),
                ),
                HeapData::Struct(s) => Self::Struct(
                    s.members
                        .iter()
                        .map(|(name, member)| {
                            (
                                interns.get(*name).to_owned(),
                                Self::convert(*member, heap, interns, depth + 1),
                            )
                        })
                        .collect(),
                ),
                _ => Self::Repr(value.repr(heap, interns)),
            },
            Value::NativeFn(_) | Value::NativeAsyncFn(_) => Self::Repr(value.repr(heap, interns)),
        }
    }

    /// Converts a host value into the runtime, allocating containers in
    /// the arena and interning strings.
    pub fn to_value(&self, heap: &mut Heap, interns: &mut Interns) -> Result<Value, String> {
        match self {
            Self::Null => Ok(Value::Null),
            Self::Bool(b) => Ok(Value::Bool(*b)),
            Self::Num(n) => Ok(Value::num(*n)),
            Self::Str(s) => Ok(Value::Str(interns.intern(s))),
            Self::List(items) => {
                let converted: Result<Vec<Value>, String> =
                    items.iter().map(|item| item.to_value(heap, interns)).collect();
                let list = crate::types::list::List::new(converted?);
                Ok(Value::Ref(heap.alloc(HeapData::List(list))))
            }
            Self::Map(entries) => {
                let mut map = crate::types::map::Map::new();
                for (key, value) in entries {
                    let key = key.to_value(heap, interns)?;
                    let value = value.to_value(heap, interns)?;
                    map.insert(key, value);
                }
                Ok(Value::Ref(heap.alloc(HeapData::Map(map))))
            }
            Self::Struct(members) => {
                let mut built = IndexMap::with_capacity(members.len());
                for (name, member) in members {
                    let name = interns.intern(name);
                    built.insert(name, member.to_value(heap, interns)?);
                }
                let s = crate::types::struct_::Struct::new(built);
                Ok(Value::Ref(heap.alloc(HeapData::Struct(s))))
            }
            Self::Repr(text) => Err(format!("cannot convert opaque value back into the runtime: {text}")),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Num(n) => f.write_str(&format_num(*n)),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Struct(members) => {
                f.write_str("Object {")?;
                for (i, (name, member)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, " {name} = {member}")?;
                }
                f.write_str(" }")
            }
            Self::Repr(text) => f.write_str(text),
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Object {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl TryFrom<&Object> for f64 {
    type Error = String;

    fn try_from(object: &Object) -> Result<Self, Self::Error> {
        match object {
            Object::Num(n) => Ok(*n),
            other => Err(format!("expected Num, got {other}")),
        }
    }
}

impl TryFrom<&Object> for bool {
    type Error = String;

    fn try_from(object: &Object) -> Result<Self, Self::Error> {
        match object {
            Object::Bool(b) => Ok(*b),
            other => Err(format!("expected Bool, got {other}")),
        }
    }
}

impl TryFrom<&Object> for String {
    type Error = String;

    fn try_from(object: &Object) -> Result<Self, Self::Error> {
        match object {
            Object::Str(s) => Ok(s.clone()),
            other => Err(format!("expected Str, got {other}")),
        }
    }
}

impl From<serde_json::Value> for Object {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Num(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(members) => {
                Self::Struct(members.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&Object> for serde_json::Value {
    fn from(object: &Object) -> Self {
        match object {
            Object::Null => Self::Null,
            Object::Bool(b) => Self::Bool(*b),
            Object::Num(n) => serde_json::Number::from_f64(*n).map_or(Self::Null, Self::Number),
            Object::Str(s) | Object::Repr(s) => Self::String(s.clone()),
            Object::List(items) => Self::Array(items.iter().map(Self::from).collect()),
            Object::Map(entries) => {
                // JSON objects need string keys; fall back to pair arrays
                if entries.iter().all(|(k, _)| matches!(k, Object::Str(_))) {
                    let members = entries
                        .iter()
                        .map(|(k, v)| {
                            let Object::Str(key) = k else { unreachable!() };
                            (key.clone(), Self::from(v))
                        })
                        .collect();
                    Self::Object(members)
                } else {
                    Self::Array(
                        entries
                            .iter()
                            .map(|(k, v)| Self::Array(vec![Self::from(k), Self::from(v)]))
                            .collect(),
                    )
                }
            }
            Object::Struct(members) => {
                Self::Object(members.iter().map(|(k, v)| (k.clone(), Self::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let json: serde_json::Value = serde_json::from_str(r#"{"a": 1, "b": [true, null, "x"]}"#).unwrap();
        let object = Object::from(json.clone());
        let Object::Struct(members) = &object else {
            panic!("expected struct");
        };
        assert_eq!(members["a"], Object::Num(1.0));
        let back: serde_json::Value = (&object).into();
        assert_eq!(back, json);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Object::Num(3.0).to_string(), "3");
        assert_eq!(Object::Str("hi".to_owned()).to_string(), "\"hi\"");
        let list = Object::List(vec![Object::Num(1.0), Object::Null]);
        assert_eq!(list.to_string(), "[1, null]");
    }
}
