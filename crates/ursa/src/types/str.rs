//! String methods. Strings are interned and immutable; every method that
//! produces a string interns its result, preserving the identity law.
//!
//! Indexing is by Unicode scalar, not byte.

use crate::{
    heap::{Heap, HeapData},
    intern::{Interns, StaticName, StringId},
    types::{expect_arity, iter::Iter, list::List},
    value::Value,
};

/// Whether `Str` has a built-in method with this name.
#[must_use]
pub fn has_method(name: StaticName) -> bool {
    use StaticName as N;
    matches!(
        name,
        N::Add
            | N::Len
            | N::Get
            | N::Iter
            | N::Split
            | N::Trim
            | N::StartsWith
            | N::EndsWith
            | N::Contains
            | N::IndexOf
            | N::Repeat
            | N::ToLowerCase
            | N::ToUpperCase
            | N::ToNum
            | N::Lt
            | N::Leq
            | N::Gt
            | N::Geq
    )
}

/// Invokes a `Str` method.
pub fn invoke(
    receiver: StringId,
    name: StaticName,
    args: &[Value],
    heap: &mut Heap,
    interns: &mut Interns,
) -> Result<Value, String> {
    use StaticName as N;

    match name {
        N::Add => {
            expect_arity("add", args, 1)?;
            let other = str_arg(args[0], "add")?;
            let combined = format!("{}{}", interns.get(receiver), interns.get(other));
            Ok(Value::Str(interns.intern_owned(combined)))
        }
        N::Len => {
            expect_arity("len", args, 0)?;
            Ok(Value::num(interns.get(receiver).chars().count() as f64))
        }
        N::Get => {
            expect_arity("get", args, 1)?;
            let index = index_arg(args[0], "get")?;
            match index.and_then(|i| interns.get(receiver).chars().nth(i)) {
                Some(ch) => Ok(Value::Str(interns.intern_owned(ch.to_string()))),
                None => Ok(Value::Null),
            }
        }
        N::Iter => {
            expect_arity("iter", args, 0)?;
            let iter = heap.alloc(HeapData::Iter(Iter::chars(receiver)));
            Ok(Value::Ref(iter))
        }
        N::Split => {
            expect_arity("split", args, 1)?;
            let sep = str_arg(args[0], "split")?;
            let sep_text = interns.get(sep).to_owned();
            let text = interns.get(receiver).to_owned();
            let parts: Vec<Value> = if sep_text.is_empty() {
                text.chars()
                    .map(|ch| Value::Str(interns.intern_owned(ch.to_string())))
                    .collect()
            } else {
                text.split(sep_text.as_str())
                    .map(|part| Value::Str(interns.intern(part)))
                    .collect()
            };
            Ok(Value::Ref(heap.alloc(HeapData::List(List::new(parts)))))
        }
        N::Trim => {
            expect_arity("trim", args, 0)?;
            let trimmed = interns.get(receiver).trim().to_owned();
            Ok(Value::Str(interns.intern_owned(trimmed)))
        }
        N::StartsWith | N::EndsWith | N::Contains => {
            let text: &'static str = name.into();
            expect_arity(text, args, 1)?;
            let needle = str_arg(args[0], text)?;
            let hay = interns.get(receiver);
            let needle = interns.get(needle);
            let result = match name {
                N::StartsWith => hay.starts_with(needle),
                N::EndsWith => hay.ends_with(needle),
                _ => hay.contains(needle),
            };
            Ok(Value::Bool(result))
        }
        N::IndexOf => {
            expect_arity("indexOf", args, 1)?;
            let needle = str_arg(args[0], "indexOf")?;
            let hay = interns.get(receiver);
            let needle = interns.get(needle);
            match hay.find(needle) {
                // report the index in characters, not bytes
                Some(byte_index) => Ok(Value::num(hay[..byte_index].chars().count() as f64)),
                None => Ok(Value::num(-1.0)),
            }
        }
        N::Repeat => {
            expect_arity("repeat", args, 1)?;
            let Some(count) = index_arg(args[0], "repeat")? else {
                return Err("`repeat' expects a non-negative count".to_owned());
            };
            let repeated = interns.get(receiver).repeat(count.min(1 << 20));
            Ok(Value::Str(interns.intern_owned(repeated)))
        }
        N::ToLowerCase => {
            expect_arity("toLowerCase", args, 0)?;
            let lowered = interns.get(receiver).to_lowercase();
            Ok(Value::Str(interns.intern_owned(lowered)))
        }
        N::ToUpperCase => {
            expect_arity("toUpperCase", args, 0)?;
            let raised = interns.get(receiver).to_uppercase();
            Ok(Value::Str(interns.intern_owned(raised)))
        }
        N::ToNum => {
            expect_arity("toNum", args, 0)?;
            let text = interns.get(receiver).trim();
            Ok(Value::num(text.parse::<f64>().unwrap_or(f64::NAN)))
        }
        N::Lt | N::Leq | N::Gt | N::Geq => {
            let text: &'static str = name.into();
            expect_arity(text, args, 1)?;
            let other = str_arg(args[0], text)?;
            let ord = interns.get(receiver).cmp(interns.get(other));
            let result = match name {
                N::Lt => ord.is_lt(),
                N::Leq => ord.is_le(),
                N::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        other => {
            let text: &'static str = other.into();
            Err(format!("Invalid method `{text}'"))
        }
    }
}

fn str_arg(value: Value, method: &str) -> Result<StringId, String> {
    match value {
        Value::Str(id) => Ok(id),
        _ => Err(format!("`{method}' expects a Str argument")),
    }
}

/// A non-negative integral index, or `None` when negative.
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
