//! Per-variant runtime behavior: containers, callables, and the built-in
//! method tables reachable from every value's type.
//!
//! Dispatch is driven by `StaticName` (pre-interned method names), so the
//! common path is an enum match rather than a string comparison. Errors are
//! plain messages; the interpreter attaches the instruction span and the
//! traceback when it raises.

pub mod closure;
pub mod iter;
pub mod list;
pub mod map;
pub mod native;
pub mod num;
pub mod promise;
pub mod str;
pub mod struct_;

use crate::{
    heap::{Heap, HeapData, HeapId},
    intern::{Interns, StaticName, StringId},
    value::Value,
};

/// Result of a method dispatch.
#[derive(Debug, Clone, Copy)]
pub enum MethodOutcome {
    /// The method completed with a value.
    Value(Value),
    /// The method is a user closure stored in a struct member; the caller
    /// (the interpreter) must perform an ordinary frame call.
    CallClosure(HeapId),
    /// The method is a native callable stored in a struct member.
    CallNative(Value),
}

/// Result of a property read.
#[derive(Debug, Clone, Copy)]
pub enum PropRead {
    /// A data member.
    Value(Value),
    /// A built-in method name; the caller allocates a `BoundMethod`.
    Method,
    /// The receiver is not an abstract-object variant.
    InvalidObject,
    /// The receiver has no such member.
    InvalidProperty,
}

/// Validates a built-in method's argument count.
pub(crate) fn expect_arity(method: &str, args: &[Value], n: usize) -> Result<(), String> {
    if args.len() == n {
        Ok(())
    } else {
        Err(format!("`{method}' expects {n} argument(s), got {}", args.len()))
    }
}

/// The plain-text form of a value: raw content for strings, repr otherwise.
/// Used by `join`, `toString`, and the fs wrapper.
#[must_use]
pub fn to_text(value: Value, heap: &Heap, interns: &Interns) -> String {
    match value {
        Value::Str(id) => interns.get(id).to_owned(),
        other => other.repr(heap, interns),
    }
}

/// Invokes a built-in (or struct-member) method on a receiver.
///
/// Struct members shadow built-ins: invoking a member that holds a closure
/// is a user call, any other member value is not callable. Every variant
/// answers `equals`, `notEquals`, and `toString` (identity semantics);
/// the abstract-object variants add their own tables.
pub fn invoke_method(
    receiver: Value,
    method: StringId,
    args: &[Value],
    heap: &mut Heap,
    interns: &mut Interns,
) -> Result<MethodOutcome, String> {
    // Struct member dispatch comes first so user methods win.
    if let Value::Ref(id) = receiver {
        if let HeapData::Struct(s) = heap.get(id) {
            if let Some(member) = s.members.get(&method).copied() {
                match member {
                    Value::Ref(member_id) if matches!(heap.get(member_id), HeapData::Closure(_)) => {
                        return Ok(MethodOutcome::CallClosure(member_id));
                    }
                    Value::NativeFn(_) | Value::NativeAsyncFn(_) => {
                        return Ok(MethodOutcome::CallNative(member));
                    }
                    _ => return Err(format!("Member `{}' is not callable", interns.get(method))),
                }
            }
        }
    }

    let Some(name) = interns.as_static(method) else {
        return Err(format!("Invalid method `{}'", interns.get(method)));
    };

    // Universal identity methods.
    match name {
        StaticName::Equals => {
            expect_arity("equals", args, 1)?;
            return Ok(MethodOutcome::Value(Value::Bool(receiver.identical(args[0]))));
        }
        StaticName::NotEquals => {
            expect_arity("notEquals", args, 1)?;
            return Ok(MethodOutcome::Value(Value::Bool(!receiver.identical(args[0]))));
        }
        StaticName::ToString => {
            expect_arity("toString", args, 0)?;
            let text = to_text(receiver, heap, interns);
            return Ok(MethodOutcome::Value(Value::Str(interns.intern_owned(text))));
        }
        _ => {}
    }

    match receiver.kind(heap) {
        crate::value::ValueKind::Num => {
            let Value::Num(n) = receiver else { unreachable!() };
            num::invoke(n, name, args).map(MethodOutcome::Value)
        }
        crate::value::ValueKind::Bool => match name {
            StaticName::Not => {
                let Value::Bool(b) = receiver else { unreachable!() };
                expect_arity("not", args, 0)?;
                Ok(MethodOutcome::Value(Value::Bool(!b)))
            }
            _ => Err(invalid_method(name)),
        },
        crate::value::ValueKind::Str => {
            let Value::Str(s) = receiver else { unreachable!() };
            str::invoke(s, name, args, heap, interns).map(MethodOutcome::Value)
        }
        crate::value::ValueKind::List => {
            let Value::Ref(id) = receiver else { unreachable!() };
            list::invoke(id, name, args, heap, interns).map(MethodOutcome::Value)
        }
        crate::value::ValueKind::Map => {
            let Value::Ref(id) = receiver else { unreachable!() };
            map::invoke(id, name, args, heap).map(MethodOutcome::Value)
        }
        crate::value::ValueKind::Null | crate::value::ValueKind::Struct => Err(invalid_method(name)),
        _ => Err("Invalid object".to_owned()),
    }
}

fn invalid_method(name: StaticName) -> String {
    let text: &'static str = name.into();
    format!("Invalid method `{text}'")
}

/// Reads a property from a value.
///
/// Data members come from structs and native objects; method names on the
/// abstract-object variants read as bound methods. Anything else is
/// `InvalidObject`/`InvalidProperty`, which the interpreter renders as the
/// corresponding runtime errors.
pub fn get_property(receiver: Value, name: StringId, heap: &Heap, interns: &mut Interns) -> Result<PropRead, String> {
    match receiver {
        Value::Ref(id) => match heap.get(id) {
            HeapData::Struct(s) => {
                if let Some(member) = s.members.get(&name) {
                    Ok(PropRead::Value(*member))
                } else if has_builtin_method(receiver, name, heap, interns) {
                    Ok(PropRead::Method)
                } else {
                    Ok(PropRead::InvalidProperty)
                }
            }
            HeapData::Native(object) => {
                let text = interns.get(name).to_owned();
                match object.get(&text, interns)? {
                    Some(value) => Ok(PropRead::Value(value)),
                    None => Ok(PropRead::InvalidProperty),
                }
            }
            HeapData::List(_) | HeapData::Map(_) => {
                if has_builtin_method(receiver, name, heap, interns) {
                    Ok(PropRead::Method)
                } else {
                    Ok(PropRead::InvalidProperty)
                }
            }
            _ => Ok(PropRead::InvalidObject),
        },
        Value::Num(_) | Value::Bool(_) | Value::Str(_) | Value::Null => {
            if has_builtin_method(receiver, name, heap, interns) {
                Ok(PropRead::Method)
            } else {
                Ok(PropRead::InvalidProperty)
            }
        }
        _ => Ok(PropRead::InvalidObject),
    }
}

/// Whether a built-in method with this name exists on the receiver.
fn has_builtin_method(receiver: Value, name: StringId, heap: &Heap, interns: &Interns) -> bool {
    let Some(name) = interns.as_static(name) else {
        return false;
    };
    use StaticName as N;
    if matches!(name, N::Equals | N::NotEquals | N::ToString) {
        return true;
    }
    match receiver {
        Value::Num(_) => num::has_method(name),
        Value::Bool(_) => matches!(name, N::Not),
        Value::Str(_) => str::has_method(name),
        Value::Ref(id) => match heap.get(id) {
            HeapData::List(_) => list::has_method(name),
            HeapData::Map(_) => map::has_method(name),
            _ => false,
        },
        _ => false,
    }
}

/// Writes a property on a value. Only structs and native objects are
/// assignable; the member must already exist (fixed key sets).
pub fn set_property(
    receiver: Value,
    name: StringId,
    value: Value,
    heap: &mut Heap,
    interns: &Interns,
) -> Result<(), String> {
    match receiver {
        Value::Ref(id) => match heap.get_mut(id) {
            HeapData::Struct(s) => s.set_member(name, value, interns),
            HeapData::Native(object) => {
                let text = interns.get(name).to_owned();
                object.set(&text, value, interns)
            }
            _ => Err("Invalid object".to_owned()),
        },
        _ => Err("Invalid object".to_owned()),
    }
}
