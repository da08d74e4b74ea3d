//! The prelude: the fixed set of bindings available before user code runs.
//!
//! Two layers build the globals struct. The native layer binds `version`,
//! `debug`, `fs`, `Promise`, `fetch`, and the `js`/`jslib` bridge stubs
//! directly. The scripted layer is a small program in the runtime's own
//! input format, compiled and executed through the ordinary pipeline; it
//! evaluates to an object literal whose members (`range`, the arithmetic
//! and comparison wrappers, `not`) are merged into globals. Afterwards the
//! globals struct is frozen.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    heap::{Heap, HeapData},
    intern::{Interns, StaticName, StringId},
    ty::{FnType, StructType, Type},
    types::{
        native::{NativeAsyncFn, NativeFn},
        struct_::Struct,
    },
    value::Value,
};

/// The prelude script, in the s-expression input format. It evaluates to
/// an object literal; the runtime merges the members into globals.
pub const PRELUDE_SRC: &str = r#"["let",
  [["const", "range", "Any",
    ["gen", [["n", "Num"]], "Num",
      ["let", [["var", "i", "Num", 0]],
        ["loop",
          ["seq",
            ["if", ["invoke", "i", "geq", "n"], ["break"]],
            ["yield", "i"],
            ["set", "i", ["invoke", "i", "add", 1]]]]]]],
   ["const", "add", "Any", ["fn", [["a", "Num"], ["b", "Num"]], "Num", ["invoke", "a", "add", "b"]]],
   ["const", "sub", "Any", ["fn", [["a", "Num"], ["b", "Num"]], "Num", ["invoke", "a", "sub", "b"]]],
   ["const", "mul", "Any", ["fn", [["a", "Num"], ["b", "Num"]], "Num", ["invoke", "a", "mul", "b"]]],
   ["const", "div", "Any", ["fn", [["a", "Num"], ["b", "Num"]], "Num", ["invoke", "a", "div", "b"]]],
   ["const", "mod", "Any", ["fn", [["a", "Num"], ["b", "Num"]], "Num", ["invoke", "a", "mod", "b"]]],
   ["const", "pow", "Any", ["fn", [["a", "Num"], ["b", "Num"]], "Num", ["invoke", "a", "pow", "b"]]],
   ["const", "eq", "Any", ["fn", [["a", "Any"], ["b", "Any"]], "Bool", ["invoke", "a", "equals", "b"]]],
   ["const", "lt", "Any", ["fn", [["a", "Num"], ["b", "Num"]], "Bool", ["invoke", "a", "lt", "b"]]],
   ["const", "gt", "Any", ["fn", [["a", "Num"], ["b", "Num"]], "Bool", ["invoke", "a", "gt", "b"]]],
   ["const", "not", "Any", ["fn", [["b", "Bool"]], "Bool", ["invoke", "b", "not"]]]],
  {"range": "range", "add": "add", "sub": "sub", "mul": "mul", "div": "div",
   "mod": "mod", "pow": "pow", "eq": "eq", "lt": "lt", "gt": "gt", "not": "not"}]"#;

/// Builds the native layer of the globals struct and returns its heap id.
/// The struct stays unfrozen until the prelude script's members have been
/// merged in.
pub fn base_globals(heap: &mut Heap, interns: &mut Interns) -> crate::heap::HeapId {
    let mut members: IndexMap<StringId, Value> = IndexMap::new();

    let version = interns.intern(env!("CARGO_PKG_VERSION"));
    members.insert(interns.static_name(StaticName::Version), Value::Str(version));
    members.insert(interns.static_name(StaticName::Debug), Value::NativeFn(NativeFn::Debug));
    members.insert(interns.static_name(StaticName::Fs), Value::NativeFn(NativeFn::Fs));
    members.insert(
        interns.static_name(StaticName::Promise),
        Value::NativeAsyncFn(NativeAsyncFn::Promise),
    );
    members.insert(
        interns.static_name(StaticName::Fetch),
        Value::NativeAsyncFn(NativeAsyncFn::Fetch),
    );

    let use_name = interns.static_name(StaticName::Use);
    let js = bridge_struct(heap, use_name, NativeFn::JsUse);
    members.insert(interns.static_name(StaticName::Js), js);
    let jslib = bridge_struct(heap, use_name, NativeFn::JslibUse);
    members.insert(interns.static_name(StaticName::Jslib), jslib);

    heap.alloc(HeapData::Struct(Struct::new(members)))
}

/// A one-member struct holding a bridge stub (`js`/`jslib`).
fn bridge_struct(heap: &mut Heap, use_name: StringId, stub: NativeFn) -> Value {
    let mut members = IndexMap::new();
    members.insert(use_name, Value::NativeFn(stub));
    Value::Ref(heap.alloc(HeapData::Struct(Struct::new(members))))
}

/// Derives the globals struct type from the finished globals value, so
/// the checker can type prelude references through the ordinary Property
/// rule.
pub fn globals_type(globals: crate::heap::HeapId, heap: &Heap, interns: &mut Interns) -> Rc<StructType> {
    let HeapData::Struct(s) = heap.get(globals) else {
        panic!("globals is a struct");
    };
    let mut members: IndexMap<StringId, Type> = IndexMap::with_capacity(s.members.len());
    for (name, value) in &s.members {
        members.insert(*name, member_type(*name, *value, heap));
    }
    let name = interns.intern("Globals");
    Rc::new(StructType {
        name,
        members,
        type_params: Vec::new(),
        impls: Vec::new(),
    })
}

fn member_type(name: StringId, value: Value, heap: &Heap) -> Type {
    match value {
        Value::Ref(id) => match heap.get(id) {
            HeapData::Closure(c) => Type::Fn(Rc::clone(&c.fn_ty)),
            HeapData::Struct(s) => {
                let members = s
                    .members
                    .iter()
                    .map(|(n, v)| (*n, member_type(*n, *v, heap)))
                    .collect();
                Type::Struct(Rc::new(StructType {
                    name,
                    members,
                    type_params: Vec::new(),
                    impls: Vec::new(),
                }))
            }
            _ => Type::Any,
        },
        Value::NativeFn(_) | Value::NativeAsyncFn(_) => Type::Fn(Rc::new(FnType::opaque())),
        other => other.static_type(),
    }
}
