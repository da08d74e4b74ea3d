//! Value-model behavior: interned-scalar identity, built-in methods,
//! iterators, and container semantics.

use pretty_assertions::assert_eq;
use ursa::{CollectStringPrint, Object, Runtime};

fn run(source: &str) -> Object {
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    ursa::eval(&mut runtime, source, "test.json", &mut print)
        .unwrap_or_else(|err| panic!("program failed:\n{err}"))
}

// === interned-scalar identity ===

#[test]
fn runtime_built_strings_share_identity_with_literals() {
    // "a" + "b" is the same value as the literal "ab"
    assert_eq!(
        run(r#"["invoke", ["str", "ab"], "equals", ["invoke", ["str", "a"], "add", ["str", "b"]]]"#),
        Object::Bool(true)
    );
}

#[test]
fn interned_scalars_are_map_keys_by_content() {
    assert_eq!(
        run(
            r#"["let", [["const", "m", "Any", ["map", [["str", "ab"], 7]]]],
                 ["invoke", "m", "get", ["invoke", ["str", "a"], "add", ["str", "b"]]]]"#
        ),
        Object::Num(7.0)
    );
}

#[test]
fn computed_numbers_share_identity() {
    assert_eq!(
        run(r#"["invoke", 7, "equals", ["invoke", 3, "add", 4]]"#),
        Object::Bool(true)
    );
}

#[test]
fn reference_values_compare_by_identity() {
    // two structurally equal lists are different values
    assert_eq!(
        run(r#"["invoke", ["list", 1, 2], "equals", ["list", 1, 2]]"#),
        Object::Bool(false)
    );
    // the same list is itself
    assert_eq!(
        run(r#"["let", [["const", "l", "Any", ["list", 1, 2]]], ["invoke", "l", "equals", "l"]]"#),
        Object::Bool(true)
    );
}

// === Number methods ===

#[test]
fn number_arithmetic_and_comparison() {
    assert_eq!(run(r#"["invoke", 10, "div", 4]"#), Object::Num(2.5));
    assert_eq!(run(r#"["invoke", 2, "pow", 8]"#), Object::Num(256.0));
    assert_eq!(run(r#"["invoke", 7, "mod", 3]"#), Object::Num(1.0));
    assert_eq!(run(r#"["invoke", 5, "neg"]"#), Object::Num(-5.0));
    assert_eq!(run(r#"["invoke", 2.25, "sqrt"]"#), Object::Num(1.5));
    assert_eq!(run(r#"["invoke", 3, "lt", 4]"#), Object::Bool(true));
    assert_eq!(run(r#"["invoke", 3, "geq", 4]"#), Object::Bool(false));
}

#[test]
fn number_bitwise_follows_32_bit_twos_complement() {
    assert_eq!(run(r#"["invoke", 6, "bitwiseAnd", 3]"#), Object::Num(2.0));
    assert_eq!(run(r#"["invoke", 6, "bitwiseOr", 3]"#), Object::Num(7.0));
    assert_eq!(run(r#"["invoke", 6, "bitwiseXor", 3]"#), Object::Num(5.0));
    assert_eq!(run(r#"["invoke", 0, "bitwiseNot"]"#), Object::Num(-1.0));
    assert_eq!(run(r#"["invoke", 1, "shiftLeft", 4]"#), Object::Num(16.0));
    // arithmetic shift keeps the sign
    assert_eq!(run(r#"["invoke", ["invoke", 0, "sub", 8], "shiftRight", 1]"#), Object::Num(-4.0));
    // shiftRightArith is the logical (zero-fill) shift
    assert_eq!(
        run(r#"["invoke", ["invoke", 0, "sub", 8], "shiftRightArith", 1]"#),
        Object::Num(2_147_483_644.0)
    );
}

#[test]
fn number_to_string_prints_like_a_dynamic_runtime() {
    assert_eq!(run(r#"["invoke", 3, "toString"]"#), Object::Str("3".to_owned()));
    assert_eq!(run(r#"["invoke", 3.5, "toString"]"#), Object::Str("3.5".to_owned()));
}

// === String methods ===

#[test]
fn string_methods() {
    assert_eq!(run(r#"["invoke", ["str", "héllo"], "len"]"#), Object::Num(5.0));
    assert_eq!(run(r#"["invoke", ["str", "héllo"], "get", 1]"#), Object::Str("é".to_owned()));
    assert_eq!(run(r#"["invoke", ["str", "abc"], "get", 9]"#), Object::Null);
    assert_eq!(
        run(r#"["invoke", ["str", "a,b,c"], "split", ["str", ","]]"#),
        Object::List(vec![
            Object::Str("a".to_owned()),
            Object::Str("b".to_owned()),
            Object::Str("c".to_owned()),
        ])
    );
    assert_eq!(
        run(r#"["invoke", ["str", "  x "], "trim"]"#),
        Object::Str("x".to_owned())
    );
    assert_eq!(
        run(r#"["invoke", ["str", "abcd"], "startsWith", ["str", "ab"]]"#),
        Object::Bool(true)
    );
    assert_eq!(
        run(r#"["invoke", ["str", "abcd"], "indexOf", ["str", "cd"]]"#),
        Object::Num(2.0)
    );
    assert_eq!(
        run(r#"["invoke", ["str", "ab"], "repeat", 3]"#),
        Object::Str("ababab".to_owned())
    );
    assert_eq!(run(r#"["invoke", ["str", "3.5"], "toNum"]"#), Object::Num(3.5));
    assert_eq!(
        run(r#"["invoke", ["str", "abc"], "lt", ["str", "abd"]]"#),
        Object::Bool(true)
    );
}

// === List methods ===

#[test]
fn list_methods() {
    assert_eq!(run(r#"["invoke", ["list", 1, 2, 3], "len"]"#), Object::Num(3.0));
    assert_eq!(run(r#"["invoke", ["list", 1, 2, 3], "get", 1]"#), Object::Num(2.0));
    assert_eq!(run(r#"["invoke", ["list", 1], "get", 5]"#), Object::Null);
    assert_eq!(run(r#"["invoke", ["list", 1, 2], "pop"]"#), Object::Num(2.0));
    assert_eq!(run(r#"["invoke", ["list"], "pop"]"#), Object::Null);
    assert_eq!(
        run(r#"["invoke", ["list", 1], "push", 2]"#),
        Object::List(vec![Object::Num(1.0), Object::Num(2.0)])
    );
    assert_eq!(
        run(r#"["invoke", ["list", 3, 1, 2], "sorted"]"#),
        Object::List(vec![Object::Num(1.0), Object::Num(2.0), Object::Num(3.0)])
    );
    assert_eq!(
        run(r#"["invoke", ["list", 1, 2, 3], "reversed"]"#),
        Object::List(vec![Object::Num(3.0), Object::Num(2.0), Object::Num(1.0)])
    );
    assert_eq!(
        run(r#"["invoke", ["list", 1, 2, 3, 4], "slice", 1, 3]"#),
        Object::List(vec![Object::Num(2.0), Object::Num(3.0)])
    );
    assert_eq!(
        run(r#"["invoke", ["list", ["str", "a"], ["str", "b"]], "join", ["str", "-"]]"#),
        Object::Str("a-b".to_owned())
    );
    assert_eq!(run(r#"["invoke", ["list", 1, 2], "contains", 2]"#), Object::Bool(true));
    assert_eq!(run(r#"["invoke", ["list", 1, 2], "indexOf", 5]"#), Object::Num(-1.0));
}

#[test]
fn list_set_mutates_in_place() {
    assert_eq!(
        run(
            r#"["let", [["const", "l", "Any", ["list", 1, 2]]],
                 ["seq", ["invoke", "l", "set", 0, 9], "l"]]"#
        ),
        Object::List(vec![Object::Num(9.0), Object::Num(2.0)])
    );
}

// === Map methods ===

#[test]
fn map_methods() {
    assert_eq!(
        run(r#"["invoke", ["map", [1, ["str", "one"]]], "get", 1]"#),
        Object::Str("one".to_owned())
    );
    assert_eq!(run(r#"["invoke", ["map", [1, 2]], "get", 9]"#), Object::Null);
    assert_eq!(run(r#"["invoke", ["map", [1, 2]], "has", 1]"#), Object::Bool(true));
    assert_eq!(
        run(
            r#"["let", [["const", "m", "Any", ["map", [1, 2], [3, 4]]]],
                 ["seq", ["invoke", "m", "delete", 1], ["invoke", "m", "len"]]]"#
        ),
        Object::Num(1.0)
    );
    // set overwrites in place, keeping the original position
    assert_eq!(
        run(
            r#"["let", [["const", "m", "Any", ["map", [1, ["str", "a"]], [2, ["str", "b"]]]]],
                 ["seq", ["invoke", "m", "set", 1, ["str", "c"]], "m"]]"#
        ),
        Object::Map(vec![
            (Object::Num(1.0), Object::Str("c".to_owned())),
            (Object::Num(2.0), Object::Str("b".to_owned())),
        ])
    );
}

// === iterators ===

#[test]
fn list_iter_produces_elements_then_null() {
    assert_eq!(
        run(
            r#"["let", [["const", "it", "Any", ["invoke", ["list", 1, 2], "iter"]]],
                 ["list", ["it"], ["it"], ["it"], ["it"]]]"#
        ),
        Object::List(vec![Object::Num(1.0), Object::Num(2.0), Object::Null, Object::Null])
    );
}

#[test]
fn string_iter_produces_characters() {
    assert_eq!(
        run(
            r#"["let", [["const", "it", "Any", ["invoke", ["str", "ab"], "iter"]]],
                 ["list", ["it"], ["it"], ["it"]]]"#
        ),
        Object::List(vec![
            Object::Str("a".to_owned()),
            Object::Str("b".to_owned()),
            Object::Null,
        ])
    );
}

#[test]
fn map_iter_yields_pairs_and_keys_in_order() {
    assert_eq!(
        run(
            r#"["let", [["const", "it", "Any", ["invoke", ["map", [1, 2], [3, 4]], "iter"]]],
                 ["list", ["it"], ["it"], ["it"]]]"#
        ),
        Object::List(vec![
            Object::List(vec![Object::Num(1.0), Object::Num(2.0)]),
            Object::List(vec![Object::Num(3.0), Object::Num(4.0)]),
            Object::Null,
        ])
    );
    assert_eq!(
        run(
            r#"["let", [["const", "it", "Any", ["invoke", ["map", [["str", "k"], 1]], "keys"]]],
                 ["it"]]"#
        ),
        Object::Str("k".to_owned())
    );
}

// === shared containers ===

#[test]
fn struct_member_set_and_read_back() {
    assert_eq!(
        run(
            r#"["let", [["const", "o", "Any", {"a": 1}]],
                 ["seq", ["set", ["prop", "a", "o"], 5], ["prop", "a", "o"]]]"#
        ),
        Object::Num(5.0)
    );
}

#[test]
fn lists_are_shared_by_reference() {
    assert_eq!(
        run(
            r#"["let", [["const", "a", "Any", ["list", 1]],
                        ["const", "b", "Any", "a"]],
                 ["seq", ["invoke", "b", "push", 2], ["invoke", "a", "len"]]]"#
        ),
        Object::Num(2.0)
    );
}
