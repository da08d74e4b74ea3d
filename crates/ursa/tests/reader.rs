//! The JSON s-expression mapping, exercised end-to-end: every JSON shape
//! lands on the documented language form.

use pretty_assertions::assert_eq;
use ursa::{CollectStringPrint, Error, Object, Runtime};

fn run(source: &str) -> Object {
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    ursa::eval(&mut runtime, source, "test.json", &mut print)
        .unwrap_or_else(|err| panic!("program failed:\n{err}"))
}

fn run_err(source: &str) -> Error {
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    ursa::eval(&mut runtime, source, "test.json", &mut print).expect_err("program should fail")
}

#[test]
fn json_scalars_are_literals() {
    assert_eq!(run("null"), Object::Null);
    assert_eq!(run("true"), Object::Bool(true));
    assert_eq!(run("false"), Object::Bool(false));
    assert_eq!(run("3.5"), Object::Num(3.5));
    assert_eq!(run("-17"), Object::Num(-17.0));
}

#[test]
fn bare_strings_are_symbol_references() {
    // `version` is a prelude symbol; an unbound name is an error
    assert!(matches!(run(r#""version""#), Object::Str(_)));
    let err = run_err(r#""no_such_name""#);
    assert_eq!(err.message(), "Undefined symbol `no_such_name'");
}

#[test]
fn str_form_is_a_string_literal() {
    assert_eq!(run(r#"["str", "hello"]"#), Object::Str("hello".to_owned()));
    assert_eq!(run(r#"["str", ""]"#), Object::Str(String::new()));
    // escapes come through the reader
    assert_eq!(run(r#"["str", "a\nbé"]"#), Object::Str("a\nbé".to_owned()));
}

#[test]
fn list_and_map_forms_build_containers() {
    assert_eq!(
        run(r#"["list", 1, ["str", "two"], null]"#),
        Object::List(vec![Object::Num(1.0), Object::Str("two".to_owned()), Object::Null])
    );
    assert_eq!(run(r#"["list"]"#), Object::List(vec![]));
    assert_eq!(run(r#"["map"]"#), Object::Map(vec![]));
}

#[test]
fn json_objects_are_object_literals() {
    assert_eq!(
        run(r#"{"b": 2, "a": 1}"#),
        Object::Struct(
            [("b".to_owned(), Object::Num(2.0)), ("a".to_owned(), Object::Num(1.0))]
                .into_iter()
                .collect()
        )
    );
}

#[test]
fn any_other_list_is_a_call() {
    // symbol head
    assert_eq!(run(r#"["add", 2, 3]"#), Object::Num(5.0));
    // computed head
    assert_eq!(run(r#"[["fn", [["x", "Num"]], "Num", "x"], 9]"#), Object::Num(9.0));
}

#[test]
fn if_with_and_without_alternate() {
    assert_eq!(run(r#"["if", true, 1]"#), Object::Num(1.0));
    assert_eq!(run(r#"["if", false, 1]"#), Object::Null);
    assert_eq!(run(r#"["if", false, 1, 2]"#), Object::Num(2.0));
}

#[test]
fn break_return_yield_value_forms_are_optional() {
    assert_eq!(run(r#"["loop", ["break"]]"#), Object::Null);
    assert_eq!(run(r#"[["fn", [], "Null", ["return"]]]"#), Object::Null);
}

#[test]
fn malformed_special_forms_are_compile_errors() {
    for (source, needle) in [
        (r#"["str"]"#, "`str'"),
        (r#"["let", [["const", "a", "Num"]], "a"]"#, "Invalid let binding"),
        (r#"["fn", [], "Num"]"#, "`fn'"),
        (r#"["prop", 3, {"a": 1}]"#, "`prop'"),
        (r#"["map", [1]]"#, "`map'"),
        (r#"["invoke", 3]"#, "`invoke'"),
        (r#"["if", true]"#, "`if'"),
    ] {
        let err = run_err(source);
        assert!(matches!(err, Error::Compile { .. }), "{source} gave {err}");
        assert!(err.message().contains(needle), "{source} gave {}", err.message());
    }
}

#[test]
fn invalid_json_is_a_parse_error() {
    for source in ["", "[1,", "{\"a\" 1}", "tru", "\"unterminated", "01x"] {
        let err = run_err(source);
        assert!(matches!(err, Error::Compile { .. }), "{source:?} gave {err}");
    }
}
