//! Error surfaces: runtime error kinds, traceback rendering, and the
//! line/column banner.

use pretty_assertions::assert_eq;
use ursa::{CollectStringPrint, Error, Object, Runner, Runtime};

fn run_err(source: &str) -> Error {
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    ursa::eval(&mut runtime, source, "test.json", &mut print).expect_err("program should fail")
}

#[test]
fn invalid_property_read() {
    let err = run_err(r#"["let", [["const", "o", "Any", {"a": 1}]], ["prop", "zap", "o"]]"#);
    assert!(matches!(err, Error::Runtime { .. }));
    assert_eq!(err.message(), "Invalid property `zap'");
}

#[test]
fn invalid_object_property_read() {
    let err = run_err(r#"["let", [["const", "f", "Any", ["fn", [], "Num", 1]]], ["prop", "x", "f"]]"#);
    assert!(matches!(err, Error::Runtime { .. }));
    assert_eq!(err.message(), "Invalid object");
}

#[test]
fn invalid_call_names_the_callee() {
    let err = run_err(r#"["let", [["const", "f", "Any", 3]], ["f"]]"#);
    assert!(matches!(err, Error::Runtime { .. }));
    assert_eq!(err.message(), "Invalid call to `f'");
}

#[test]
fn invalid_method_at_runtime_behind_any() {
    let err = run_err(r#"["let", [["const", "x", "Any", 3]], ["invoke", "x", "frobnicate"]]"#);
    assert!(matches!(err, Error::Runtime { .. }));
    assert_eq!(err.message(), "Invalid method `frobnicate'");
}

#[test]
fn dynamic_condition_guard() {
    let err = run_err(r#"["let", [["const", "c", "Any", 3]], ["if", "c", 1, 0]]"#);
    assert!(matches!(err, Error::Runtime { .. }));
    assert_eq!(err.message(), "Invalid condition");
}

#[test]
fn traceback_names_the_function_chain() {
    let err = run_err(
        r#"["let", [["const", "inner", "Any",
                     ["fn", [["x", "Any"]], "Any", ["invoke", "x", "frobnicate"]]],
                    ["const", "outer", "Any",
                     ["fn", [], "Any", ["inner", 3]]]],
             ["outer"]]"#,
    );
    let rendered = err.to_string();
    assert!(rendered.contains("Traceback (innermost last):"), "{rendered}");
    assert!(rendered.contains("at top level"), "{rendered}");
    assert!(rendered.contains("in outer"), "{rendered}");
    assert!(rendered.contains("in inner"), "{rendered}");
    assert!(rendered.contains("Runtime error: Invalid method `frobnicate'"), "{rendered}");
}

#[test]
fn compile_error_banner_has_location_and_underline() {
    let mut runtime = Runtime::new();
    let source = r#"["seq", "nonesuch"]"#;
    let err = Runner::compile(&mut runtime, source, "test.json").expect_err("should not compile");
    let rendered = err.to_string();
    assert!(rendered.contains("test.json:1:9"), "{rendered}");
    assert!(rendered.contains(r#"   1 | ["seq", "nonesuch"]"#), "{rendered}");
    assert!(rendered.contains("^~~~~~~~~~"), "{rendered}");
    assert!(rendered.contains("Compile error: Undefined symbol `nonesuch'"), "{rendered}");
}

#[test]
fn parse_errors_carry_spans() {
    let mut runtime = Runtime::new();
    let err = Runner::compile(&mut runtime, "[1, 2", "test.json").expect_err("should not parse");
    let rendered = err.to_string();
    assert!(rendered.contains("Parse error"), "{rendered}");
    assert!(rendered.contains("test.json:1:6"), "{rendered}");
}

#[test]
fn runtime_error_banner_points_at_the_instruction() {
    let source = "[\"seq\",\n [\"invoke\", 1, \"add\", 1],\n [\"await\", 3]]";
    let err = run_err(source);
    let rendered = err.to_string();
    assert!(rendered.contains("test.json:3:2"), "{rendered}");
    assert!(rendered.contains(r#"   3 |  ["await", 3]"#), "{rendered}");
}

#[test]
fn recursion_depth_is_bounded() {
    let err = run_err(
        r#"["let", [["const", "f", "Any", ["fn", [], "Any", ["f"]]]], ["f"]]"#,
    );
    assert!(matches!(err, Error::Runtime { .. }));
    assert_eq!(err.message(), "Maximum call depth exceeded");
}

#[test]
fn js_bridge_stubs_raise() {
    let err = run_err(r#"["invoke", ["seq", "js"], "use", ["str", "fs"]]"#);
    assert!(matches!(err, Error::Runtime { .. }));
    assert_eq!(err.message(), "JavaScript interop is not available in this runtime");
}

#[test]
fn fetch_raises_without_network() {
    let err = run_err(r#"["await", ["fetch", ["str", "https://example.com/"]]]"#);
    assert!(matches!(err, Error::Runtime { .. }));
    assert_eq!(err.message(), "fetch: network access is not available");
}

#[test]
fn successful_compile_still_runs_after_error() {
    // one runtime survives a failed program and runs the next
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    let _ = ursa::eval(&mut runtime, r#"["await", 3]"#, "a.json", &mut print).expect_err("fails");
    let ok = ursa::eval(&mut runtime, r#"["invoke", 1, "add", 1]"#, "b.json", &mut print).unwrap();
    assert_eq!(ok, Object::Num(2.0));
}
