//! Type checker rules: accumulation, call checking, condition types,
//! assignment equality, and gradual `Any` escape hatches.

use pretty_assertions::assert_eq;
use ursa::{CollectStringPrint, Diagnostic, Error, Object, Runner, Runtime};

fn compile_err(source: &str) -> Vec<Diagnostic> {
    let mut runtime = Runtime::new();
    match Runner::compile(&mut runtime, source, "test.json") {
        Ok(_) => panic!("program should not compile"),
        Err(Error::Compile { diagnostics, .. }) => diagnostics,
        Err(other) => panic!("expected compile error, got {other}"),
    }
}

fn run(source: &str) -> Object {
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    ursa::eval(&mut runtime, source, "test.json", &mut print)
        .unwrap_or_else(|err| panic!("program failed:\n{err}"))
}

#[test]
fn condition_must_be_bool() {
    let diags = compile_err(r#"["if", 3, 1, 0]"#);
    assert_eq!(diags[0].message, "Condition must be a Bool, got Num");
}

#[test]
fn and_or_operands_must_be_bool() {
    let diags = compile_err(r#"["and", 1, true]"#);
    assert_eq!(diags[0].message, "Condition must be a Bool, got Num");
    let diags = compile_err(r#"["or", false, ["str", "x"]]"#);
    assert_eq!(diags[0].message, "Condition must be a Bool, got Str");
}

#[test]
fn call_arity_is_checked_against_known_fn_types() {
    let diags = compile_err(r#"[["fn", [["x", "Num"]], "Num", "x"], 1, 2]"#);
    assert_eq!(diags[0].message, "Expected 1 argument(s), got 2");
}

#[test]
fn call_argument_types_are_checked_pairwise() {
    let diags = compile_err(r#"[["fn", [["x", "Num"]], "Num", "x"], ["str", "a"]]"#);
    assert_eq!(diags[0].message, "Argument 1 has type Str, expected Num");
}

#[test]
fn calling_a_non_callable_type_is_rejected() {
    let diags = compile_err(r#"[3, 4]"#);
    assert_eq!(diags[0].message, "Invalid call: Num is not callable");
}

#[test]
fn return_type_must_match_declaration() {
    let diags = compile_err(r#"["fn", [], "Num", ["return", ["str", "a"]]]"#);
    assert_eq!(diags[0].message, "Return type mismatch: expected Num, got Str");
}

#[test]
fn generator_returns_are_unchecked() {
    // generator returns are not checked against the declared type
    assert!(matches!(
        run(r#"["seq", ["gen", [], "Num", ["return", ["str", "a"]]], 1]"#),
        Object::Num(_)
    ));
}

#[test]
fn assignment_requires_equal_types() {
    let diags = compile_err(r#"["let", [["var", "a", "Num", 0]], ["set", "a", ["str", "x"]]]"#);
    assert_eq!(diags[0].message, "Type mismatch in assignment: expected Num, got Str");
}

#[test]
fn any_typed_bindings_skip_static_checks() {
    // same shape as above, but the binding is Any: the checker passes
    // and the dynamic guard raises instead
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    let err = ursa::eval(
        &mut runtime,
        r#"["let", [["var", "a", "Any", 0]], ["set", "a", ["str", "x"]]]"#,
        "test.json",
        &mut print,
    )
    .expect_err("the dynamic guard should fire");
    assert!(matches!(err, Error::Runtime { .. }));
    assert_eq!(err.message(), "Assignment to different type");
}

#[test]
fn unknown_method_on_concrete_type() {
    let diags = compile_err(r#"["invoke", 3, "push", 1]"#);
    assert_eq!(diags[0].message, "Invalid method `push'");
}

#[test]
fn method_argument_types_are_checked() {
    let diags = compile_err(r#"["invoke", 3, "add", ["str", "x"]]"#);
    assert_eq!(diags[0].message, "Argument 1 has type Str, expected Num");
}

#[test]
fn struct_member_reads_are_typed() {
    // o.a is Num, so using it as a condition is rejected
    let diags = compile_err(r#"["if", ["prop", "a", {"a": 1}], 1, 0]"#);
    assert_eq!(diags[0].message, "Condition must be a Bool, got Num");
}

#[test]
fn non_callable_struct_member_is_rejected() {
    let diags = compile_err(r#"["invoke", {"a": 1}, "a"]"#);
    assert_eq!(diags[0].message, "Member `a' is not callable");
}

#[test]
fn property_on_non_object_type() {
    let diags = compile_err(r#"["prop", "x", ["fn", [], "Num", 1]]"#);
    assert_eq!(diags[0].message, "Invalid object");
}

#[test]
fn errors_accumulate_instead_of_stopping() {
    let diags = compile_err(r#"["seq", ["if", 1, 2, 3], ["and", 4, 5]]"#);
    assert_eq!(diags.len(), 3, "one for the if condition, two for the and operands");
}

#[test]
fn if_without_else_unions_null() {
    // then-branch Num, missing else contributes Null: assigning the
    // union into a Num slot is a mismatch
    let diags = compile_err(
        r#"["let", [["var", "a", "Num", 0]],
             ["set", "a", ["if", true, 1]]]"#,
    );
    assert_eq!(diags[0].message, "Type mismatch in assignment: expected Num, got Num | Null");
}

#[test]
fn loop_type_comes_from_breaks() {
    // a loop whose breaks all carry Num can initialise a Num slot
    assert_eq!(
        run(r#"["let", [["var", "a", "Num", 0]], ["set", "a", ["loop", ["break", 9]]]]"#),
        Object::Num(9.0)
    );
}

#[test]
fn undefined_symbol_is_a_compile_error() {
    let diags = compile_err(r#"["seq", "nonesuch"]"#);
    assert_eq!(diags[0].message, "Undefined symbol `nonesuch'");
}

#[test]
fn duplicate_parameters_are_rejected() {
    let diags = compile_err(r#"["fn", [["x", "Num"], ["x", "Num"]], "Num", "x"]"#);
    assert_eq!(diags[0].message, "Duplicate parameter `x'");
}

#[test]
fn control_flow_outside_context_is_rejected() {
    assert_eq!(compile_err(r#"["break"]"#)[0].message, "Break outside a loop");
    assert_eq!(compile_err(r#"["continue"]"#)[0].message, "Continue outside a loop");
    assert_eq!(compile_err(r#"["return", 3]"#)[0].message, "Return outside a function");
    assert_eq!(
        compile_err(r#"["fn", [], "Num", ["yield", 1]]"#)[0].message,
        "Yield outside a generator"
    );
}

#[test]
fn bad_lvalue_is_rejected() {
    let diags = compile_err(r#"["set", ["invoke", 1, "add", 2], 3]"#);
    assert_eq!(diags[0].message, "Bad lvalue");
}

#[test]
fn break_cannot_cross_a_launch_boundary() {
    let diags = compile_err(r#"["loop", ["launch", ["break"]]]"#);
    assert_eq!(diags[0].message, "Break outside a loop");
}
