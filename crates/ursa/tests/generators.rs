//! Generator semantics: continuation construction, resumption order,
//! resume arguments, and the monotonic `done` flag.

use pretty_assertions::assert_eq;
use ursa::{CollectStringPrint, Object, Runtime};

fn run(source: &str) -> Object {
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    ursa::eval(&mut runtime, source, "test.json", &mut print)
        .unwrap_or_else(|err| panic!("program failed:\n{err}"))
}

#[test]
fn calling_a_generator_returns_without_running_it() {
    // the body would print if it ran
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    let result = ursa::eval(
        &mut runtime,
        r#"["let", [["const", "g", "Any",
                     ["gen", [], "Num", ["seq", ["debug", ["str", "ran"]], ["yield", 1]]]]],
             ["seq", ["g"], 0]]"#,
        "test.json",
        &mut print,
    )
    .unwrap();
    assert_eq!(result, Object::Num(0.0));
    assert_eq!(print.output(), "", "generator body ran before first resume");
}

#[test]
fn yields_in_order_then_null_forever() {
    assert_eq!(
        run(
            r#"["let", [["const", "g", "Any",
                         ["gen", [], "Num", ["seq", ["yield", 1], ["yield", 2]]]],
                        ["const", "it", "Any", ["g"]]],
                 ["list", ["it"], ["it"], ["it"], ["it"], ["it"]]]"#
        ),
        Object::List(vec![
            Object::Num(1.0),
            Object::Num(2.0),
            Object::Null,
            Object::Null,
            Object::Null,
        ])
    );
}

#[test]
fn generator_arguments_bind_at_call_time() {
    assert_eq!(
        run(
            r#"["let", [["const", "g", "Any",
                         ["gen", [["base", "Num"]], "Num",
                           ["seq", ["yield", "base"], ["yield", ["invoke", "base", "add", 1]]]]],
                        ["const", "it", "Any", ["g", 10]]],
                 ["list", ["it"], ["it"]]]"#
        ),
        Object::List(vec![Object::Num(10.0), Object::Num(11.0)])
    );
}

#[test]
fn resume_argument_becomes_the_yield_value() {
    // first resume's argument is discarded; the second lands as the
    // value of the first yield expression
    assert_eq!(
        run(
            r#"["let", [["const", "g", "Any",
                         ["gen", [], "Num",
                           ["let", [["var", "got", "Any", null]],
                             ["seq",
                               ["set", "got", ["yield", 1]],
                               ["yield", "got"]]]]],
                        ["const", "it", "Any", ["g"]]],
                 ["seq", ["it"], ["it", 42]]]"#
        ),
        Object::Num(42.0)
    );
}

#[test]
fn completion_returns_body_value_then_null() {
    // after the last yield, the next call runs to completion and
    // returns the body's value
    assert_eq!(
        run(
            r#"["let", [["const", "g", "Any",
                         ["gen", [], "Num", ["seq", ["yield", 1], 7]]],
                        ["const", "it", "Any", ["g"]]],
                 ["list", ["it"], ["it"], ["it"]]]"#
        ),
        Object::List(vec![Object::Num(1.0), Object::Num(7.0), Object::Null])
    );
}

#[test]
fn generators_capture_like_closures() {
    assert_eq!(
        run(
            r#"["let", [["var", "n", "Num", 100],
                        ["const", "g", "Any", ["gen", [], "Num", ["yield", "n"]]],
                        ["const", "it", "Any", ["g"]]],
                 ["seq", ["set", "n", 5], ["it"]]]"#
        ),
        Object::Num(5.0)
    );
}

#[test]
fn independent_continuations_from_one_generator() {
    assert_eq!(
        run(
            r#"["let", [["const", "g", "Any",
                         ["gen", [], "Num", ["seq", ["yield", 1], ["yield", 2]]]],
                        ["const", "a", "Any", ["g"]],
                        ["const", "b", "Any", ["g"]]],
                 ["list", ["a"], ["a"], ["b"]]]"#
        ),
        Object::List(vec![Object::Num(1.0), Object::Num(2.0), Object::Num(1.0)])
    );
}

#[test]
fn prelude_range_is_a_generator() {
    assert_eq!(
        run(
            r#"["let", [["const", "it", "Any", ["range", 3]]],
                 ["list", ["it"], ["it"], ["it"], ["it"]]]"#
        ),
        Object::List(vec![Object::Num(0.0), Object::Num(1.0), Object::Num(2.0), Object::Null])
    );
}

#[test]
fn generator_loops_drive_iteration() {
    // sum 0..=4 by resuming a range continuation until it is done
    assert_eq!(
        run(
            r#"["let", [["const", "it", "Any", ["range", 5]],
                        ["var", "sum", "Num", 0]],
                 ["loop",
                   ["let", [["const", "next", "Any", ["it"]]],
                     ["if", ["invoke", "next", "equals", null],
                       ["break", "sum"],
                       ["set", "sum", ["invoke", "sum", "add", "next"]]]]]]"#
        ),
        Object::Num(10.0)
    );
}
