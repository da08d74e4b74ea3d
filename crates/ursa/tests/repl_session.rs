//! REPL sessions: persistent top-level bindings, shared interning, and
//! rollback on failed inputs.

use pretty_assertions::assert_eq;
use ursa::{CollectStringPrint, Object, ReplSession};

#[test]
fn top_level_lets_persist_across_inputs() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();

    let first = session
        .eval(r#"["let", [["var", "x", "Num", 1]], "x"]"#, &mut print)
        .unwrap();
    assert_eq!(first, Object::Num(1.0));

    let second = session.eval(r#"["set", "x", 5]"#, &mut print).unwrap();
    assert_eq!(second, Object::Num(5.0));

    let third = session.eval(r#"["invoke", "x", "add", 1]"#, &mut print).unwrap();
    assert_eq!(third, Object::Num(6.0));
}

#[test]
fn later_bindings_shadow_earlier_ones() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();

    session
        .eval(r#"["let", [["const", "x", "Num", 1]], "x"]"#, &mut print)
        .unwrap();
    session
        .eval(r#"["let", [["const", "x", "Str", ["str", "two"]]], "x"]"#, &mut print)
        .unwrap();
    let result = session.eval(r#"["seq", "x"]"#, &mut print).unwrap();
    assert_eq!(result, Object::Str("two".to_owned()));
}

#[test]
fn closures_keep_capturing_session_bindings() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();

    session
        .eval(r#"["let", [["var", "n", "Num", 10]], "n"]"#, &mut print)
        .unwrap();
    session
        .eval(
            r#"["let", [["const", "get", "Any", ["fn", [], "Num", "n"]]], "get"]"#,
            &mut print,
        )
        .unwrap();
    session.eval(r#"["set", "n", 42]"#, &mut print).unwrap();
    let result = session.eval(r#"["get"]"#, &mut print).unwrap();
    assert_eq!(result, Object::Num(42.0));
}

#[test]
fn failed_inputs_do_not_corrupt_the_session() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();

    session
        .eval(r#"["let", [["var", "x", "Num", 7]], "x"]"#, &mut print)
        .unwrap();
    // a compile error...
    session.eval(r#"["seq", "nonesuch"]"#, &mut print).unwrap_err();
    // ...and a runtime error...
    session.eval(r#"["await", "x"]"#, &mut print).unwrap_err();
    // ...leave the earlier binding intact
    let result = session.eval(r#"["invoke", "x", "add", 0]"#, &mut print).unwrap();
    assert_eq!(result, Object::Num(7.0));
}

#[test]
fn non_let_inputs_do_not_leak_bindings() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();

    session
        .eval(r#"["seq", ["let", [["const", "tmp", "Num", 1]], "tmp"]]"#, &mut print)
        .unwrap();
    let err = session.eval(r#"["seq", "tmp"]"#, &mut print).unwrap_err();
    assert_eq!(err.message(), "Undefined symbol `tmp'");
}
