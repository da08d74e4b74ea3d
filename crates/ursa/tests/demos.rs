//! Runs every program under demos/ and pins the expected results.

use std::{fs, path::PathBuf};

use pretty_assertions::assert_eq;
use ursa::{CollectStringPrint, Object, Runtime};

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

fn run_demo(name: &str) -> (Object, String) {
    let path = demos_dir().join(name);
    let source = fs::read_to_string(&path).unwrap_or_else(|err| panic!("cannot read {}: {err}", path.display()));
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    let result = ursa::eval(&mut runtime, &source, name, &mut print)
        .unwrap_or_else(|err| panic!("{name} failed:\n{err}"));
    (result, print.output().to_owned())
}

#[test]
fn every_demo_runs_cleanly() {
    let mut count = 0;
    for entry in fs::read_dir(demos_dir()).expect("demos directory exists") {
        let path = entry.expect("directory entry").path();
        if path.extension().is_some_and(|ext| ext == "json") {
            let name = path.file_name().expect("file name").to_string_lossy().into_owned();
            run_demo(&name);
            count += 1;
        }
    }
    assert!(count >= 4, "expected the full demo set, found {count}");
}

#[test]
fn fib_demo() {
    let (result, output) = run_demo("fib.json");
    assert_eq!(result, Object::Num(6765.0));
    assert_eq!(output, "\"fib(20) =\" 6765\n");
}

#[test]
fn range_sum_demo() {
    let (result, _) = run_demo("range-sum.json");
    assert_eq!(result, Object::Num(45.0));
}

#[test]
fn tasks_demo() {
    let (result, output) = run_demo("tasks.json");
    assert_eq!(result, Object::Num(25.0));
    assert_eq!(output, "\"squares launched\"\n");
}

#[test]
fn words_demo() {
    let (result, output) = run_demo("words.json");
    assert_eq!(result, Object::Str("QUICK BROWN".to_owned()));
    assert_eq!(output, "4 \"words\"\n");
}