//! The `ursa` command-line front end.
//!
//! Supported surface: `ursa run FILE`, `ursa --eval EXPR`,
//! `ursa --interactive`, `ursa --version`. Input is the low-level JSON
//! s-expression syntax; the surface-syntax reader, formatter, and
//! compile-to-target modes live in separate tools.

use std::{
    env, fs,
    io::{self, BufRead, Write},
    process::ExitCode,
};

use ursa::{Object, ReplSession, Runner, Runtime, StderrTracer, StdPrint};

const USAGE: &str = "\
Usage: ursa [OPTIONS] [COMMAND]

Commands:
  run FILE          Run a program from FILE

Options:
  --eval EXPR       Evaluate EXPR and print its value
  --interactive     Start an interactive session (also after run/eval)
  --syntax=FORM     Input syntax; only `json' is built in
  --trace           Log every executed instruction to stderr
  --version         Print the version and exit
  --help            Print this help
";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut interactive = false;
    let mut trace = false;
    let mut eval_expr: Option<String> = None;
    let mut run_file: Option<String> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print!("{USAGE}");
                return ExitCode::SUCCESS;
            }
            "--version" => {
                println!("ursa {}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            "--interactive" | "-i" => interactive = true,
            "--trace" => trace = true,
            "--eval" | "-e" => match iter.next() {
                Some(expr) => eval_expr = Some(expr.clone()),
                None => {
                    eprintln!("error: --eval needs an expression");
                    return ExitCode::FAILURE;
                }
            },
            "run" => match iter.next() {
                Some(file) => run_file = Some(file.clone()),
                None => {
                    eprintln!("error: run needs a file");
                    return ExitCode::FAILURE;
                }
            },
            other if other.starts_with("--syntax=") => {
                let syntax = &other["--syntax=".len()..];
                if syntax != "json" {
                    eprintln!("error: only --syntax=json is built in; the `{syntax}' reader is a separate tool");
                    return ExitCode::FAILURE;
                }
            }
            other if other.starts_with("--target=") || other == "fmt" || other == "compile" => {
                eprintln!("error: `{other}' is not supported by this runtime build");
                return ExitCode::FAILURE;
            }
            other => {
                eprintln!("error: unknown argument `{other}'\n{USAGE}");
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(file) = run_file {
        let source = match fs::read_to_string(&file) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("error: cannot read {file}: {err}");
                return ExitCode::FAILURE;
            }
        };
        let mut runtime = Runtime::new();
        let runner = match Runner::compile(&mut runtime, &source, &file) {
            Ok(runner) => runner,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        };
        let outcome = if trace {
            runner.run_traced(&mut runtime, Vec::new(), &mut StdPrint, StderrTracer)
        } else {
            runner.run(&mut runtime, &mut StdPrint)
        };
        match outcome {
            Ok(value) => {
                if !matches!(value, Object::Null) {
                    println!("{value}");
                }
            }
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        }
        if interactive {
            return repl();
        }
        return ExitCode::SUCCESS;
    }

    if let Some(expr) = eval_expr {
        let mut runtime = Runtime::new();
        match ursa::eval(&mut runtime, &expr, "<eval>", &mut StdPrint) {
            Ok(value) => {
                println!("{value}");
                if interactive {
                    return repl();
                }
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{err}");
                ExitCode::FAILURE
            }
        }
    } else if interactive || args.is_empty() {
        repl()
    } else {
        ExitCode::SUCCESS
    }
}

fn repl() -> ExitCode {
    let mut session = ReplSession::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            return ExitCode::SUCCESS;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == ":quit" || line == ":q" {
            return ExitCode::SUCCESS;
        }
        match session.eval(line, &mut StdPrint) {
            Ok(value) => println!("{value}"),
            Err(err) => eprintln!("{err}"),
        }
    }
}
