#![doc = include_str!("../../../README.md")]

mod compile;
mod error;
mod expressions;
mod flatten;
mod heap;
mod inst;
mod intern;
mod io;
mod object;
mod parse;
mod prelude;
mod repl;
mod run;
mod tasks;
mod tracer;
mod ty;
mod typecheck;
mod types;
mod value;
mod vm;

pub use crate::{
    error::{Diagnostic, DiagnosticKind, Error, RuntimeError, TraceFrame, render_banner},
    heap::HeapStats,
    io::{CollectStringPrint, PrintWriter, StdPrint},
    object::Object,
    parse::{CodeLoc, CodeRange},
    repl::ReplSession,
    run::{Runner, Runtime, eval},
    tracer::{CountingTracer, NoopTracer, StderrTracer, VmTracer},
    vm::MAX_CALL_DEPTH,
};
