//! Interactive evaluation with persistent top-level bindings.
//!
//! A `ReplSession` keeps one `Runtime` plus the top-level frame state
//! across inputs: a top-level `let` extends the persistent frame instead
//! of closing a block, so later inputs see earlier bindings. Heap,
//! interning, and globals are shared, so scalar identity holds across the
//! whole session.
//!
//! On a failed input the session state is unchanged: bindings only commit
//! when both compilation and execution succeed.

use crate::{
    compile::Compiler,
    error::Error,
    expressions::Location,
    flatten,
    heap::HeapId,
    io::PrintWriter,
    object::Object,
    parse,
    run::Runtime,
    tasks::Frame,
    tracer::NoopTracer,
    typecheck,
    vm::Vm,
};

/// An interactive session.
#[derive(Debug)]
pub struct ReplSession {
    runtime: Runtime,
    /// Compile-time view of the persistent frame.
    locations: Vec<Location>,
    /// Runtime view: the persistent frame's local cells.
    cells: Vec<HeapId>,
}

impl ReplSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            runtime: Runtime::new(),
            locations: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// The underlying runtime (for host-value conversion).
    #[must_use]
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Evaluates one input and returns its value.
    ///
    /// # Errors
    /// Compile diagnostics or the runtime failure, rendered against this
    /// input; the session state rolls back on error.
    pub fn eval(&mut self, source: &str, print: &mut impl PrintWriter) -> Result<Object, Error> {
        let script_name = "<repl>";
        let sexp = parse::parse(source).map_err(|d| Error::compile(vec![d], script_name, source))?;

        let compiler = Compiler::with_top_locals(
            &mut self.runtime.interns,
            &self.runtime.globals_names,
            self.locations.clone(),
        );
        let compiled = compiler
            .compile_repl(&sexp)
            .map_err(|diags| Error::compile(diags, script_name, source))?;
        let mut tree = compiled.tree;

        let type_errors = typecheck::check(&mut tree, &self.runtime.globals_ty, &mut self.runtime.interns);
        if !type_errors.is_empty() {
            return Err(Error::compile(type_errors, script_name, source));
        }

        let code = flatten::flatten(&tree, &mut self.runtime.next_inst)
            .map_err(|diags| Error::compile(diags, script_name, source))?;

        let mut frame = Frame::root(0);
        frame.locals = self.cells.clone();
        let vm = Vm::new(
            &code,
            &mut self.runtime.heap,
            &mut self.runtime.interns,
            self.runtime.globals,
            print,
            NoopTracer,
        );
        let (value, frame) = vm
            .run(frame)
            .map_err(|e| Error::runtime(e, script_name, source))?;

        // Commit the session state only after a fully successful input.
        self.locations = compiled.top_locals;
        self.cells = frame.locals;
        Ok(Object::new(value, &self.runtime.heap, &self.runtime.interns))
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}
