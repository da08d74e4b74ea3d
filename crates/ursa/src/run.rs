//! Public interface for running Ursa code.
//!
//! A `Runtime` owns everything with identity (the arena heap, the intern
//! table, the frozen globals struct, and the monotonic instruction-id
//! counter), so nothing lives in process-wide statics. A `Runner` is one
//! compiled program; running it borrows the runtime, so successive runs
//! (and successive programs) share interning and globals.
//!
//! # Example
//! ```
//! use ursa::{Runner, Runtime, Object, StdPrint};
//!
//! let mut runtime = Runtime::new();
//! let runner = Runner::compile(&mut runtime, r#"["invoke", 1, "add", 2]"#, "example.json").unwrap();
//! let result = runner.run(&mut runtime, &mut StdPrint).unwrap();
//! assert_eq!(result, Object::Num(3.0));
//! ```

use std::rc::Rc;

use ahash::AHashSet;

use crate::{
    compile::Compiler,
    error::{Error, RuntimeError},
    expressions::Location,
    flatten,
    heap::{Heap, HeapData, HeapId},
    inst::Code,
    intern::{Interns, StringId},
    io::PrintWriter,
    object::Object,
    parse,
    prelude,
    tasks::Frame,
    tracer::{NoopTracer, VmTracer},
    ty::{StructType, Type},
    typecheck,
    value::Value,
    vm::Vm,
};

/// Owns all session state: heap, interns, globals, and the instruction-id
/// counter. Create one per embedding session; every program compiled and
/// run against it shares scalar interning and the frozen globals.
#[derive(Debug)]
pub struct Runtime {
    pub(crate) heap: Heap,
    pub(crate) interns: Interns,
    pub(crate) globals: HeapId,
    pub(crate) globals_ty: Rc<StructType>,
    pub(crate) globals_names: AHashSet<StringId>,
    pub(crate) next_inst: u32,
}

impl Runtime {
    /// Creates a runtime and executes the prelude.
    ///
    /// # Panics
    /// Panics if the built-in prelude fails to compile or run; that is an
    /// internal invariant (the prelude's successful execution is a
    /// precondition for user programs).
    #[must_use]
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let mut interns = Interns::new();
        let globals = prelude::base_globals(&mut heap, &mut interns);

        let mut runtime = Self {
            globals_ty: prelude::globals_type(globals, &heap, &mut interns),
            globals_names: globals_names(globals, &heap),
            heap,
            interns,
            globals,
            next_inst: 0,
        };
        runtime.run_prelude_script();
        runtime
    }

    /// Compiles and runs the prelude script, merges its members into
    /// globals, recomputes the globals type, and freezes the struct.
    fn run_prelude_script(&mut self) {
        let sexp = parse::parse(prelude::PRELUDE_SRC).expect("prelude parses");
        let compiler = Compiler::new(&mut self.interns, &self.globals_names);
        let compiled = compiler.compile(&sexp).expect("prelude compiles");
        let mut tree = compiled.tree;
        let type_errors = typecheck::check(&mut tree, &self.globals_ty, &mut self.interns);
        assert!(type_errors.is_empty(), "prelude type-checks: {type_errors:?}");
        let code = flatten::flatten(&tree, &mut self.next_inst).expect("prelude flattens");

        let mut print = crate::io::StdPrint;
        let vm = Vm::new(&code, &mut self.heap, &mut self.interns, self.globals, &mut print, NoopTracer);
        let (result, _) = vm.run(Frame::root(0)).expect("prelude runs");

        let Value::Ref(result_id) = result else {
            panic!("prelude evaluates to an object literal");
        };
        let additions: Vec<(StringId, Value)> = match self.heap.get(result_id) {
            HeapData::Struct(s) => s.members.iter().map(|(n, v)| (*n, *v)).collect(),
            other => panic!("prelude evaluates to a struct, found {}", other.type_name()),
        };
        match self.heap.get_mut(self.globals) {
            HeapData::Struct(s) => {
                for (name, value) in additions {
                    s.members.insert(name, value);
                }
                s.frozen = true;
            }
            other => panic!("globals is a struct, found {}", other.type_name()),
        }

        self.globals_ty = prelude::globals_type(self.globals, &self.heap, &mut self.interns);
        self.globals_names = globals_names(self.globals, &self.heap);
    }

    /// The interned names bound in globals (resolution rule 4).
    #[must_use]
    pub fn global_names(&self) -> &AHashSet<StringId> {
        &self.globals_names
    }

    /// Snapshot of the arena's population.
    #[must_use]
    pub fn heap_stats(&self) -> crate::heap::HeapStats {
        self.heap.stats()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

fn globals_names(globals: HeapId, heap: &Heap) -> AHashSet<StringId> {
    match heap.get(globals) {
        HeapData::Struct(s) => s.members.keys().copied().collect(),
        other => panic!("globals is a struct, found {}", other.type_name()),
    }
}

/// One compiled program: reader, resolver, checker, and flattener have
/// all run; `run` steps the instructions.
#[derive(Debug)]
pub struct Runner {
    code: Code,
    source: String,
    script_name: String,
    /// Number of host inputs the program was compiled against.
    input_count: usize,
}

impl Runner {
    /// Compiles a program against the runtime.
    ///
    /// # Errors
    /// Returns `Error::Compile` carrying every diagnostic the reader,
    /// resolver, and checker accumulated.
    pub fn compile(runtime: &mut Runtime, source: &str, script_name: &str) -> Result<Self, Error> {
        Self::compile_with_inputs(runtime, source, script_name, &[])
    }

    /// Compiles a program with named host inputs.
    ///
    /// Each input name becomes a pre-bound top-level binding (typed `Any`,
    /// immutable); `run_with_inputs` supplies the values, in the same
    /// order.
    ///
    /// # Errors
    /// Returns `Error::Compile` carrying every accumulated diagnostic.
    pub fn compile_with_inputs(
        runtime: &mut Runtime,
        source: &str,
        script_name: &str,
        input_names: &[&str],
    ) -> Result<Self, Error> {
        let sexp = parse::parse(source).map_err(|d| Error::compile(vec![d], script_name, source))?;

        let input_locations: Vec<Location> = input_names
            .iter()
            .map(|name| Location {
                name: runtime.interns.intern(name),
                ty: Type::Any,
                is_var: false,
            })
            .collect();
        let compiler = Compiler::with_top_locals(&mut runtime.interns, &runtime.globals_names, input_locations);
        let compiled = compiler
            .compile(&sexp)
            .map_err(|diags| Error::compile(diags, script_name, source))?;
        let mut tree = compiled.tree;

        let type_errors = typecheck::check(&mut tree, &runtime.globals_ty, &mut runtime.interns);
        if !type_errors.is_empty() {
            return Err(Error::compile(type_errors, script_name, source));
        }

        let code = flatten::flatten(&tree, &mut runtime.next_inst)
            .map_err(|diags| Error::compile(diags, script_name, source))?;
        Ok(Self {
            code,
            source: source.to_owned(),
            script_name: script_name.to_owned(),
            input_count: input_names.len(),
        })
    }

    /// The source text this runner was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Runs the program to completion.
    ///
    /// # Errors
    /// Returns `Error::Runtime` with a rendered traceback on failure.
    pub fn run(&self, runtime: &mut Runtime, print: &mut impl PrintWriter) -> Result<Object, Error> {
        self.run_with_inputs(runtime, Vec::new(), print)
    }

    /// Runs the program with host input values filling the pre-bound
    /// input slots, in declaration order.
    ///
    /// # Errors
    /// Returns `Error::Runtime` when the input count does not match the
    /// compiled names, an input cannot enter the runtime, or the program
    /// fails.
    pub fn run_with_inputs(
        &self,
        runtime: &mut Runtime,
        inputs: Vec<Object>,
        print: &mut impl PrintWriter,
    ) -> Result<Object, Error> {
        self.run_traced(runtime, inputs, print, NoopTracer)
    }

    /// Runs the program with an execution tracer attached.
    pub fn run_traced(
        &self,
        runtime: &mut Runtime,
        inputs: Vec<Object>,
        print: &mut impl PrintWriter,
        tracer: impl VmTracer,
    ) -> Result<Object, Error> {
        if inputs.len() != self.input_count {
            let error = RuntimeError::new(
                format!("expected {} input(s), got {}", self.input_count, inputs.len()),
                crate::parse::CodeRange::default(),
            );
            return Err(Error::runtime(error, &self.script_name, &self.source));
        }
        let mut frame = Frame::root(0);
        for input in &inputs {
            let value = input.to_value(&mut runtime.heap, &mut runtime.interns).map_err(|msg| {
                let error = RuntimeError::new(
                    format!("invalid input: {msg}"),
                    crate::parse::CodeRange::default(),
                );
                Error::runtime(error, &self.script_name, &self.source)
            })?;
            let cell = runtime.heap.alloc_cell(value);
            frame.locals.push(cell);
        }

        let vm = Vm::new(
            &self.code,
            &mut runtime.heap,
            &mut runtime.interns,
            runtime.globals,
            print,
            tracer,
        );
        let (value, _) = vm
            .run(frame)
            .map_err(|e| Error::runtime(e, &self.script_name, &self.source))?;
        Ok(Object::new(value, &runtime.heap, &runtime.interns))
    }
}

/// Compiles and runs a program in one step.
///
/// # Errors
/// Returns the first phase's errors: compile diagnostics or the runtime
/// failure.
pub fn eval(runtime: &mut Runtime, source: &str, script_name: &str, print: &mut impl PrintWriter) -> Result<Object, Error> {
    Runner::compile(runtime, source, script_name)?.run(runtime, print)
}
