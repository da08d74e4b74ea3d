//! The instruction-stepping interpreter.
//!
//! One `Vm` executes one flattened `Code` over a set of cooperative tasks.
//! The main task (id 0) carries the program result; `launch` forks further
//! tasks whose results are promises. Tasks interleave only at suspension
//! points (await on an unresolved promise), so instructions within a task
//! run strictly in program order.
//!
//! Control flow (break, continue, return, yield) is instruction
//! semantics, never host-level exceptions: each opcode adjusts the frame
//! stack, the locals depth, and the instruction cursor directly. Runtime
//! errors are a separate result channel out of the step loop.

use smallvec::SmallVec;

use crate::{
    error::{RuntimeError, TraceFrame},
    expressions::{CaptureSource, Literal},
    heap::{BoundMethod, Heap, HeapData, HeapId},
    inst::{CallableOpen, Code, InstId, Op},
    intern::{Interns, StringId},
    io::PrintWriter,
    parse::CodeRange,
    tasks::{BlockedOn, CallSite, Frame, Task, TaskId},
    tracer::VmTracer,
    types::{
        self, MethodOutcome, PropRead,
        closure::{Closure, Continuation},
        iter,
        list::List,
        map::Map,
        native::{FsObject, NativeAsyncFn, NativeFn},
        promise::{Promise, PromiseState},
        struct_::Struct,
    },
    value::Value,
};

/// Frames per task before the interpreter refuses to recurse further.
pub const MAX_CALL_DEPTH: usize = 1000;

/// The interpreter. Borrows the runtime's heap, interns, and globals for
/// the duration of one execution.
#[derive(Debug)]
pub struct Vm<'a, P: PrintWriter, T: VmTracer> {
    code: &'a Code,
    heap: &'a mut Heap,
    interns: &'a mut Interns,
    globals: HeapId,
    print: &'a mut P,
    tracer: T,
    tasks: Vec<Task>,
    current: usize,
    next_task: u32,
}

impl<'a, P: PrintWriter, T: VmTracer> Vm<'a, P, T> {
    pub fn new(
        code: &'a Code,
        heap: &'a mut Heap,
        interns: &'a mut Interns,
        globals: HeapId,
        print: &'a mut P,
        tracer: T,
    ) -> Self {
        Self {
            code,
            heap,
            interns,
            globals,
            print,
            tracer,
            tasks: Vec::new(),
            current: 0,
            next_task: 1,
        }
    }

    /// Runs the program to completion on the given root frame, returning
    /// the result value and the root frame (which the REPL keeps).
    ///
    /// Launched tasks still pending when the main task completes are
    /// discarded; their promises are simply dropped with the arena.
    pub fn run(mut self, frame: Frame) -> Result<(Value, Frame), RuntimeError> {
        self.tasks.push(Task::new(TaskId::default(), frame, None));
        self.current = 0;
        loop {
            if !self.tasks[self.current].runnable() {
                self.reschedule()?;
                continue;
            }
            if let Some(result) = self.step()? {
                return Ok(result);
            }
        }
    }

    /// Picks the next runnable task, round-robin from the current one.
    /// With every task blocked the program is deadlocked.
    fn reschedule(&mut self) -> Result<(), RuntimeError> {
        let count = self.tasks.len();
        for offset in 1..=count {
            let candidate = (self.current + offset) % count;
            if self.tasks[candidate].runnable() {
                let from = self.tasks[self.current].id;
                let to = self.tasks[candidate].id;
                if from != to {
                    self.tracer.task_switch(from, to);
                }
                self.current = candidate;
                return Ok(());
            }
        }
        let span = self.tasks[0].blocked.map(|b| b.span).unwrap_or_default();
        Err(self.fail_main("Deadlock: all tasks are blocked", span))
    }

    /// Executes one instruction of the current task. Returns the program
    /// result when the main task completes.
    fn step(&mut self) -> Result<Option<(Value, Frame)>, RuntimeError> {
        let idx = self.frame().cursor;

        if idx >= self.code.insts.len() {
            // only the main task's root frame runs off the end; every
            // other frame exits through a close/return instruction
            let value = self.mem(self.code.result);
            let task = &mut self.tasks[self.current];
            let frame = task.frames.pop().expect("main root frame");
            task.done = true;
            return Ok(Some((value, frame)));
        }

        let inst = self.code.insts[idx].clone();
        let task_id = self.tasks[self.current].id;
        self.tracer.instruction(task_id, idx, (&inst.op).into());
        let id = inst.id;
        let span = inst.span;

        match inst.op {
            Op::Literal(lit) => {
                let value = self.literal(lit);
                self.store(id, value);
                self.advance();
            }
            Op::LetCopy { src } => {
                let value = self.mem(src);
                self.store(id, value);
                self.advance();
            }
            Op::Local { index, .. } => {
                let cell = self.frame().locals[index];
                let value = self.heap.cell_get(cell);
                self.store(id, value);
                self.advance();
            }
            Op::Capture { index, .. } => {
                let cell = self.frame().captures[index];
                let value = self.heap.cell_get(cell);
                self.store(id, value);
                self.advance();
            }
            Op::Property { obj, name } => {
                let receiver = self.mem(obj);
                let value = self.read_property(receiver, name, span)?;
                self.store(id, value);
                self.advance();
            }
            Op::SetLocal { index, val } => {
                let cell = self.frame().locals[index];
                let value = self.mem(val);
                self.guarded_cell_set(cell, value, span)?;
                self.store(id, value);
                self.advance();
            }
            Op::SetCapture { index, val } => {
                let cell = self.frame().captures[index];
                let value = self.mem(val);
                self.guarded_cell_set(cell, value, span)?;
                self.store(id, value);
                self.advance();
            }
            Op::SetProperty { obj, name, val } => {
                let receiver = self.mem(obj);
                let value = self.mem(val);
                types::set_property(receiver, name, value, self.heap, self.interns)
                    .map_err(|msg| self.fail(msg, span))?;
                self.store(id, value);
                self.advance();
            }
            Op::ObjectLiteral { members } => {
                let mut built = indexmap::IndexMap::with_capacity(members.len());
                for (name, member) in members {
                    built.insert(name, self.mem(member));
                }
                let value = Value::Ref(self.heap.alloc(HeapData::Struct(Struct::new(built))));
                self.store(id, value);
                self.advance();
            }
            Op::ListLiteral { items } => {
                let built: Vec<Value> = items.iter().map(|i| self.mem(*i)).collect();
                let value = Value::Ref(self.heap.alloc(HeapData::List(List::new(built))));
                self.store(id, value);
                self.advance();
            }
            Op::MapLiteral { entries } => {
                let mut built = Map::new();
                for (key, val) in entries {
                    built.insert(self.mem(key), self.mem(val));
                }
                let value = Value::Ref(self.heap.alloc(HeapData::Map(built)));
                self.store(id, value);
                self.advance();
            }
            Op::LetOpen { vars } => {
                for _ in 0..vars.len() {
                    let cell = self.heap.alloc_cell(Value::Undefined);
                    self.frame_mut().locals.push(cell);
                }
                self.advance();
            }
            Op::LetClose {
                open_id,
                result,
                count,
            } => {
                let value = self.mem(result);
                let frame = self.frame_mut();
                let keep = frame.locals.len().saturating_sub(count);
                frame.locals.truncate(keep);
                self.store(open_id, value);
                self.advance();
            }
            Op::LoopOpen { .. } => self.advance(),
            Op::LoopClose { open } => self.jump(open + 1),
            Op::BreakLoop {
                arg,
                open_id,
                close,
                locals_depth,
            } => {
                let value = self.mem(arg);
                self.frame_mut().locals.truncate(locals_depth);
                self.store(open_id, value);
                self.jump(close + 1);
            }
            Op::ContinueLoop { open, locals_depth } => {
                self.frame_mut().locals.truncate(locals_depth);
                self.jump(open + 1);
            }
            Op::IfOpen {
                cond,
                matching,
                has_else,
            } => {
                let value = self.mem(cond);
                let Value::Bool(truthy) = value else {
                    return Err(self.fail("Invalid condition", span));
                };
                if truthy {
                    self.advance();
                } else if has_else {
                    self.jump(matching + 1);
                } else {
                    self.store(id, Value::Null);
                    self.jump(matching + 1);
                }
            }
            Op::Else {
                open_id,
                then_result,
                close,
            } => {
                let value = self.mem(then_result);
                self.store(open_id, value);
                self.jump(close + 1);
            }
            Op::IfClose { open_id, result } => {
                let value = self.mem(result);
                self.store(open_id, value);
                self.advance();
            }
            Op::CallableOpen(open) => {
                let value = self.make_closure(idx, &open);
                self.store(id, value);
                self.jump(open.close + 1);
            }
            Op::CallableClose { result, .. } => {
                let value = self.mem(result);
                self.exit_frame(value)?;
            }
            Op::Return { arg } => {
                let value = self.mem(arg);
                if self.frame().call.is_none() && self.frame().continuation.is_none() {
                    return Err(self.fail("Return outside a function", span));
                }
                self.exit_frame(value)?;
            }
            Op::Yield { arg } => {
                let value = self.mem(arg);
                self.yield_value(idx, id, value, span)?;
            }
            Op::Call { func, args, name } => {
                let callee = self.mem(func);
                let arg_values: SmallVec<[Value; 4]> = args.iter().map(|a| self.mem(*a)).collect();
                self.call_value(callee, &arg_values, CallSite { idx, id, span }, name)?;
            }
            Op::Invoke { obj, method, args } => {
                let receiver = self.mem(obj);
                let arg_values: SmallVec<[Value; 4]> = args.iter().map(|a| self.mem(*a)).collect();
                match types::invoke_method(receiver, method, &arg_values, self.heap, self.interns)
                    .map_err(|msg| self.fail(msg, span))?
                {
                    MethodOutcome::Value(value) => {
                        self.store(id, value);
                        self.advance();
                    }
                    MethodOutcome::CallClosure(closure_id) => {
                        self.push_closure_frame(closure_id, &arg_values, CallSite { idx, id, span })?;
                    }
                    MethodOutcome::CallNative(native) => {
                        let value = self.call_native_value(native, &arg_values, span)?;
                        self.store(id, value);
                        self.advance();
                    }
                }
            }
            Op::Await { arg } => {
                let value = self.mem(arg);
                let Value::Ref(promise_id) = value else {
                    return Err(self.fail("Invalid await", span));
                };
                let HeapData::Promise(promise) = self.heap.get(promise_id) else {
                    return Err(self.fail("Invalid await", span));
                };
                match &promise.state {
                    PromiseState::Resolved(resolved) => {
                        let resolved = *resolved;
                        self.store(id, resolved);
                        self.advance();
                    }
                    PromiseState::Pending { .. } => {
                        // park this task; the resolver writes our slot
                        let task_id = self.tasks[self.current].id;
                        if let HeapData::Promise(promise) = self.heap.get_mut(promise_id)
                            && let PromiseState::Pending { waiters } = &mut promise.state
                        {
                            waiters.push(task_id);
                        }
                        self.advance();
                        self.tasks[self.current].blocked = Some(BlockedOn {
                            promise: promise_id,
                            inst: id,
                            span,
                        });
                    }
                }
            }
            Op::LaunchOpen { close } => {
                let child = self.fork_frame(idx + 1);
                let promise_id = self.heap.alloc(HeapData::Promise(Promise::pending()));
                let child_id = TaskId::new(self.next_task);
                self.next_task += 1;
                self.tasks.push(Task::new(child_id, child, Some(promise_id)));
                self.store(id, Value::Ref(promise_id));
                self.jump(close + 1);
            }
            Op::LaunchClose { body } => {
                let value = self.mem(body);
                let task = &mut self.tasks[self.current];
                task.done = true;
                let promise_id = task.promise.expect("launched task has a promise");
                self.resolve_promise(promise_id, value);
            }
        }
        Ok(None)
    }

    // === values and memory ===

    fn frame(&self) -> &Frame {
        self.tasks[self.current].frame()
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.tasks[self.current].frame_mut()
    }

    fn mem(&self, id: InstId) -> Value {
        self.frame().memory.get(&id).copied().unwrap_or(Value::Undefined)
    }

    fn store(&mut self, id: InstId, value: Value) {
        self.frame_mut().memory.insert(id, value);
    }

    fn advance(&mut self) {
        self.frame_mut().cursor += 1;
    }

    fn jump(&mut self, target: usize) {
        self.frame_mut().cursor = target;
    }

    fn literal(&self, lit: Literal) -> Value {
        match lit {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(b),
            Literal::Num(n) => Value::num(n),
            Literal::Str(s) => Value::Str(s),
            Literal::Globals => Value::Ref(self.globals),
        }
    }

    // === errors ===

    /// Builds a runtime error with the current task's traceback.
    fn fail(&self, message: impl Into<String>, span: CodeRange) -> RuntimeError {
        self.fail_on_task(self.current, message, span)
    }

    fn fail_main(&self, message: impl Into<String>, span: CodeRange) -> RuntimeError {
        self.fail_on_task(0, message, span)
    }

    fn fail_on_task(&self, task: usize, message: impl Into<String>, span: CodeRange) -> RuntimeError {
        let mut error = RuntimeError::new(message, span);
        for frame in &self.tasks[task].frames {
            error.traceback.push(TraceFrame {
                name: frame.fn_name.map(|n| self.interns.get(n).to_owned()),
                span: frame.call.map(|site| site.span).unwrap_or_default(),
            });
        }
        error
    }

    // === properties ===

    fn read_property(&mut self, receiver: Value, name: StringId, span: CodeRange) -> Result<Value, RuntimeError> {
        match types::get_property(receiver, name, self.heap, self.interns).map_err(|msg| self.fail(msg, span))? {
            PropRead::Value(value) => Ok(value),
            PropRead::Method => {
                let bound = self.heap.alloc(HeapData::BoundMethod(BoundMethod { receiver, name }));
                Ok(Value::Ref(bound))
            }
            PropRead::InvalidObject => Err(self.fail("Invalid object", span)),
            PropRead::InvalidProperty => {
                let text = self.interns.get(name).to_owned();
                Err(self.fail(format!("Invalid property `{text}'"), span))
            }
        }
    }

    /// The §4.5.3 dynamic guard: a slot that already holds a non-null,
    /// non-undefined value rejects a write that would change its variant.
    fn guarded_cell_set(&mut self, cell: HeapId, value: Value, span: CodeRange) -> Result<(), RuntimeError> {
        let old = self.heap.cell_get(cell);
        if !matches!(old, Value::Null | Value::Undefined) {
            let old_kind = old.kind(self.heap);
            let new_kind = value.kind(self.heap);
            if old_kind != new_kind {
                return Err(self.fail("Assignment to different type", span));
            }
        }
        self.heap.cell_set(cell, value);
        Ok(())
    }

    // === closures, calls, returns ===

    /// Builds a closure value, resolving capture sources against the
    /// current frame's cells.
    fn make_closure(&mut self, open_idx: usize, open: &CallableOpen) -> Value {
        let frame = self.frame();
        let captures: Vec<HeapId> = open
            .captures
            .iter()
            .map(|source| match source {
                CaptureSource::Local(i) => frame.locals[*i],
                CaptureSource::Capture(i) => frame.captures[*i],
            })
            .collect();
        let closure = Closure {
            entry: open_idx + 1,
            params: open.params.clone(),
            captures,
            name: open.name,
            is_generator: open.is_generator,
            fn_ty: std::rc::Rc::clone(&open.fn_ty),
        };
        Value::Ref(self.heap.alloc(HeapData::Closure(closure)))
    }

    /// Builds the locals for a call: one cell per parameter zipped with
    /// the arguments; extra arguments get consecutive slots, missing
    /// parameters become `Undefined`.
    fn bind_locals(&mut self, params: &[StringId], args: &[Value]) -> Vec<HeapId> {
        let count = params.len().max(args.len());
        (0..count)
            .map(|i| self.heap.alloc_cell(args.get(i).copied().unwrap_or(Value::Undefined)))
            .collect()
    }

    fn call_value(
        &mut self,
        callee: Value,
        args: &[Value],
        site: CallSite,
        name: Option<StringId>,
    ) -> Result<(), RuntimeError> {
        match callee {
            Value::Ref(callee_id) => match self.heap.get(callee_id) {
                HeapData::Closure(c) => {
                    if c.is_generator {
                        self.spawn_continuation(callee_id, args, site)
                    } else {
                        self.push_closure_frame(callee_id, args, site)
                    }
                }
                HeapData::Continuation(_) => self.resume_continuation(callee_id, args, site),
                HeapData::BoundMethod(bm) => {
                    let BoundMethod { receiver, name } = *bm;
                    match types::invoke_method(receiver, name, args, self.heap, self.interns)
                        .map_err(|msg| self.fail(msg, site.span))?
                    {
                        MethodOutcome::Value(value) => {
                            self.store(site.id, value);
                            self.advance();
                            Ok(())
                        }
                        MethodOutcome::CallClosure(closure_id) => self.push_closure_frame(closure_id, args, site),
                        MethodOutcome::CallNative(native) => {
                            let value = self.call_native_value(native, args, site.span)?;
                            self.store(site.id, value);
                            self.advance();
                            Ok(())
                        }
                    }
                }
                HeapData::Iter(_) => {
                    let value = iter::advance(callee_id, self.heap, self.interns);
                    self.store(site.id, value);
                    self.advance();
                    Ok(())
                }
                _ => Err(self.invalid_call(name, site.span)),
            },
            Value::NativeFn(f) => {
                let value = self.call_native(f, args, site.span)?;
                self.store(site.id, value);
                self.advance();
                Ok(())
            }
            Value::NativeAsyncFn(f) => {
                // native async calls are awaited inline
                let value = self.call_native_async(f, args, site.span)?;
                self.store(site.id, value);
                self.advance();
                Ok(())
            }
            _ => Err(self.invalid_call(name, site.span)),
        }
    }

    fn invalid_call(&self, name: Option<StringId>, span: CodeRange) -> RuntimeError {
        match name {
            Some(name) => {
                let text = self.interns.get(name).to_owned();
                self.fail(format!("Invalid call to `{text}'"), span)
            }
            None => self.fail("Invalid call", span),
        }
    }

    /// Pushes a frame for a plain closure call.
    fn push_closure_frame(&mut self, closure_id: HeapId, args: &[Value], site: CallSite) -> Result<(), RuntimeError> {
        if self.tasks[self.current].frames.len() >= MAX_CALL_DEPTH {
            return Err(self.fail("Maximum call depth exceeded", site.span));
        }
        let (entry, params, captures, fn_name) = {
            let HeapData::Closure(c) = self.heap.get(closure_id) else {
                unreachable!("caller checked the closure variant");
            };
            (c.entry, c.params.clone(), c.captures.clone(), c.name)
        };
        let locals = self.bind_locals(&params, args);
        let frame = Frame {
            cursor: entry,
            locals,
            captures,
            memory: ahash::AHashMap::new(),
            call: Some(site),
            fn_name,
            continuation: None,
        };
        let task = &mut self.tasks[self.current];
        task.frames.push(frame);
        self.tracer.call(task.id, task.frames.len());
        Ok(())
    }

    /// Calling a generator closure constructs a parked continuation
    /// without running the body.
    fn spawn_continuation(&mut self, closure_id: HeapId, args: &[Value], site: CallSite) -> Result<(), RuntimeError> {
        let (entry, params, captures, fn_name) = {
            let HeapData::Closure(c) = self.heap.get(closure_id) else {
                unreachable!("caller checked the closure variant");
            };
            (c.entry, c.params.clone(), c.captures.clone(), c.name)
        };
        let locals = self.bind_locals(&params, args);
        let frame = Frame {
            cursor: entry,
            locals,
            captures,
            memory: ahash::AHashMap::new(),
            call: None,
            fn_name,
            continuation: None,
        };
        let cont = self.heap.alloc(HeapData::Continuation(Continuation::new(frame)));
        if let HeapData::Continuation(c) = self.heap.get_mut(cont) {
            if let Some(frame) = &mut c.frame {
                frame.continuation = Some(cont);
            }
        }
        self.store(site.id, Value::Ref(cont));
        self.advance();
        Ok(())
    }

    /// Resumes a parked continuation: its frame joins the current task's
    /// chain, and the first argument lands in the yield's result slot.
    fn resume_continuation(&mut self, cont_id: HeapId, args: &[Value], site: CallSite) -> Result<(), RuntimeError> {
        if self.tasks[self.current].frames.len() >= MAX_CALL_DEPTH {
            return Err(self.fail("Maximum call depth exceeded", site.span));
        }
        let (done, resume_slot) = {
            let HeapData::Continuation(c) = self.heap.get(cont_id) else {
                unreachable!("caller checked the continuation variant");
            };
            (c.done, c.resume_slot)
        };
        if done {
            self.store(site.id, Value::Null);
            self.advance();
            return Ok(());
        }
        let Some(mut frame) = self.heap.continuation_take(cont_id) else {
            return Err(self.fail("Continuation is already running", site.span));
        };
        if let Some(slot) = resume_slot {
            frame.memory.insert(slot, args.first().copied().unwrap_or(Value::Null));
        }
        frame.call = Some(site);
        let task = &mut self.tasks[self.current];
        task.frames.push(frame);
        self.tracer.call(task.id, task.frames.len());
        Ok(())
    }

    /// Leaves the current frame with a result: delivers it to the calling
    /// instruction's slot, or finishes the generator backing the frame.
    fn exit_frame(&mut self, value: Value) -> Result<(), RuntimeError> {
        let task = &mut self.tasks[self.current];
        let frame = task.frames.pop().expect("exit_frame inside a call");
        self.tracer.ret(task.id, task.frames.len());

        if let Some(cont_id) = frame.continuation {
            // generator ran to completion: further calls return Null
            if let HeapData::Continuation(c) = self.heap.get_mut(cont_id) {
                c.done = true;
                c.frame = None;
                c.resume_slot = None;
            }
        }

        let site = frame.call.expect("non-root frame has a call site");
        let parent = self.tasks[self.current].frame_mut();
        parent.memory.insert(site.id, value);
        parent.cursor = site.idx + 1;
        Ok(())
    }

    /// Parks the generator frame back into its continuation and delivers
    /// the yielded value to the resuming call.
    fn yield_value(&mut self, idx: usize, yield_id: InstId, value: Value, span: CodeRange) -> Result<(), RuntimeError> {
        if self.frame().continuation.is_none() {
            return Err(self.fail("Yield outside a generator", span));
        }
        let task = &mut self.tasks[self.current];
        let mut frame = task.frames.pop().expect("yield inside a generator frame");
        self.tracer.ret(task.id, task.frames.len());

        let cont_id = frame.continuation.expect("checked above");
        let site = frame.call.take().expect("resumed frame has a call site");
        frame.cursor = idx + 1;
        if let HeapData::Continuation(c) = self.heap.get_mut(cont_id) {
            c.resume_slot = Some(yield_id);
            c.frame = Some(frame);
        }

        let parent = self.tasks[self.current].frame_mut();
        parent.memory.insert(site.id, value);
        parent.cursor = site.idx + 1;
        Ok(())
    }

    // === launch/await ===

    /// Forks the current frame for a launched task: fresh local cells
    /// seeded from the current values (no shared mutable locals), shared
    /// capture cells, copied memory.
    fn fork_frame(&mut self, cursor: usize) -> Frame {
        let locals: Vec<HeapId> = {
            let cells: Vec<HeapId> = self.frame().locals.clone();
            cells
                .into_iter()
                .map(|cell| {
                    let value = self.heap.cell_get(cell);
                    self.heap.alloc_cell(value)
                })
                .collect()
        };
        let frame = self.frame();
        Frame {
            cursor,
            locals,
            captures: frame.captures.clone(),
            memory: frame.memory.clone(),
            call: None,
            fn_name: frame.fn_name,
            continuation: None,
        }
    }

    /// Resolves a promise and wakes its waiters, writing the value into
    /// each waiter's parked await slot.
    fn resolve_promise(&mut self, promise_id: HeapId, value: Value) {
        let waiters = match self.heap.get_mut(promise_id) {
            HeapData::Promise(promise) => promise.resolve(value),
            other => panic!("expected promise, found {}", other.type_name()),
        };
        for waiter in waiters {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == waiter)
                && task.blocked.is_some_and(|b| b.promise == promise_id)
            {
                let blocked = task.blocked.take().expect("checked above");
                task.frame_mut().memory.insert(blocked.inst, value);
            }
        }
    }

    // === natives ===

    /// Calls a native value (from a struct member or bound dispatch).
    fn call_native_value(&mut self, native: Value, args: &[Value], span: CodeRange) -> Result<Value, RuntimeError> {
        match native {
            Value::NativeFn(f) => self.call_native(f, args, span),
            Value::NativeAsyncFn(f) => self.call_native_async(f, args, span),
            _ => Err(self.fail("Invalid call", span)),
        }
    }

    fn call_native(&mut self, f: NativeFn, args: &[Value], span: CodeRange) -> Result<Value, RuntimeError> {
        match f {
            NativeFn::Debug => {
                let line = args
                    .iter()
                    .map(|arg| arg.repr(self.heap, self.interns))
                    .collect::<Vec<_>>()
                    .join(" ");
                self.print.write_line(&line);
                Ok(Value::Null)
            }
            NativeFn::Fs => {
                let Some(Value::Str(path)) = args.first() else {
                    return Err(self.fail("fs: expects a Str path", span));
                };
                let root = std::path::PathBuf::from(self.interns.get(*path));
                let object = self.heap.alloc(HeapData::Native(Box::new(FsObject::new(root))));
                Ok(Value::Ref(object))
            }
            NativeFn::JsUse | NativeFn::JslibUse => {
                Err(self.fail("JavaScript interop is not available in this runtime", span))
            }
        }
    }

    fn call_native_async(&mut self, f: NativeAsyncFn, args: &[Value], span: CodeRange) -> Result<Value, RuntimeError> {
        match f {
            NativeAsyncFn::Promise => {
                let value = args.first().copied().unwrap_or(Value::Null);
                let promise = self.heap.alloc(HeapData::Promise(Promise::resolved(value)));
                Ok(Value::Ref(promise))
            }
            NativeAsyncFn::Fetch => Err(self.fail("fetch: network access is not available", span)),
        }
    }
}
