//! Interpreter execution tracing.
//!
//! A trait-based tracing system with zero-cost abstraction: with
//! [`NoopTracer`] every hook monomorphises away. Concrete tracers cover
//! the usual needs: a human-readable stderr log and an opcode frequency
//! counter. The interpreter calls the hooks at instruction dispatch,
//! frame pushes/pops, and task switches.

use std::collections::HashMap;

use crate::tasks::TaskId;

/// Trait for interpreter tracing. All hooks default to no-ops, so an
/// implementation only overrides what it cares about.
pub trait VmTracer {
    /// An instruction is about to execute.
    fn instruction(&mut self, task: TaskId, idx: usize, op_name: &'static str) {
        let _ = (task, idx, op_name);
    }

    /// A call pushed a new frame; `depth` is the frame count after.
    fn call(&mut self, task: TaskId, depth: usize) {
        let _ = (task, depth);
    }

    /// A return popped a frame; `depth` is the frame count after.
    fn ret(&mut self, task: TaskId, depth: usize) {
        let _ = (task, depth);
    }

    /// The scheduler switched to another task.
    fn task_switch(&mut self, from: TaskId, to: TaskId) {
        let _ = (from, to);
    }
}

/// Forwarding impl so callers can pass `&mut tracer` and inspect it
/// after the run.
impl<T: VmTracer + ?Sized> VmTracer for &mut T {
    fn instruction(&mut self, task: TaskId, idx: usize, op_name: &'static str) {
        (**self).instruction(task, idx, op_name);
    }

    fn call(&mut self, task: TaskId, depth: usize) {
        (**self).call(task, depth);
    }

    fn ret(&mut self, task: TaskId, depth: usize) {
        (**self).ret(task, depth);
    }

    fn task_switch(&mut self, from: TaskId, to: TaskId) {
        (**self).task_switch(from, to);
    }
}

/// Zero-cost no-op tracer, the production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl VmTracer for NoopTracer {}

/// Human-readable execution log to stderr.
#[derive(Debug, Default)]
pub struct StderrTracer;

impl VmTracer for StderrTracer {
    fn instruction(&mut self, task: TaskId, idx: usize, op_name: &'static str) {
        eprintln!("[task {}] {idx:>5} {op_name}", task.raw());
    }

    fn call(&mut self, task: TaskId, depth: usize) {
        eprintln!("[task {}] call  -> depth {depth}", task.raw());
    }

    fn ret(&mut self, task: TaskId, depth: usize) {
        eprintln!("[task {}] ret   -> depth {depth}", task.raw());
    }

    fn task_switch(&mut self, from: TaskId, to: TaskId) {
        eprintln!("[task {}] switch -> task {}", from.raw(), to.raw());
    }
}

/// Counts executed instructions by opcode name.
#[derive(Debug, Default)]
pub struct CountingTracer {
    counts: HashMap<&'static str, u64>,
    switches: u64,
}

impl CountingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opcode execution counts.
    #[must_use]
    pub fn counts(&self) -> &HashMap<&'static str, u64> {
        &self.counts
    }

    /// Number of task switches observed.
    #[must_use]
    pub fn switches(&self) -> u64 {
        self.switches
    }

    /// Total instructions executed.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

impl VmTracer for CountingTracer {
    fn instruction(&mut self, _task: TaskId, _idx: usize, op_name: &'static str) {
        *self.counts.entry(op_name).or_insert(0) += 1;
    }

    fn task_switch(&mut self, _from: TaskId, _to: TaskId) {
        self.switches += 1;
    }
}
