//! User callables: closures and suspended generator continuations.

use std::rc::Rc;

use crate::{heap::HeapId, inst::InstId, intern::StringId, tasks::Frame, ty::FnType};

/// A user function value: the entry point of its flattened body plus the
/// capture cells collected when the `Callable` block executed.
#[derive(Debug)]
pub struct Closure {
    /// Instruction index of the first body instruction.
    pub entry: usize,
    pub params: Vec<StringId>,
    /// Captured cells, in order of first observation during compilation.
    pub captures: Vec<HeapId>,
    /// Binding name when the closure was created by a `let`, for
    /// tracebacks and repr.
    pub name: Option<StringId>,
    pub is_generator: bool,
    /// The authoritative function type (params and return type).
    pub fn_ty: Rc<FnType>,
}

/// A suspended generator: a parked frame plus the monotonic `done` flag.
///
/// The frame is present exactly while the generator is suspended; resuming
/// takes it out, running it pushes it onto the current task, and yielding
/// parks it back. Once `done` is set, every further call returns `Null`.
#[derive(Debug)]
pub struct Continuation {
    pub frame: Option<Frame>,
    pub done: bool,
    /// The `Yield` instruction waiting for a resume value; `None` before
    /// the first resume (a first call's arguments are discarded).
    pub resume_slot: Option<InstId>,
}

impl Continuation {
    #[must_use]
    pub fn new(frame: Frame) -> Self {
        Self {
            frame: Some(frame),
            done: false,
            resume_slot: None,
        }
    }
}
