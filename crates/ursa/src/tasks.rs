//! Cooperative task state: frames, tasks, and their identifiers.
//!
//! A `Task` is one logical execution cursor; its frame stack is the
//! outer-state chain (call-return). The main task (id 0) carries the
//! program result; launched tasks resolve a promise instead. Tasks
//! interleave only at suspension points, so within one task instructions
//! run strictly in order.

use ahash::AHashMap;

use crate::{heap::HeapId, inst::InstId, intern::StringId, parse::CodeRange, value::Value};

/// Unique identifier for a task. Task 0 is always the main task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct TaskId(u32);

impl TaskId {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is the main task.
    #[inline]
    #[must_use]
    pub fn is_main(self) -> bool {
        self.0 == 0
    }
}

/// The call site that entered a frame, for return-value delivery and
/// tracebacks.
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    /// Index of the `Call` instruction.
    pub idx: usize,
    /// Its result id (where the return value lands).
    pub id: InstId,
    pub span: CodeRange,
}

/// A per-call record: instruction cursor, cell-backed local and capture
/// slots, the instruction-result memory map, and debug info.
#[derive(Debug)]
pub struct Frame {
    /// Index of the next instruction to execute.
    pub cursor: usize,
    /// Local slots; every slot is a heap cell (one-level box).
    pub locals: Vec<HeapId>,
    /// Captured cells from enclosing frames, in capture order.
    pub captures: Vec<HeapId>,
    /// Results of executed instructions, by id.
    pub memory: AHashMap<InstId, Value>,
    /// The call that entered this frame; `None` for a task's root frame.
    pub call: Option<CallSite>,
    /// Function name for tracebacks; `None` at the top level.
    pub fn_name: Option<StringId>,
    /// Backing continuation when this frame belongs to a resumed
    /// generator.
    pub continuation: Option<HeapId>,
}

impl Frame {
    /// A root frame starting at instruction `cursor`.
    #[must_use]
    pub fn root(cursor: usize) -> Self {
        Self {
            cursor,
            locals: Vec::new(),
            captures: Vec::new(),
            memory: AHashMap::new(),
            call: None,
            fn_name: None,
            continuation: None,
        }
    }
}

/// Why a task is not currently runnable.
#[derive(Debug, Clone, Copy)]
pub struct BlockedOn {
    /// The unresolved promise.
    pub promise: HeapId,
    /// The `Await` instruction whose result slot receives the value.
    pub inst: InstId,
    /// The await's source range, for deadlock reporting.
    pub span: CodeRange,
}

/// One cooperative task: a frame stack plus scheduling state.
#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    /// Outer-state chain, innermost (current) frame last.
    pub frames: Vec<Frame>,
    /// The promise this task resolves on completion; `None` for the main
    /// task.
    pub promise: Option<HeapId>,
    /// Set while the task awaits an unresolved promise.
    pub blocked: Option<BlockedOn>,
    pub done: bool,
}

impl Task {
    #[must_use]
    pub fn new(id: TaskId, frame: Frame, promise: Option<HeapId>) -> Self {
        Self {
            id,
            frames: vec![frame],
            promise,
            blocked: None,
            done: false,
        }
    }

    /// Whether the scheduler may step this task.
    #[must_use]
    pub fn runnable(&self) -> bool {
        !self.done && self.blocked.is_none()
    }

    /// The current (innermost) frame.
    ///
    /// # Panics
    /// Panics if the task has no frames (already completed).
    #[must_use]
    pub fn frame(&self) -> &Frame {
        self.frames.last().expect("task has a current frame")
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("task has a current frame")
    }
}
