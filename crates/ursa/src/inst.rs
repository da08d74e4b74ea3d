//! The linear instruction stream produced by the flattener.
//!
//! Every instruction carries a unique id naming its result; later
//! instructions consume earlier results by id through the frame's memory
//! map. Blocks are matched OPEN/CLOSE pairs whose observable result id is
//! the OPEN's id (the CLOSE aliases its result to it). Jump targets are
//! indices into the instruction vector, backpatched during flattening.

use smallvec::SmallVec;
use strum::IntoStaticStr;

use crate::{
    expressions::{CaptureSource, Literal},
    intern::StringId,
    parse::CodeRange,
};

/// Symbolic name of an instruction's result. Drawn from the `Runtime`'s
/// monotonic counter, so ids are unique across a whole session (and a
/// fortiori within one flatten pass).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct InstId(pub(crate) u32);

impl InstId {
    /// Returns the raw counter value.
    #[inline]
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// One instruction: result id, source range, operation.
#[derive(Debug, Clone)]
pub struct Inst {
    pub id: InstId,
    pub span: CodeRange,
    pub op: Op,
}

/// Payload of a `Callable` block open: everything needed to build the
/// closure when the instruction executes.
#[derive(Debug, Clone)]
pub struct CallableOpen {
    pub params: Vec<StringId>,
    /// Where each captured cell comes from in the defining frame, in order
    /// of first observation.
    pub captures: Vec<CaptureSource>,
    pub name: Option<StringId>,
    pub is_generator: bool,
    pub fn_ty: std::rc::Rc<crate::ty::FnType>,
    /// Index of the matching `CallableClose`.
    pub close: usize,
}

/// An operation. Arguments named `*_id`/`arg`/`src` are instruction result
/// ids; `open`/`close`/`matching` are instruction indices.
#[derive(Debug, Clone, IntoStaticStr)]
pub enum Op {
    Literal(Literal),
    /// Copies a result under a fresh id; emitted as the last instruction of
    /// every let-block body so the block value survives the local pop.
    LetCopy { src: InstId },

    LoopOpen {
        /// Frame locals depth at loop entry; break/continue pop back to it.
        locals_depth: usize,
        close: usize,
    },
    LoopClose { open: usize },

    LaunchOpen { close: usize },
    /// Runs in the launched task: resolves the task's promise with the
    /// body result.
    LaunchClose { body: InstId },

    IfOpen {
        cond: InstId,
        /// The `Else` instruction when `has_else`, the `IfClose` otherwise.
        matching: usize,
        has_else: bool,
    },
    /// Reached by falling out of the then-branch: aliases the then result
    /// to the block and jumps past the close.
    Else {
        open_id: InstId,
        then_result: InstId,
        close: usize,
    },
    IfClose { open_id: InstId, result: InstId },

    CallableOpen(Box<CallableOpen>),
    /// Reached by falling out of a function body: returns the body result.
    CallableClose { open: usize, result: InstId },

    LetOpen { vars: Vec<StringId> },
    LetClose {
        open_id: InstId,
        result: InstId,
        count: usize,
    },

    Await { arg: InstId },
    BreakLoop {
        arg: InstId,
        open_id: InstId,
        close: usize,
        locals_depth: usize,
    },
    ContinueLoop { open: usize, locals_depth: usize },
    Return { arg: InstId },
    Yield { arg: InstId },

    Call {
        func: InstId,
        args: SmallVec<[InstId; 4]>,
        /// Callee name when statically known, for tracebacks.
        name: Option<StringId>,
    },
    Invoke {
        obj: InstId,
        method: StringId,
        args: SmallVec<[InstId; 4]>,
    },

    SetLocal { index: usize, val: InstId },
    SetCapture { index: usize, val: InstId },
    SetProperty {
        obj: InstId,
        name: StringId,
        val: InstId,
    },

    ObjectLiteral { members: Vec<(StringId, InstId)> },
    ListLiteral { items: Vec<InstId> },
    MapLiteral { entries: Vec<(InstId, InstId)> },

    Local { index: usize, name: StringId },
    Capture { index: usize, name: StringId },
    Property { obj: InstId, name: StringId },
}

/// A flattened program: the instruction vector plus the id of the final
/// result.
#[derive(Debug, Clone)]
pub struct Code {
    pub insts: Vec<Inst>,
    pub result: InstId,
}
