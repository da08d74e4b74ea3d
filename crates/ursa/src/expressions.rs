//! The typed expression tree produced by the compiler.
//!
//! Every node is an `ExpLoc` carrying its source range and a derived type
//! slot. The compiler fills in what it knows (literals, function types);
//! the checker annotates the rest. `Fn` nodes carry an `FnType` that is
//! authoritative for params and return type.

use std::rc::Rc;

use crate::{
    intern::StringId,
    parse::CodeRange,
    ty::{FnType, Type},
};

/// A compile-time name binding: name, declared type, and mutability.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: StringId,
    pub ty: Type,
    pub is_var: bool,
}

/// Where a closure's capture comes from, relative to the frame the closure
/// is created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Local(usize),
    Capture(usize),
}

/// A capture recorded on a frame: its origin plus the captured location.
#[derive(Debug, Clone)]
pub struct CaptureRef {
    pub source: CaptureSource,
    pub loc: Location,
}

/// A compile-time literal.
///
/// `Globals` is the sentinel for the prelude globals struct; rule 4 of
/// symbol resolution compiles a prelude reference to a property read over
/// this literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Num(f64),
    Str(StringId),
    Globals,
}

/// An expression with its source range and derived type.
#[derive(Debug, Clone)]
pub struct ExpLoc {
    pub span: CodeRange,
    pub ty: Type,
    pub exp: Exp,
}

impl ExpLoc {
    #[must_use]
    pub fn new(span: CodeRange, exp: Exp) -> Self {
        Self {
            span,
            ty: Type::Any,
            exp,
        }
    }
}

/// An assignable place.
#[derive(Debug, Clone)]
pub enum LValue {
    Local { index: usize, loc: Location },
    Capture { index: usize, loc: Location },
    Property { obj: Box<ExpLoc>, name: StringId },
}

/// One binding of a `let`: its frame slot, location, and initialiser.
/// Slots are allocated before initialisers compile, so later bindings and
/// recursive closures can reference earlier (or their own) slots.
#[derive(Debug, Clone)]
pub struct Binding {
    pub index: usize,
    pub loc: Location,
    pub init: ExpLoc,
}

/// A function or generator expression.
#[derive(Debug, Clone)]
pub struct FnExp {
    pub is_generator: bool,
    pub params: Vec<Location>,
    /// Captures discovered while compiling the body, in order of first
    /// observation.
    pub captures: Vec<CaptureRef>,
    pub fn_ty: Rc<FnType>,
    pub body: ExpLoc,
    /// Binding-name hint for tracebacks, when the closure is a `let` init.
    pub name: Option<StringId>,
}

/// An expression node.
#[derive(Debug, Clone)]
pub enum Exp {
    Literal(Literal),
    Local { index: usize, loc: Location },
    Capture { index: usize, loc: Location },
    Property { obj: Box<ExpLoc>, name: StringId },
    Set { target: LValue, exp: Box<ExpLoc> },
    Call { func: Box<ExpLoc>, args: Vec<ExpLoc> },
    Invoke { obj: Box<ExpLoc>, method: StringId, args: Vec<ExpLoc> },
    ObjectLiteral { members: Vec<(StringId, ExpLoc)> },
    ListLiteral(Vec<ExpLoc>),
    MapLiteral(Vec<(ExpLoc, ExpLoc)>),
    Sequence(Vec<ExpLoc>),
    If {
        cond: Box<ExpLoc>,
        then: Box<ExpLoc>,
        else_: Option<Box<ExpLoc>>,
    },
    And { left: Box<ExpLoc>, right: Box<ExpLoc> },
    Or { left: Box<ExpLoc>, right: Box<ExpLoc> },
    Loop {
        body: Box<ExpLoc>,
        /// Frame locals depth at loop entry; break/continue pop back to it.
        locals_depth: usize,
    },
    Break { exp: Box<ExpLoc> },
    Continue,
    Return { exp: Box<ExpLoc> },
    Yield { exp: Box<ExpLoc> },
    Fn(Box<FnExp>),
    Await { exp: Box<ExpLoc> },
    Launch { exp: Box<ExpLoc> },
    Let {
        bindings: Vec<Binding>,
        body: Box<ExpLoc>,
        /// REPL mode: bindings extend the persistent frame and are never
        /// popped (no block is emitted around them).
        persist: bool,
    },
}
