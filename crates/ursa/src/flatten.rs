//! The flattener: expression tree to linear instructions.
//!
//! Every expression produces exactly one instruction whose id is the
//! expression's observable result. Blocks (loop, launch, if/else, fn/gen,
//! let) are emitted as matched OPEN/CLOSE pairs with jump indices
//! backpatched once the close position is known. `and`/`or` desugar here
//! into if-shapes, and let bodies end in a `LetCopy` so their value
//! survives the local pop.
//!
//! Break/continue outside a loop and return/yield outside a callable are
//! reported here as a safety net; the compiler already rejects them.

use smallvec::SmallVec;

use crate::{
    error::{Diagnostic, DiagnosticKind},
    expressions::{Exp, ExpLoc, LValue, Literal},
    inst::{CallableOpen, Code, Inst, InstId, Op},
    parse::CodeRange,
};

/// Flattens a compiled tree, drawing instruction ids from `next_id` (the
/// `Runtime`'s monotonic counter).
pub fn flatten(tree: &ExpLoc, next_id: &mut u32) -> Result<Code, Vec<Diagnostic>> {
    let mut flattener = Flattener {
        next_id,
        insts: Vec::new(),
        errors: Vec::new(),
        loops: Vec::new(),
        callables: Vec::new(),
    };
    let result = flattener.exp(tree);
    if flattener.errors.is_empty() {
        Ok(Code {
            insts: flattener.insts,
            result,
        })
    } else {
        Err(flattener.errors)
    }
}

/// Backpatch state for one enclosing loop.
#[derive(Debug)]
struct LoopCtx {
    open_idx: usize,
    open_id: InstId,
    locals_depth: usize,
    /// Indices of `BreakLoop` instructions waiting for the close index.
    break_idxs: Vec<usize>,
}

#[derive(Debug)]
struct Flattener<'a> {
    next_id: &'a mut u32,
    insts: Vec<Inst>,
    errors: Vec<Diagnostic>,
    loops: Vec<LoopCtx>,
    /// Enclosing callables (`true` = generator); safety net for I3.
    callables: Vec<bool>,
}

impl Flattener<'_> {
    fn emit(&mut self, span: CodeRange, op: Op) -> (usize, InstId) {
        let id = InstId(*self.next_id);
        *self.next_id += 1;
        let idx = self.insts.len();
        self.insts.push(Inst { id, span, op });
        (idx, id)
    }

    fn error(&mut self, span: CodeRange, message: impl Into<String>) -> InstId {
        self.errors.push(Diagnostic::new(DiagnosticKind::Compile, message, span));
        self.emit(span, Op::Literal(Literal::Null)).1
    }

    fn exp(&mut self, node: &ExpLoc) -> InstId {
        let span = node.span;
        match &node.exp {
            Exp::Literal(lit) => self.emit(span, Op::Literal(*lit)).1,
            Exp::Local { index, loc } => {
                self.emit(
                    span,
                    Op::Local {
                        index: *index,
                        name: loc.name,
                    },
                )
                .1
            }
            Exp::Capture { index, loc } => {
                self.emit(
                    span,
                    Op::Capture {
                        index: *index,
                        name: loc.name,
                    },
                )
                .1
            }
            Exp::Property { obj, name } => {
                let obj_id = self.exp(obj);
                self.emit(
                    span,
                    Op::Property {
                        obj: obj_id,
                        name: *name,
                    },
                )
                .1
            }
            Exp::Set { target, exp } => match target {
                LValue::Local { index, .. } => {
                    let val = self.exp(exp);
                    self.emit(span, Op::SetLocal { index: *index, val }).1
                }
                LValue::Capture { index, .. } => {
                    let val = self.exp(exp);
                    self.emit(span, Op::SetCapture { index: *index, val }).1
                }
                LValue::Property { obj, name } => {
                    let obj_id = self.exp(obj);
                    let val = self.exp(exp);
                    self.emit(
                        span,
                        Op::SetProperty {
                            obj: obj_id,
                            name: *name,
                            val,
                        },
                    )
                    .1
                }
            },
            Exp::Call { func, args } => {
                let name = callee_name(func);
                let func_id = self.exp(func);
                let arg_ids: SmallVec<[InstId; 4]> = args.iter().map(|a| self.exp(a)).collect();
                self.emit(
                    span,
                    Op::Call {
                        func: func_id,
                        args: arg_ids,
                        name,
                    },
                )
                .1
            }
            Exp::Invoke { obj, method, args } => {
                let obj_id = self.exp(obj);
                let arg_ids: SmallVec<[InstId; 4]> = args.iter().map(|a| self.exp(a)).collect();
                self.emit(
                    span,
                    Op::Invoke {
                        obj: obj_id,
                        method: *method,
                        args: arg_ids,
                    },
                )
                .1
            }
            Exp::ObjectLiteral { members } => {
                let compiled: Vec<(crate::intern::StringId, InstId)> =
                    members.iter().map(|(name, m)| (*name, self.exp(m))).collect();
                self.emit(span, Op::ObjectLiteral { members: compiled }).1
            }
            Exp::ListLiteral(items) => {
                let compiled: Vec<InstId> = items.iter().map(|i| self.exp(i)).collect();
                self.emit(span, Op::ListLiteral { items: compiled }).1
            }
            Exp::MapLiteral(entries) => {
                let compiled: Vec<(InstId, InstId)> =
                    entries.iter().map(|(k, v)| (self.exp(k), self.exp(v))).collect();
                self.emit(span, Op::MapLiteral { entries: compiled }).1
            }
            Exp::Sequence(items) => {
                let mut last = None;
                for item in items {
                    last = Some(self.exp(item));
                }
                last.unwrap_or_else(|| self.emit(span, Op::Literal(Literal::Null)).1)
            }
            Exp::If { cond, then, else_ } => self.if_shape(span, cond, then, else_.as_deref()),
            Exp::And { left, right } => {
                // and(l, r) desugars to if(l, r, false)
                let false_node = ExpLoc::new(span, Exp::Literal(Literal::Bool(false)));
                self.if_shape(span, left, right, Some(&false_node))
            }
            Exp::Or { left, right } => {
                // or(l, r) desugars to if(l, true, r)
                let true_node = ExpLoc::new(span, Exp::Literal(Literal::Bool(true)));
                self.if_shape(span, left, &true_node, Some(right))
            }
            Exp::Loop { body, locals_depth } => {
                let (open_idx, open_id) = self.emit(
                    span,
                    Op::LoopOpen {
                        locals_depth: *locals_depth,
                        close: 0,
                    },
                );
                self.loops.push(LoopCtx {
                    open_idx,
                    open_id,
                    locals_depth: *locals_depth,
                    break_idxs: Vec::new(),
                });
                self.exp(body);
                let (close_idx, _) = self.emit(span, Op::LoopClose { open: open_idx });
                let ctx = self.loops.pop().expect("pushed above");
                self.patch_close(open_idx, close_idx);
                for break_idx in ctx.break_idxs {
                    self.patch_close(break_idx, close_idx);
                }
                open_id
            }
            Exp::Break { exp } => {
                let Some(ctx) = self.loops.last() else {
                    return self.error(span, "Break outside a loop");
                };
                let (open_id, locals_depth) = (ctx.open_id, ctx.locals_depth);
                let arg = self.exp(exp);
                let (idx, id) = self.emit(
                    span,
                    Op::BreakLoop {
                        arg,
                        open_id,
                        close: 0,
                        locals_depth,
                    },
                );
                self.loops.last_mut().expect("checked above").break_idxs.push(idx);
                id
            }
            Exp::Continue => {
                let Some(ctx) = self.loops.last() else {
                    return self.error(span, "Continue outside a loop");
                };
                let (open, locals_depth) = (ctx.open_idx, ctx.locals_depth);
                self.emit(span, Op::ContinueLoop { open, locals_depth }).1
            }
            Exp::Return { exp } => {
                if self.callables.is_empty() {
                    return self.error(span, "Return outside a function");
                }
                let arg = self.exp(exp);
                self.emit(span, Op::Return { arg }).1
            }
            Exp::Yield { exp } => {
                if self.callables.last() != Some(&true) {
                    return self.error(span, "Yield outside a generator");
                }
                let arg = self.exp(exp);
                self.emit(span, Op::Yield { arg }).1
            }
            Exp::Fn(fn_exp) => {
                let (open_idx, open_id) = self.emit(
                    span,
                    Op::CallableOpen(Box::new(CallableOpen {
                        params: fn_exp.params.iter().map(|p| p.name).collect(),
                        captures: fn_exp.captures.iter().map(|c| c.source).collect(),
                        name: fn_exp.name,
                        is_generator: fn_exp.is_generator,
                        fn_ty: std::rc::Rc::clone(&fn_exp.fn_ty),
                        close: 0,
                    })),
                );
                // loops never continue across a callable boundary
                let saved = std::mem::take(&mut self.loops);
                self.callables.push(fn_exp.is_generator);
                let body_id = self.exp(&fn_exp.body);
                self.callables.pop();
                self.loops = saved;
                let (close_idx, _) = self.emit(
                    span,
                    Op::CallableClose {
                        open: open_idx,
                        result: body_id,
                    },
                );
                self.patch_close(open_idx, close_idx);
                open_id
            }
            Exp::Await { exp } => {
                let arg = self.exp(exp);
                self.emit(span, Op::Await { arg }).1
            }
            Exp::Launch { exp } => {
                let (open_idx, open_id) = self.emit(span, Op::LaunchOpen { close: 0 });
                let saved = std::mem::take(&mut self.loops);
                let body_id = self.exp(exp);
                self.loops = saved;
                let (close_idx, _) = self.emit(span, Op::LaunchClose { body: body_id });
                self.patch_close(open_idx, close_idx);
                open_id
            }
            Exp::Let {
                bindings,
                body,
                persist,
            } => {
                let vars: Vec<crate::intern::StringId> = bindings.iter().map(|b| b.loc.name).collect();
                let count = vars.len();
                let (_, open_id) = self.emit(span, Op::LetOpen { vars });
                for binding in bindings {
                    let val = self.exp(&binding.init);
                    self.emit(
                        binding.init.span,
                        Op::SetLocal {
                            index: binding.index,
                            val,
                        },
                    );
                }
                let body_id = self.exp(body);
                if *persist {
                    // REPL: bindings stay in the persistent frame; no block.
                    return body_id;
                }
                let (_, copy_id) = self.emit(span, Op::LetCopy { src: body_id });
                self.emit(
                    span,
                    Op::LetClose {
                        open_id,
                        result: copy_id,
                        count,
                    },
                );
                open_id
            }
        }
    }

    /// Emits an if-shape: OPEN_IF → then → CLOSE, or with an alternate
    /// OPEN_IF → then → ELSE → else → CLOSE, where the OPEN's matching
    /// instruction is the ELSE and the ELSE's is the terminal CLOSE.
    fn if_shape(&mut self, span: CodeRange, cond: &ExpLoc, then: &ExpLoc, else_: Option<&ExpLoc>) -> InstId {
        let cond_id = self.exp(cond);
        let (open_idx, open_id) = self.emit(
            span,
            Op::IfOpen {
                cond: cond_id,
                matching: 0,
                has_else: else_.is_some(),
            },
        );
        let then_id = self.exp(then);
        match else_ {
            Some(alternate) => {
                let (else_idx, _) = self.emit(
                    span,
                    Op::Else {
                        open_id,
                        then_result: then_id,
                        close: 0,
                    },
                );
                let else_id = self.exp(alternate);
                let (close_idx, _) = self.emit(
                    span,
                    Op::IfClose {
                        open_id,
                        result: else_id,
                    },
                );
                self.patch_matching(open_idx, else_idx);
                self.patch_close(else_idx, close_idx);
            }
            None => {
                let (close_idx, _) = self.emit(
                    span,
                    Op::IfClose {
                        open_id,
                        result: then_id,
                    },
                );
                self.patch_matching(open_idx, close_idx);
            }
        }
        open_id
    }

    /// Backpatches the `close` field of an OPEN/ELSE/BREAK instruction.
    fn patch_close(&mut self, idx: usize, close_idx: usize) {
        match &mut self.insts[idx].op {
            Op::LoopOpen { close, .. }
            | Op::LaunchOpen { close }
            | Op::Else { close, .. }
            | Op::BreakLoop { close, .. } => *close = close_idx,
            Op::CallableOpen(open) => open.close = close_idx,
            other => {
                let name: &'static str = (&*other).into();
                panic!("cannot backpatch close of {name}");
            }
        }
    }

    fn patch_matching(&mut self, idx: usize, matching_idx: usize) {
        match &mut self.insts[idx].op {
            Op::IfOpen { matching, .. } => *matching = matching_idx,
            other => {
                let name: &'static str = (&*other).into();
                panic!("cannot backpatch matching of {name}");
            }
        }
    }
}

/// Extracts a statically known callee name for tracebacks.
fn callee_name(func: &ExpLoc) -> Option<crate::intern::StringId> {
    match &func.exp {
        Exp::Local { loc, .. } | Exp::Capture { loc, .. } => Some(loc.name),
        Exp::Property { name, .. } => Some(*name),
        _ => None,
    }
}
