//! The compiler/resolver: s-expressions to the typed expression tree.
//!
//! Resolution works over a stack of frames, each carrying its locals and
//! the captures discovered while compiling nested callables. A symbol
//! resolves, in order: against the current frame's locals (scanned from the
//! end, so shadowing works), its already-recorded captures, the enclosing
//! frames (appending a new capture, transitively, preserving the order of
//! first observation), and finally the prelude globals. Anything else is an
//! undefined symbol.
//!
//! Errors accumulate; a failed form compiles to a `Null` literal so one
//! mistake does not hide the rest.

use std::rc::Rc;

use ahash::AHashSet;

use crate::{
    error::{Diagnostic, DiagnosticKind},
    expressions::{Binding, CaptureRef, CaptureSource, Exp, ExpLoc, FnExp, LValue, Literal, Location},
    intern::{Interns, StringId},
    parse::{CodeRange, SExp, SExpLoc},
    ty::{self, FnType, Type},
};

/// Control context markers for validating break/continue/return/yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctl {
    Loop,
    Launch,
}

/// A compile-time frame: one per function (plus the top level).
#[derive(Debug, Default)]
struct CFrame {
    locals: Vec<Location>,
    captures: Vec<CaptureRef>,
    is_fn: bool,
    is_generator: bool,
    ctl: Vec<Ctl>,
}

/// Result of symbol resolution within one frame.
#[derive(Debug, Clone)]
enum Resolved {
    Local(usize, Location),
    Capture(usize, Location),
}

/// The compiler. One instance compiles one program (or one REPL input
/// against a persistent top frame).
#[derive(Debug)]
pub struct Compiler<'a> {
    interns: &'a mut Interns,
    /// Names bound in the prelude globals (resolution rule 4).
    globals: &'a AHashSet<StringId>,
    frames: Vec<CFrame>,
    errors: Vec<Diagnostic>,
}

/// Output of a successful compilation: the tree plus the top frame's
/// locals (which the REPL keeps for the next input).
#[derive(Debug)]
pub struct Compiled {
    pub tree: ExpLoc,
    pub top_locals: Vec<Location>,
}

impl<'a> Compiler<'a> {
    pub fn new(interns: &'a mut Interns, globals: &'a AHashSet<StringId>) -> Self {
        Self::with_top_locals(interns, globals, Vec::new())
    }

    /// A compiler whose top frame starts with existing locals; used by the
    /// REPL so earlier inputs' bindings stay visible.
    pub fn with_top_locals(interns: &'a mut Interns, globals: &'a AHashSet<StringId>, locals: Vec<Location>) -> Self {
        Self {
            interns,
            globals,
            frames: vec![CFrame {
                locals,
                ..CFrame::default()
            }],
            errors: Vec::new(),
        }
    }

    /// Compiles a whole program.
    pub fn compile(mut self, sexp: &SExpLoc) -> Result<Compiled, Vec<Diagnostic>> {
        let tree = self.exp(sexp);
        self.finish(tree)
    }

    /// Compiles one REPL input: a top-level `let` extends the persistent
    /// frame instead of opening a block.
    pub fn compile_repl(mut self, sexp: &SExpLoc) -> Result<Compiled, Vec<Diagnostic>> {
        let tree = if let SExp::List(items) = &sexp.exp
            && items.first().and_then(|h| h.exp.as_str()) == Some("let")
        {
            self.let_form(sexp.span, items, true)
        } else {
            self.exp(sexp)
        };
        self.finish(tree)
    }

    fn finish(mut self, tree: ExpLoc) -> Result<Compiled, Vec<Diagnostic>> {
        if self.errors.is_empty() {
            let top = self.frames.pop().expect("top frame always present");
            Ok(Compiled {
                tree,
                top_locals: top.locals,
            })
        } else {
            Err(self.errors)
        }
    }

    fn error(&mut self, span: CodeRange, message: impl Into<String>) -> ExpLoc {
        self.errors.push(Diagnostic::new(DiagnosticKind::Compile, message, span));
        ExpLoc::new(span, Exp::Literal(Literal::Null))
    }

    fn frame(&mut self) -> &mut CFrame {
        self.frames.last_mut().expect("at least the top frame")
    }

    /// Resolves a symbol in the frame at `index`, recursing outward and
    /// appending transitive captures as needed.
    fn resolve_in(&mut self, index: usize, name: StringId) -> Option<Resolved> {
        let frame = &self.frames[index];
        if let Some(pos) = frame.locals.iter().rposition(|loc| loc.name == name) {
            return Some(Resolved::Local(pos, frame.locals[pos].clone()));
        }
        if let Some(pos) = frame.captures.iter().position(|c| c.loc.name == name) {
            return Some(Resolved::Capture(pos, frame.captures[pos].loc.clone()));
        }
        if index == 0 {
            return None;
        }
        let outer = self.resolve_in(index - 1, name)?;
        let (source, loc) = match outer {
            Resolved::Local(i, loc) => (CaptureSource::Local(i), loc),
            Resolved::Capture(i, loc) => (CaptureSource::Capture(i), loc),
        };
        let captures = &mut self.frames[index].captures;
        captures.push(CaptureRef {
            source,
            loc: loc.clone(),
        });
        Some(Resolved::Capture(captures.len() - 1, loc))
    }

    /// Compiles a symbol reference.
    fn symbol(&mut self, span: CodeRange, name: &str) -> ExpLoc {
        let name_id = self.interns.intern(name);
        let top = self.frames.len() - 1;
        match self.resolve_in(top, name_id) {
            Some(Resolved::Local(index, loc)) => ExpLoc::new(span, Exp::Local { index, loc }),
            Some(Resolved::Capture(index, loc)) => ExpLoc::new(span, Exp::Capture { index, loc }),
            None if self.globals.contains(&name_id) => ExpLoc::new(
                span,
                Exp::Property {
                    obj: Box::new(ExpLoc::new(span, Exp::Literal(Literal::Globals))),
                    name: name_id,
                },
            ),
            None => self.error(span, format!("Undefined symbol `{name}'")),
        }
    }

    /// Compiles any expression.
    fn exp(&mut self, sexp: &SExpLoc) -> ExpLoc {
        let span = sexp.span;
        match &sexp.exp {
            SExp::Null => ExpLoc::new(span, Exp::Literal(Literal::Null)),
            SExp::Bool(b) => ExpLoc::new(span, Exp::Literal(Literal::Bool(*b))),
            SExp::Num(n) => ExpLoc::new(span, Exp::Literal(Literal::Num(*n))),
            SExp::Str(s) => self.symbol(span, s),
            SExp::Object(members) => {
                let compiled = members
                    .iter()
                    .map(|(name, value)| (self.interns.intern(name), self.exp(value)))
                    .collect();
                ExpLoc::new(span, Exp::ObjectLiteral { members: compiled })
            }
            SExp::List(items) => self.form(span, items),
        }
    }

    /// Compiles a list form: a special form when the head names one, a
    /// call otherwise.
    fn form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        let Some(head) = items.first() else {
            return self.error(span, "Invalid form: empty list");
        };
        let Some(head_name) = head.exp.as_str() else {
            // General call with a computed callee.
            let func = self.exp(head);
            let args = items[1..].iter().map(|a| self.exp(a)).collect();
            return ExpLoc::new(
                span,
                Exp::Call {
                    func: Box::new(func),
                    args,
                },
            );
        };
        match head_name {
            "str" => self.str_form(span, items),
            "let" => self.let_form(span, items, false),
            "fn" => self.fn_form(span, items, false),
            "gen" => self.fn_form(span, items, true),
            "prop" => self.prop_form(span, items),
            "set" => self.set_form(span, items),
            "list" => {
                let compiled = items[1..].iter().map(|a| self.exp(a)).collect();
                ExpLoc::new(span, Exp::ListLiteral(compiled))
            }
            "map" => self.map_form(span, items),
            "seq" => {
                let compiled = items[1..].iter().map(|a| self.exp(a)).collect();
                ExpLoc::new(span, Exp::Sequence(compiled))
            }
            "if" => self.if_form(span, items),
            "and" | "or" => self.logic_form(span, items, head_name),
            "loop" => self.loop_form(span, items),
            "break" => self.break_form(span, items),
            "continue" => self.continue_form(span, items),
            "return" => self.return_form(span, items),
            "yield" => self.yield_form(span, items),
            "await" => self.unary_form(span, items, "await"),
            "launch" => self.launch_form(span, items),
            "invoke" => self.invoke_form(span, items),
            _ => {
                // A call with a symbol callee.
                let func = self.symbol(head.span, head_name);
                let args = items[1..].iter().map(|a| self.exp(a)).collect();
                ExpLoc::new(
                    span,
                    Exp::Call {
                        func: Box::new(func),
                        args,
                    },
                )
            }
        }
    }

    fn str_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() != 2 {
            return self.error(span, "Invalid form: `str' expects one string");
        }
        match items[1].exp.as_str() {
            Some(s) => {
                let id = self.interns.intern(s);
                ExpLoc::new(span, Exp::Literal(Literal::Str(id)))
            }
            None => self.error(span, "Invalid form: `str' expects one string"),
        }
    }

    fn let_form(&mut self, span: CodeRange, items: &[SExpLoc], persist: bool) -> ExpLoc {
        if items.len() != 3 {
            return self.error(span, "Invalid form: `let' expects bindings and a body");
        }
        let SExp::List(binding_list) = &items[1].exp else {
            return self.error(items[1].span, "Invalid let binding");
        };

        // Parse the binding entries and allocate every binding's slot
        // before any initialiser compiles, so later bindings can reference
        // earlier ones and recursive lets can refer to themselves.
        let depth = self.frame().locals.len();
        let mut parsed: Vec<(CodeRange, Location, &SExpLoc)> = Vec::with_capacity(binding_list.len());
        for entry in binding_list {
            let SExp::List(parts) = &entry.exp else {
                self.error(entry.span, "Invalid let binding");
                continue;
            };
            let (Some(kind), Some(name), Some(ty_text), Some(init)) = (
                parts.first().and_then(|p| p.exp.as_str()),
                parts.get(1).and_then(|p| p.exp.as_str()),
                parts.get(2).and_then(|p| p.exp.as_str()),
                parts.get(3),
            ) else {
                self.error(entry.span, "Invalid let binding");
                continue;
            };
            if parts.len() != 4 {
                self.error(entry.span, "Invalid let binding");
                continue;
            }
            let is_var = match kind {
                "const" => false,
                "var" => true,
                _ => {
                    self.error(parts[0].span, format!("Invalid let binding kind `{kind}'"));
                    continue;
                }
            };
            let loc = Location {
                name: self.interns.intern(name),
                ty: ty::parse_annotation(ty_text, self.interns),
                is_var,
            };
            self.frame().locals.push(loc.clone());
            parsed.push((entry.span, loc, init));
        }

        let mut bindings = Vec::with_capacity(parsed.len());
        for (i, (_, loc, init)) in parsed.into_iter().enumerate() {
            let mut init = self.exp(init);
            // Name the closure after its binding for tracebacks.
            if let Exp::Fn(fn_exp) = &mut init.exp
                && fn_exp.name.is_none()
            {
                fn_exp.name = Some(loc.name);
            }
            bindings.push(Binding {
                index: depth + i,
                loc,
                init,
            });
        }

        let body = self.exp(&items[2]);
        if !persist {
            self.frame().locals.truncate(depth);
        }
        ExpLoc::new(
            span,
            Exp::Let {
                bindings,
                body: Box::new(body),
                persist,
            },
        )
    }

    fn fn_form(&mut self, span: CodeRange, items: &[SExpLoc], is_generator: bool) -> ExpLoc {
        let head = if is_generator { "gen" } else { "fn" };
        if items.len() != 4 {
            return self.error(span, format!("Invalid form: `{head}' expects params, return type, body"));
        }
        let SExp::List(param_list) = &items[1].exp else {
            return self.error(items[1].span, format!("Invalid `{head}' parameter list"));
        };
        let Some(return_text) = items[2].exp.as_str() else {
            return self.error(items[2].span, format!("Invalid `{head}' return type"));
        };
        let return_type = ty::parse_annotation(return_text, self.interns);

        let mut params: Vec<Location> = Vec::with_capacity(param_list.len());
        let mut seen: AHashSet<StringId> = AHashSet::new();
        for entry in param_list {
            let SExp::List(parts) = &entry.exp else {
                self.error(entry.span, format!("Invalid `{head}' parameter"));
                continue;
            };
            let (Some(name), Some(ty_text)) = (
                parts.first().and_then(|p| p.exp.as_str()),
                parts.get(1).and_then(|p| p.exp.as_str()),
            ) else {
                self.error(entry.span, format!("Invalid `{head}' parameter"));
                continue;
            };
            let name_id = self.interns.intern(name);
            if !seen.insert(name_id) {
                self.error(entry.span, format!("Duplicate parameter `{name}'"));
                continue;
            }
            params.push(Location {
                name: name_id,
                ty: ty::parse_annotation(ty_text, self.interns),
                is_var: false,
            });
        }

        self.frames.push(CFrame {
            locals: params.clone(),
            is_fn: true,
            is_generator,
            ..CFrame::default()
        });
        let body = self.exp(&items[3]);
        let frame = self.frames.pop().expect("pushed above");

        let fn_ty = Rc::new(FnType {
            is_generator,
            params: Some(params.iter().map(|p| (p.name, p.ty.clone())).collect()),
            return_type,
            type_params: Vec::new(),
        });
        let mut node = ExpLoc::new(
            span,
            Exp::Fn(Box::new(FnExp {
                is_generator,
                params,
                captures: frame.captures,
                fn_ty: Rc::clone(&fn_ty),
                body,
                name: None,
            })),
        );
        node.ty = Type::Fn(fn_ty);
        node
    }

    fn prop_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() != 3 {
            return self.error(span, "Invalid form: `prop' expects a name and an object");
        }
        let Some(name) = items[1].exp.as_str() else {
            return self.error(items[1].span, "Invalid form: `prop' name must be a string");
        };
        let name_id = self.interns.intern(name);
        let obj = self.exp(&items[2]);
        ExpLoc::new(
            span,
            Exp::Property {
                obj: Box::new(obj),
                name: name_id,
            },
        )
    }

    fn set_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() != 3 {
            return self.error(span, "Invalid form: `set' expects an lvalue and a value");
        }
        let place = self.exp(&items[1]);
        let value = self.exp(&items[2]);
        let target = match place.exp {
            Exp::Local { index, loc } => {
                if !loc.is_var {
                    let name = self.interns.get(loc.name).to_owned();
                    return self.error(span, format!("Cannot assign to non-'var' `{name}'"));
                }
                LValue::Local { index, loc }
            }
            Exp::Capture { index, loc } => {
                if !loc.is_var {
                    let name = self.interns.get(loc.name).to_owned();
                    return self.error(span, format!("Cannot assign to non-'var' `{name}'"));
                }
                LValue::Capture { index, loc }
            }
            Exp::Property { obj, name } => LValue::Property { obj, name },
            _ => return self.error(items[1].span, "Bad lvalue"),
        };
        ExpLoc::new(
            span,
            Exp::Set {
                target,
                exp: Box::new(value),
            },
        )
    }

    fn map_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        let mut entries = Vec::with_capacity(items.len().saturating_sub(1));
        for entry in &items[1..] {
            let SExp::List(pair) = &entry.exp else {
                self.error(entry.span, "Invalid form: `map' entries are [key, value] pairs");
                continue;
            };
            if pair.len() != 2 {
                self.error(entry.span, "Invalid form: `map' entries are [key, value] pairs");
                continue;
            }
            let key = self.exp(&pair[0]);
            let value = self.exp(&pair[1]);
            entries.push((key, value));
        }
        ExpLoc::new(span, Exp::MapLiteral(entries))
    }

    fn if_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() != 3 && items.len() != 4 {
            return self.error(span, "Invalid form: `if' expects a condition, a consequent, and an optional alternate");
        }
        let cond = self.exp(&items[1]);
        let then = self.exp(&items[2]);
        let else_ = items.get(3).map(|e| Box::new(self.exp(e)));
        ExpLoc::new(
            span,
            Exp::If {
                cond: Box::new(cond),
                then: Box::new(then),
                else_,
            },
        )
    }

    fn logic_form(&mut self, span: CodeRange, items: &[SExpLoc], head: &str) -> ExpLoc {
        if items.len() != 3 {
            return self.error(span, format!("Invalid form: `{head}' expects two operands"));
        }
        let left = Box::new(self.exp(&items[1]));
        let right = Box::new(self.exp(&items[2]));
        let exp = if head == "and" {
            Exp::And { left, right }
        } else {
            Exp::Or { left, right }
        };
        ExpLoc::new(span, exp)
    }

    fn loop_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() != 2 {
            return self.error(span, "Invalid form: `loop' expects a body");
        }
        let locals_depth = self.frame().locals.len();
        self.frame().ctl.push(Ctl::Loop);
        let body = self.exp(&items[1]);
        self.frame().ctl.pop();
        ExpLoc::new(
            span,
            Exp::Loop {
                body: Box::new(body),
                locals_depth,
            },
        )
    }

    /// Whether a break/continue has an enclosing loop that is not cut off
    /// by a launch boundary.
    fn in_loop(&mut self) -> bool {
        self.frame().ctl.iter().rev().take_while(|c| **c != Ctl::Launch).any(|c| *c == Ctl::Loop)
    }

    fn break_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() > 2 {
            return self.error(span, "Invalid form: `break' takes at most one value");
        }
        if !self.in_loop() {
            return self.error(span, "Break outside a loop");
        }
        let exp = items
            .get(1)
            .map_or_else(|| ExpLoc::new(span, Exp::Literal(Literal::Null)), |e| self.exp(e));
        ExpLoc::new(span, Exp::Break { exp: Box::new(exp) })
    }

    fn continue_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() != 1 {
            return self.error(span, "Invalid form: `continue' takes no value");
        }
        if !self.in_loop() {
            return self.error(span, "Continue outside a loop");
        }
        ExpLoc::new(span, Exp::Continue)
    }

    fn return_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() > 2 {
            return self.error(span, "Invalid form: `return' takes at most one value");
        }
        if !self.frame().is_fn || self.frame().ctl.contains(&Ctl::Launch) {
            return self.error(span, "Return outside a function");
        }
        let exp = items
            .get(1)
            .map_or_else(|| ExpLoc::new(span, Exp::Literal(Literal::Null)), |e| self.exp(e));
        ExpLoc::new(span, Exp::Return { exp: Box::new(exp) })
    }

    fn yield_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() > 2 {
            return self.error(span, "Invalid form: `yield' takes at most one value");
        }
        if !self.frame().is_generator || self.frame().ctl.contains(&Ctl::Launch) {
            return self.error(span, "Yield outside a generator");
        }
        let exp = items
            .get(1)
            .map_or_else(|| ExpLoc::new(span, Exp::Literal(Literal::Null)), |e| self.exp(e));
        ExpLoc::new(span, Exp::Yield { exp: Box::new(exp) })
    }

    fn unary_form(&mut self, span: CodeRange, items: &[SExpLoc], head: &str) -> ExpLoc {
        if items.len() != 2 {
            return self.error(span, format!("Invalid form: `{head}' expects one operand"));
        }
        let exp = Box::new(self.exp(&items[1]));
        ExpLoc::new(span, Exp::Await { exp })
    }

    fn launch_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() != 2 {
            return self.error(span, "Invalid form: `launch' expects one operand");
        }
        self.frame().ctl.push(Ctl::Launch);
        let exp = Box::new(self.exp(&items[1]));
        self.frame().ctl.pop();
        ExpLoc::new(span, Exp::Launch { exp })
    }

    fn invoke_form(&mut self, span: CodeRange, items: &[SExpLoc]) -> ExpLoc {
        if items.len() < 3 {
            return self.error(span, "Invalid form: `invoke' expects an object and a method name");
        }
        let Some(method) = items[2].exp.as_str() else {
            return self.error(items[2].span, "Invalid form: `invoke' method must be a string");
        };
        let method_id = self.interns.intern(method);
        let obj = self.exp(&items[1]);
        let args = items[3..].iter().map(|a| self.exp(a)).collect();
        ExpLoc::new(
            span,
            Exp::Invoke {
                obj: Box::new(obj),
                method: method_id,
                args,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;

    use super::*;

    fn compile_src(interns: &mut Interns, src: &str) -> Compiled {
        let globals = AHashSet::new();
        let sexp = parse::parse(src).expect("parses");
        Compiler::new(interns, &globals)
            .compile(&sexp)
            .unwrap_or_else(|diags| panic!("compiles: {diags:?}"))
    }

    fn compile_errs(src: &str) -> Vec<Diagnostic> {
        let mut interns = Interns::new();
        let globals = AHashSet::new();
        let sexp = parse::parse(src).expect("parses");
        Compiler::new(&mut interns, &globals)
            .compile(&sexp)
            .expect_err("should not compile")
    }

    /// Digs the single `Fn` node out of a `let` whose last binding is a
    /// function.
    fn last_binding_fn(tree: &ExpLoc) -> &FnExp {
        let Exp::Let { bindings, .. } = &tree.exp else {
            panic!("expected let");
        };
        let Exp::Fn(fn_exp) = &bindings.last().expect("bindings").init.exp else {
            panic!("expected fn binding");
        };
        fn_exp
    }

    #[test]
    fn locals_resolve_from_end_for_shadowing() {
        let mut interns = Interns::new();
        let compiled = compile_src(
            &mut interns,
            r#"["let", [["const", "a", "Num", 1], ["const", "a", "Num", 2]], "a"]"#,
        );
        let Exp::Let { body, .. } = &compiled.tree.exp else {
            panic!("expected let");
        };
        let Exp::Local { index, .. } = &body.exp else {
            panic!("expected local read");
        };
        assert_eq!(*index, 1, "the later binding shadows the earlier one");
    }

    #[test]
    fn captures_record_order_of_first_observation() {
        let mut interns = Interns::new();
        let compiled = compile_src(
            &mut interns,
            r#"["let", [["var", "a", "Num", 0], ["var", "b", "Num", 0],
                        ["const", "f", "Any",
                         ["fn", [], "Num", ["invoke", "b", "add", "a"]]]],
                 "f"]"#,
        );
        let fn_exp = last_binding_fn(&compiled.tree);
        let names: Vec<&str> = fn_exp.captures.iter().map(|c| interns.get(c.loc.name)).collect();
        assert_eq!(names, vec!["b", "a"], "b is observed first");
        assert_eq!(fn_exp.captures[0].source, CaptureSource::Local(1));
        assert_eq!(fn_exp.captures[1].source, CaptureSource::Local(0));
    }

    #[test]
    fn transitive_captures_thread_through_intermediate_frames() {
        let mut interns = Interns::new();
        let compiled = compile_src(
            &mut interns,
            r#"["let", [["var", "x", "Num", 1],
                        ["const", "outer", "Any",
                         ["fn", [], "Any", ["fn", [], "Num", "x"]]]],
                 "outer"]"#,
        );
        let outer = last_binding_fn(&compiled.tree);
        // the intermediate function captures x from the let frame...
        assert_eq!(outer.captures.len(), 1);
        assert_eq!(outer.captures[0].source, CaptureSource::Local(0));
        // ...and the inner function captures through the intermediate's
        // capture list
        let Exp::Fn(inner) = &outer.body.exp else {
            panic!("expected nested fn");
        };
        assert_eq!(inner.captures.len(), 1);
        assert_eq!(inner.captures[0].source, CaptureSource::Capture(0));
    }

    #[test]
    fn parameters_become_frame_locals() {
        let mut interns = Interns::new();
        let compiled = compile_src(&mut interns, r#"["fn", [["p", "Num"], ["q", "Str"]], "Num", "q"]"#);
        let Exp::Fn(fn_exp) = &compiled.tree.exp else {
            panic!("expected fn");
        };
        let Exp::Local { index, .. } = &fn_exp.body.exp else {
            panic!("expected local read");
        };
        assert_eq!(*index, 1);
        assert!(fn_exp.captures.is_empty());
    }

    #[test]
    fn malformed_forms_are_reported_with_recovery() {
        // both problems surface, not just the first
        let diags = compile_errs(r#"["seq", ["let", 1, 2], ["break"]]"#);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].message, "Invalid let binding");
        assert_eq!(diags[1].message, "Break outside a loop");
    }

    #[test]
    fn empty_list_is_an_invalid_form() {
        let diags = compile_errs("[]");
        assert_eq!(diags[0].message, "Invalid form: empty list");
    }

    #[test]
    fn launch_blocks_return_and_yield() {
        let diags = compile_errs(r#"["fn", [], "Num", ["launch", ["return", 1]]]"#);
        assert_eq!(diags[0].message, "Return outside a function");
        let diags = compile_errs(r#"["gen", [], "Num", ["launch", ["yield", 1]]]"#);
        assert_eq!(diags[0].message, "Yield outside a generator");
    }

    #[test]
    fn loop_records_the_entry_depth() {
        let mut interns = Interns::new();
        let compiled = compile_src(
            &mut interns,
            r#"["let", [["var", "a", "Num", 0]], ["loop", ["break", "a"]]]"#,
        );
        let Exp::Let { body, .. } = &compiled.tree.exp else {
            panic!("expected let");
        };
        let Exp::Loop { locals_depth, .. } = &body.exp else {
            panic!("expected loop");
        };
        assert_eq!(*locals_depth, 1, "one let binding is live at loop entry");
    }
}
