//! The type checker: structural rules over the expression tree.
//!
//! The checker walks the tree once, annotating every node's derived type
//! and accumulating errors; it never stops at the first problem. Gradual
//! typing shows up as `Any`, which matches everything, so fully dynamic
//! programs pass through unchecked and annotated programs get the §4.3
//! rules enforced.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    error::{Diagnostic, DiagnosticKind},
    expressions::{Exp, ExpLoc, LValue, Literal},
    intern::{Interns, StaticName, StringId},
    parse::CodeRange,
    ty::{self, FnType, MethodSig, StructType, Type},
};

/// Checks a compiled tree against the globals struct type, annotating
/// nodes in place. Returns the accumulated type errors.
pub fn check(tree: &mut ExpLoc, globals_ty: &Rc<StructType>, interns: &mut Interns) -> Vec<Diagnostic> {
    let mut checker = Checker {
        interns,
        globals_ty: Rc::clone(globals_ty),
        errors: Vec::new(),
        loops: Vec::new(),
        fns: Vec::new(),
    };
    checker.exp(tree);
    checker.errors
}

struct Checker<'a> {
    interns: &'a mut Interns,
    globals_ty: Rc<StructType>,
    errors: Vec<Diagnostic>,
    /// Union accumulators for enclosing loops (`None` until a break
    /// contributes).
    loops: Vec<Option<Type>>,
    /// Enclosing function types, innermost last.
    fns: Vec<Rc<FnType>>,
}

impl Checker<'_> {
    fn error(&mut self, span: CodeRange, message: impl Into<String>) {
        self.errors.push(Diagnostic::new(DiagnosticKind::Type, message, span));
    }

    fn exp(&mut self, node: &mut ExpLoc) {
        let span = node.span;
        let ty = match &mut node.exp {
            Exp::Literal(lit) => match lit {
                Literal::Null => Type::Null,
                Literal::Bool(_) => Type::Bool,
                Literal::Num(_) => Type::Num,
                Literal::Str(_) => Type::Str,
                Literal::Globals => Type::Struct(Rc::clone(&self.globals_ty)),
            },
            Exp::Local { loc, .. } | Exp::Capture { loc, .. } => loc.ty.clone(),
            Exp::Property { obj, name } => {
                let name = *name;
                self.exp(obj);
                let obj_ty = obj.ty.clone();
                self.property_type(span, &obj_ty, name)
            }
            Exp::Set { target, exp } => {
                let target_ty = match target {
                    LValue::Local { loc, .. } | LValue::Capture { loc, .. } => loc.ty.clone(),
                    LValue::Property { obj, name } => {
                        let name = *name;
                        self.exp(obj);
                        let obj_ty = obj.ty.clone();
                        self.property_type(span, &obj_ty, name)
                    }
                };
                self.exp(exp);
                if !target_ty.matches(&exp.ty) {
                    let expected = target_ty.show(self.interns);
                    let got = exp.ty.show(self.interns);
                    self.error(span, format!("Type mismatch in assignment: expected {expected}, got {got}"));
                }
                exp.ty.clone()
            }
            Exp::Call { func, args } => {
                self.exp(func);
                for arg in args.iter_mut() {
                    self.exp(arg);
                }
                let func_ty = func.ty.clone();
                match func_ty {
                    Type::Any => Type::Any,
                    Type::Fn(ft) => {
                        if let Some(params) = &ft.params {
                            self.check_args(span, params.iter().map(|(_, t)| t), params.len(), args);
                        }
                        if ft.is_generator {
                            // calling a generator closure yields a callable
                            // continuation, not the return type
                            Type::Fn(Rc::new(FnType::opaque()))
                        } else {
                            ft.return_type.clone()
                        }
                    }
                    other => {
                        let got = other.show(self.interns);
                        self.error(span, format!("Invalid call: {got} is not callable"));
                        Type::Any
                    }
                }
            }
            Exp::Invoke { obj, method, args } => {
                let method = *method;
                self.exp(obj);
                for arg in args.iter_mut() {
                    self.exp(arg);
                }
                let obj_ty = obj.ty.clone();
                self.invoke_type(span, &obj_ty, method, args)
            }
            Exp::ObjectLiteral { members } => {
                let mut member_types: IndexMap<StringId, Type> = IndexMap::with_capacity(members.len());
                for (name, member) in members.iter_mut() {
                    self.exp(member);
                    member_types.insert(*name, member.ty.clone());
                }
                let name = self.interns.intern("Object");
                Type::Struct(Rc::new(StructType {
                    name,
                    members: member_types,
                    type_params: Vec::new(),
                    impls: Vec::new(),
                }))
            }
            Exp::ListLiteral(items) => {
                for item in items.iter_mut() {
                    self.exp(item);
                }
                Type::List
            }
            Exp::MapLiteral(entries) => {
                for (key, value) in entries.iter_mut() {
                    self.exp(key);
                    self.exp(value);
                }
                Type::Map
            }
            Exp::Sequence(items) => {
                let mut last = Type::Null;
                for item in items.iter_mut() {
                    self.exp(item);
                    last = item.ty.clone();
                }
                last
            }
            Exp::If { cond, then, else_ } => {
                self.exp(cond);
                self.require_bool(cond);
                self.exp(then);
                match else_ {
                    Some(alt) => {
                        self.exp(alt);
                        ty::union(&then.ty, &alt.ty)
                    }
                    None => ty::union(&then.ty, &Type::Null),
                }
            }
            Exp::And { left, right } | Exp::Or { left, right } => {
                self.exp(left);
                self.require_bool(left);
                self.exp(right);
                self.require_bool(right);
                Type::Bool
            }
            Exp::Loop { body, .. } => {
                self.loops.push(None);
                self.exp(body);
                match self.loops.pop().expect("pushed above") {
                    Some(result) => result,
                    None => Type::Nonterminating,
                }
            }
            Exp::Break { exp } => {
                self.exp(exp);
                let contributed = exp.ty.clone();
                if let Some(acc) = self.loops.last_mut() {
                    *acc = Some(match acc.take() {
                        Some(existing) => ty::union(&existing, &contributed),
                        None => contributed,
                    });
                }
                Type::Nonterminating
            }
            Exp::Continue => Type::Nonterminating,
            Exp::Return { exp } => {
                self.exp(exp);
                if let Some(fn_ty) = self.fns.last() {
                    // generator returns are unchecked in this version
                    if !fn_ty.is_generator && !exp.ty.matches(&fn_ty.return_type) {
                        let expected = fn_ty.return_type.show(self.interns);
                        let got = exp.ty.show(self.interns);
                        self.error(span, format!("Return type mismatch: expected {expected}, got {got}"));
                    }
                }
                Type::Nonterminating
            }
            Exp::Yield { exp } => {
                self.exp(exp);
                Type::Any
            }
            Exp::Fn(fn_exp) => {
                self.fns.push(Rc::clone(&fn_exp.fn_ty));
                // break/continue never cross a callable boundary
                let loops = std::mem::take(&mut self.loops);
                self.exp(&mut fn_exp.body);
                self.loops = loops;
                self.fns.pop();
                Type::Fn(Rc::clone(&fn_exp.fn_ty))
            }
            Exp::Await { exp } => {
                self.exp(exp);
                Type::Any
            }
            Exp::Launch { exp } => {
                self.exp(exp);
                Type::Constant(self.interns.static_name(StaticName::Promise))
            }
            Exp::Let { bindings, body, .. } => {
                for binding in bindings.iter_mut() {
                    self.exp(&mut binding.init);
                }
                self.exp(body);
                body.ty.clone()
            }
        };
        node.ty = ty;
    }

    fn require_bool(&mut self, node: &ExpLoc) {
        if !node.ty.matches(&Type::Bool) {
            let got = node.ty.show(self.interns);
            let span = node.span;
            self.error(span, format!("Condition must be a Bool, got {got}"));
        }
    }

    /// The type of reading `name` on a value of type `obj_ty`.
    fn property_type(&mut self, span: CodeRange, obj_ty: &Type, name: StringId) -> Type {
        match obj_ty {
            Type::Any | Type::Constant(_) | Type::Var(_) | Type::Undefined => Type::Any,
            Type::Struct(s) => {
                if let Some(member) = s.members.get(&name) {
                    member.clone()
                } else if let Some(sig) = self.method_sig(obj_ty, name) {
                    sig_fn_type(&sig)
                } else {
                    let text = self.interns.get(name).to_owned();
                    self.error(span, format!("Invalid property `{text}'"));
                    Type::Undefined
                }
            }
            Type::Null | Type::Bool | Type::Num | Type::Str | Type::List | Type::Map => {
                match self.method_sig(obj_ty, name) {
                    Some(sig) => sig_fn_type(&sig),
                    None => {
                        let text = self.interns.get(name).to_owned();
                        self.error(span, format!("Invalid property `{text}'"));
                        Type::Undefined
                    }
                }
            }
            _ => {
                self.error(span, "Invalid object");
                Type::Undefined
            }
        }
    }

    /// The result type of invoking `method` on a value of type `obj_ty`,
    /// checking arguments against the resolved signature.
    fn invoke_type(&mut self, span: CodeRange, obj_ty: &Type, method: StringId, args: &[ExpLoc]) -> Type {
        match obj_ty {
            Type::Any | Type::Constant(_) | Type::Var(_) | Type::Undefined | Type::Unknown => Type::Any,
            Type::Struct(s) => {
                if let Some(member) = s.members.get(&method).cloned() {
                    return match member {
                        Type::Fn(ft) => {
                            if let Some(params) = &ft.params {
                                self.check_args(span, params.iter().map(|(_, t)| t), params.len(), args);
                            }
                            ft.return_type.clone()
                        }
                        Type::Any => Type::Any,
                        _ => {
                            let text = self.interns.get(method).to_owned();
                            self.error(span, format!("Member `{text}' is not callable"));
                            Type::Any
                        }
                    };
                }
                if let Some(sig) = s
                    .impls
                    .iter()
                    .find_map(|imp| imp.methods.get(&method))
                    .map(|ft| MethodSig {
                        params: ft
                            .params
                            .as_ref()
                            .map(|ps| ps.iter().map(|(_, t)| t.resolve_self(obj_ty)).collect())
                            .unwrap_or_default(),
                        return_type: ft.return_type.resolve_self(obj_ty),
                    })
                    .or_else(|| self.method_sig(obj_ty, method))
                {
                    self.check_args(span, sig.params.iter(), sig.params.len(), args);
                    return sig.return_type;
                }
                let text = self.interns.get(method).to_owned();
                self.error(span, format!("Invalid method `{text}'"));
                Type::Any
            }
            Type::Trait(t) => match t.methods.get(&method) {
                Some(ft) => {
                    let sig = MethodSig {
                        params: ft
                            .params
                            .as_ref()
                            .map(|ps| ps.iter().map(|(_, ty)| ty.resolve_self(obj_ty)).collect())
                            .unwrap_or_default(),
                        return_type: ft.return_type.resolve_self(obj_ty),
                    };
                    self.check_args(span, sig.params.iter(), sig.params.len(), args);
                    sig.return_type
                }
                None => {
                    let text = self.interns.get(method).to_owned();
                    self.error(span, format!("Invalid method `{text}'"));
                    Type::Any
                }
            },
            Type::Null | Type::Bool | Type::Num | Type::Str | Type::List | Type::Map => {
                match self.method_sig(obj_ty, method) {
                    Some(sig) => {
                        self.check_args(span, sig.params.iter(), sig.params.len(), args);
                        sig.return_type
                    }
                    None => {
                        let text = self.interns.get(method).to_owned();
                        self.error(span, format!("Invalid method `{text}'"));
                        Type::Any
                    }
                }
            }
            _ => {
                self.error(span, "Invalid object");
                Type::Any
            }
        }
    }

    /// The built-in signature for `method` on `obj_ty`, including the
    /// universal identity methods.
    fn method_sig(&self, obj_ty: &Type, method: StringId) -> Option<MethodSig> {
        let name = self.interns.as_static(method)?;
        match name {
            StaticName::Equals | StaticName::NotEquals => Some(MethodSig {
                params: vec![Type::Any],
                return_type: Type::Bool,
            }),
            StaticName::ToString => Some(MethodSig {
                params: vec![],
                return_type: Type::Str,
            }),
            _ => ty::builtin_method_sig(obj_ty, name),
        }
    }

    fn check_args<'t>(
        &mut self,
        span: CodeRange,
        params: impl Iterator<Item = &'t Type>,
        arity: usize,
        args: &[ExpLoc],
    ) {
        if args.len() != arity {
            self.error(span, format!("Expected {arity} argument(s), got {}", args.len()));
            return;
        }
        for (i, (param, arg)) in params.zip(args).enumerate() {
            if !arg.ty.matches(param) {
                let expected = param.show(self.interns);
                let got = arg.ty.show(self.interns);
                self.error(span, format!("Argument {} has type {got}, expected {expected}", i + 1));
            }
        }
    }
}

/// Wraps a method signature as a bound-method function type (what a
/// property read of the method yields).
fn sig_fn_type(sig: &MethodSig) -> Type {
    Type::Fn(Rc::new(FnType {
        is_generator: false,
        params: Some(sig.params.iter().map(|t| (StringId::default(), t.clone())).collect()),
        return_type: sig.return_type.clone(),
        type_params: Vec::new(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::ty::{Impl, TraitType};

    use super::*;

    fn empty_globals(interns: &mut Interns) -> Rc<StructType> {
        Rc::new(StructType {
            name: interns.intern("Globals"),
            members: IndexMap::new(),
            type_params: Vec::new(),
            impls: Vec::new(),
        })
    }

    fn checker<'a>(interns: &'a mut Interns, globals_ty: Rc<StructType>) -> Checker<'a> {
        Checker {
            interns,
            globals_ty,
            errors: Vec::new(),
            loops: Vec::new(),
            fns: Vec::new(),
        }
    }

    fn typed_node(ty: Type) -> ExpLoc {
        let mut node = ExpLoc::new(CodeRange::default(), Exp::Literal(Literal::Null));
        node.ty = ty;
        node
    }

    /// `Self` in a trait method resolves to the receiver's type before
    /// the argument check.
    #[test]
    fn trait_methods_substitute_self() {
        let mut interns = Interns::new();
        let globals = empty_globals(&mut interns);
        let method = interns.intern("cmp");
        let mut methods = IndexMap::new();
        methods.insert(
            method,
            Rc::new(FnType {
                is_generator: false,
                params: Some(vec![(StringId::default(), Type::SelfType)]),
                return_type: Type::Num,
                type_params: Vec::new(),
            }),
        );
        let trait_ty = Type::Trait(Rc::new(TraitType {
            name: interns.intern("Comparable"),
            methods,
            super_traits: Vec::new(),
            type_params: Vec::new(),
        }));

        let mut checker = checker(&mut interns, globals);
        let span = CodeRange::default();

        let ok = checker.invoke_type(span, &trait_ty, method, &[typed_node(trait_ty.clone())]);
        assert!(checker.errors.is_empty(), "{:?}", checker.errors);
        assert!(ok.equals(&Type::Num));

        // a Num does not satisfy Self (= the trait itself)
        checker.invoke_type(span, &trait_ty, method, &[typed_node(Type::Num)]);
        assert_eq!(checker.errors.len(), 1);
    }

    /// Struct impl tables answer invokes when no member shadows them.
    #[test]
    fn struct_impls_resolve_methods() {
        let mut interns = Interns::new();
        let globals = empty_globals(&mut interns);
        let describe = interns.intern("describe");
        let mut trait_methods = IndexMap::new();
        trait_methods.insert(
            describe,
            Rc::new(FnType {
                is_generator: false,
                params: Some(Vec::new()),
                return_type: Type::Str,
                type_params: Vec::new(),
            }),
        );
        let trait_ = Rc::new(TraitType {
            name: interns.intern("Show"),
            methods: trait_methods.clone(),
            super_traits: Vec::new(),
            type_params: Vec::new(),
        });
        let struct_ty = Type::Struct(Rc::new(StructType {
            name: interns.intern("Point"),
            members: IndexMap::new(),
            type_params: Vec::new(),
            impls: vec![Impl {
                trait_,
                methods: trait_methods,
            }],
        }));

        let mut checker = checker(&mut interns, globals);
        let result = checker.invoke_type(CodeRange::default(), &struct_ty, describe, &[]);
        assert!(checker.errors.is_empty(), "{:?}", checker.errors);
        assert!(result.equals(&Type::Str));
    }

    /// Unknown methods on nominal types are reported, not guessed.
    #[test]
    fn unknown_struct_method_is_an_error() {
        let mut interns = Interns::new();
        let globals = empty_globals(&mut interns);
        let struct_ty = Type::Struct(Rc::new(StructType {
            name: interns.intern("Point"),
            members: IndexMap::new(),
            type_params: Vec::new(),
            impls: Vec::new(),
        }));
        let missing = interns.intern("vanish");
        let mut checker = checker(&mut interns, globals);
        checker.invoke_type(CodeRange::default(), &struct_ty, missing, &[]);
        assert_eq!(checker.errors.len(), 1);
        assert_eq!(checker.errors[0].message, "Invalid method `vanish'");
    }
}
