//! The static type model: structural rules over gradually-typed programs.
//!
//! Types are cheap to clone (`Rc` payloads) and compared by the rules the
//! checker needs: nominal (by name) for structs, enums, and traits;
//! structural for function and union types; reflexive otherwise. `Any`
//! matches anything, `Unknown` matches only itself, and `Self` resolves to
//! the enclosing type context before comparison.

use std::{fmt, rc::Rc};

use indexmap::IndexMap;

use crate::intern::{Interns, StaticName, StringId};

/// A type as carried by expression nodes and locations.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// The type of `Undefined` (absent values, unbound slots).
    Undefined,
    /// Matches only itself; the bottom of the gradual lattice.
    Unknown,
    /// The type of expressions that never produce a value (a `loop` with no
    /// `break`).
    Nonterminating,
    /// The gradual wildcard.
    Any,
    /// The enclosing type context in method signatures.
    SelfType,
    Null,
    Bool,
    Num,
    Str,
    List,
    Map,
    /// A type variable from a `typeParams` list.
    Var(StringId),
    /// A named type constant with no further structure.
    Constant(StringId),
    Struct(Rc<StructType>),
    Enum(Rc<EnumType>),
    Trait(Rc<TraitType>),
    Fn(Rc<FnType>),
    Union(Rc<UnionType>),
}

/// A nominal struct type: fixed member set, optional trait impls.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: StringId,
    pub members: IndexMap<StringId, Type>,
    pub type_params: Vec<StringId>,
    pub impls: Vec<Impl>,
}

/// A nominal enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: StringId,
    pub variants: Vec<StringId>,
    pub type_params: Vec<StringId>,
}

/// A named set of method signatures a type may implement.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitType {
    pub name: StringId,
    pub methods: IndexMap<StringId, Rc<FnType>>,
    pub super_traits: Vec<Rc<TraitType>>,
    pub type_params: Vec<StringId>,
}

/// A trait implementation attached to a struct or enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct Impl {
    pub trait_: Rc<TraitType>,
    pub methods: IndexMap<StringId, Rc<FnType>>,
}

/// A function type. `params: None` means the parameter list is unknown
/// (native functions); calls against it are not arity- or type-checked.
#[derive(Debug, Clone, PartialEq)]
pub struct FnType {
    pub is_generator: bool,
    pub params: Option<Vec<(StringId, Type)>>,
    pub return_type: Type,
    pub type_params: Vec<StringId>,
}

impl FnType {
    /// A function type with unknown parameters returning `Any`.
    #[must_use]
    pub fn opaque() -> Self {
        Self {
            is_generator: false,
            params: None,
            return_type: Type::Any,
            type_params: Vec::new(),
        }
    }
}

/// A deduplicated set of member types.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub members: Vec<Type>,
}

impl Type {
    /// Structural equality per the type rules: nominal by name for
    /// structs/enums/traits, structural for fn/union, reflexive otherwise.
    /// `Any` equals only `Any` here; use [`Type::matches`] for gradual
    /// compatibility.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Struct(a), Self::Struct(b)) => a.name == b.name,
            (Self::Enum(a), Self::Enum(b)) => a.name == b.name,
            (Self::Trait(a), Self::Trait(b)) => a.name == b.name,
            (Self::Var(a), Self::Var(b)) | (Self::Constant(a), Self::Constant(b)) => a == b,
            (Self::Fn(a), Self::Fn(b)) => {
                if a.is_generator != b.is_generator || !a.return_type.equals(&b.return_type) {
                    return false;
                }
                match (&a.params, &b.params) {
                    (None, None) => true,
                    (Some(pa), Some(pb)) => {
                        pa.len() == pb.len() && pa.iter().zip(pb).all(|((_, ta), (_, tb))| ta.equals(tb))
                    }
                    _ => false,
                }
            }
            (Self::Union(a), Self::Union(b)) => {
                a.members.len() == b.members.len()
                    && a.members.iter().all(|m| b.members.iter().any(|n| m.equals(n)))
                    && b.members.iter().all(|m| a.members.iter().any(|n| m.equals(n)))
            }
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    /// Gradual compatibility: like [`Type::equals`] but `Any` matches
    /// anything on either side (and `Unknown` still matches only itself).
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unknown, Self::Unknown) => true,
            (Self::Unknown, _) | (_, Self::Unknown) => false,
            (Self::Any, _) | (_, Self::Any) => true,
            _ => self.equals(other),
        }
    }

    /// Replaces `Self` with the given enclosing type context.
    #[must_use]
    pub fn resolve_self(&self, context: &Self) -> Self {
        match self {
            Self::SelfType => context.clone(),
            Self::Fn(f) => Self::Fn(Rc::new(FnType {
                is_generator: f.is_generator,
                params: f
                    .params
                    .as_ref()
                    .map(|ps| ps.iter().map(|(n, t)| (*n, t.resolve_self(context))).collect()),
                return_type: f.return_type.resolve_self(context),
                type_params: f.type_params.clone(),
            })),
            Self::Union(u) => union_of(u.members.iter().map(|m| m.resolve_self(context))),
            other => other.clone(),
        }
    }

    /// Renders the type for diagnostics.
    #[must_use]
    pub fn show(&self, interns: &Interns) -> String {
        match self {
            Self::Undefined => "Undefined".to_owned(),
            Self::Unknown => "Unknown".to_owned(),
            Self::Nonterminating => "Nonterminating".to_owned(),
            Self::Any => "Any".to_owned(),
            Self::SelfType => "Self".to_owned(),
            Self::Null => "Null".to_owned(),
            Self::Bool => "Bool".to_owned(),
            Self::Num => "Num".to_owned(),
            Self::Str => "Str".to_owned(),
            Self::List => "List".to_owned(),
            Self::Map => "Map".to_owned(),
            Self::Var(name) | Self::Constant(name) => interns.get(*name).to_owned(),
            Self::Struct(s) => interns.get(s.name).to_owned(),
            Self::Enum(e) => interns.get(e.name).to_owned(),
            Self::Trait(t) => interns.get(t.name).to_owned(),
            Self::Fn(f) => {
                let params = f.params.as_ref().map_or("...".to_owned(), |ps| {
                    ps.iter().map(|(_, t)| t.show(interns)).collect::<Vec<_>>().join(", ")
                });
                let head = if f.is_generator { "Gen" } else { "Fn" };
                format!("{head}({params}): {}", f.return_type.show(interns))
            }
            Self::Union(u) => u
                .members
                .iter()
                .map(|m| m.show(interns))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Interns-free fallback used by Debug-ish contexts.
        match self {
            Self::Struct(_) => f.write_str("struct"),
            Self::Enum(_) => f.write_str("enum"),
            Self::Trait(_) => f.write_str("trait"),
            Self::Fn(ft) => f.write_str(if ft.is_generator { "Gen" } else { "Fn" }),
            Self::Union(_) => f.write_str("union"),
            Self::Var(_) | Self::Constant(_) => f.write_str("named"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Union construction: `T ∪ T = T`; `Any ∪ T = Any`; `Unknown ∪ T = T`;
/// `Nonterminating ∪ T = T`; otherwise a flattened, structurally
/// deduplicated union.
#[must_use]
pub fn union(a: &Type, b: &Type) -> Type {
    union_of([a.clone(), b.clone()])
}

/// Union of an arbitrary number of member types, flattening nested unions.
pub fn union_of(members: impl IntoIterator<Item = Type>) -> Type {
    let mut flat: Vec<Type> = Vec::new();
    let mut push = |t: Type, flat: &mut Vec<Type>| {
        match t {
            Type::Unknown | Type::Nonterminating => {}
            other => {
                if !flat.iter().any(|m| m.equals(&other)) {
                    flat.push(other);
                }
            }
        }
    };
    for member in members {
        if let Type::Union(u) = &member {
            for m in &u.members {
                push(m.clone(), &mut flat);
            }
        } else {
            push(member, &mut flat);
        }
    }
    if flat.iter().any(|m| matches!(m, Type::Any)) {
        return Type::Any;
    }
    match flat.len() {
        0 => Type::Nonterminating,
        1 => flat.pop().expect("len checked"),
        _ => Type::Union(Rc::new(UnionType { members: flat })),
    }
}

/// Parses a type annotation string from the s-expression input.
///
/// The annotation grammar is a bare name: the primitive names resolve to
/// their types, anything else becomes a named type constant. An empty
/// annotation means `Any` (fully dynamic).
pub fn parse_annotation(text: &str, interns: &mut Interns) -> Type {
    match text {
        "" | "Any" => Type::Any,
        "Unknown" => Type::Unknown,
        "Undefined" => Type::Undefined,
        "Nonterminating" => Type::Nonterminating,
        "Self" => Type::SelfType,
        "Null" => Type::Null,
        "Bool" => Type::Bool,
        "Num" => Type::Num,
        "Str" => Type::Str,
        "List" => Type::List,
        "Map" => Type::Map,
        other => Type::Constant(interns.intern(other)),
    }
}

/// The signature of a built-in method: parameter types (excluding the
/// receiver) and the return type, with `Self` already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub params: Vec<Type>,
    pub return_type: Type,
}

impl MethodSig {
    fn new(params: Vec<Type>, return_type: Type) -> Self {
        Self { params, return_type }
    }
}

/// Looks up the signature of a built-in method on a receiver type.
///
/// Returns `None` when the receiver has no such method; the checker turns
/// that into a type error (unless the receiver is `Any`).
#[must_use]
pub fn builtin_method_sig(receiver: &Type, name: StaticName) -> Option<MethodSig> {
    use StaticName as N;
    use Type as T;
    let iter_fn = || T::Fn(Rc::new(FnType::opaque()));
    let sig = MethodSig::new;
    match receiver {
        T::Num => match name {
            N::Add | N::Sub | N::Mul | N::Div | N::Mod | N::Pow | N::Min | N::Max => Some(sig(vec![T::Num], T::Num)),
            N::BitwiseAnd | N::BitwiseOr | N::BitwiseXor | N::ShiftLeft | N::ShiftRight | N::ShiftRightArith => {
                Some(sig(vec![T::Num], T::Num))
            }
            N::Neg | N::Abs | N::Floor | N::Ceil | N::Round | N::Sqrt | N::BitwiseNot => Some(sig(vec![], T::Num)),
            N::Lt | N::Leq | N::Gt | N::Geq => Some(sig(vec![T::Num], T::Bool)),
            N::Equals | N::NotEquals => Some(sig(vec![T::Any], T::Bool)),
            N::ToString => Some(sig(vec![], T::Str)),
            _ => None,
        },
        T::Bool => match name {
            N::Not => Some(sig(vec![], T::Bool)),
            N::Equals | N::NotEquals => Some(sig(vec![T::Any], T::Bool)),
            N::ToString => Some(sig(vec![], T::Str)),
            _ => None,
        },
        T::Null => match name {
            N::Equals | N::NotEquals => Some(sig(vec![T::Any], T::Bool)),
            N::ToString => Some(sig(vec![], T::Str)),
            _ => None,
        },
        T::Str => match name {
            N::Add => Some(sig(vec![T::Str], T::Str)),
            N::Trim | N::ToLowerCase | N::ToUpperCase => Some(sig(vec![], T::Str)),
            N::Len => Some(sig(vec![], T::Num)),
            N::IndexOf => Some(sig(vec![T::Str], T::Num)),
            N::Get => Some(sig(vec![T::Num], T::Str)),
            N::Split => Some(sig(vec![T::Str], T::List)),
            N::StartsWith | N::EndsWith | N::Contains => Some(sig(vec![T::Str], T::Bool)),
            N::Repeat => Some(sig(vec![T::Num], T::Str)),
            N::Lt | N::Leq | N::Gt | N::Geq => Some(sig(vec![T::Str], T::Bool)),
            N::Equals | N::NotEquals => Some(sig(vec![T::Any], T::Bool)),
            N::ToNum => Some(sig(vec![], T::Num)),
            N::ToString => Some(sig(vec![], T::Str)),
            N::Iter => Some(sig(vec![], iter_fn())),
            _ => None,
        },
        T::List => match name {
            N::Len => Some(sig(vec![], T::Num)),
            N::Get => Some(sig(vec![T::Num], T::Any)),
            N::Set => Some(sig(vec![T::Num, T::Any], T::Any)),
            N::Push => Some(sig(vec![T::Any], T::List)),
            N::Pop => Some(sig(vec![], T::Any)),
            N::Insert => Some(sig(vec![T::Num, T::Any], T::List)),
            N::Sorted | N::Reversed => Some(sig(vec![], T::List)),
            N::Join => Some(sig(vec![T::Str], T::Str)),
            N::Slice => Some(sig(vec![T::Num, T::Num], T::List)),
            N::Contains => Some(sig(vec![T::Any], T::Bool)),
            N::IndexOf => Some(sig(vec![T::Any], T::Num)),
            N::Equals | N::NotEquals => Some(sig(vec![T::Any], T::Bool)),
            N::ToString => Some(sig(vec![], T::Str)),
            N::Iter => Some(sig(vec![], iter_fn())),
            _ => None,
        },
        T::Map => match name {
            N::Len => Some(sig(vec![], T::Num)),
            N::Get => Some(sig(vec![T::Any], T::Any)),
            N::Set => Some(sig(vec![T::Any, T::Any], T::Map)),
            N::Has | N::Delete => Some(sig(vec![T::Any], T::Bool)),
            N::Keys | N::Values | N::Iter => Some(sig(vec![], iter_fn())),
            N::Equals | N::NotEquals => Some(sig(vec![T::Any], T::Bool)),
            N::ToString => Some(sig(vec![], T::Str)),
            _ => None,
        },
        _ => None,
    }
}
