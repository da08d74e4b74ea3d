//! String interning for scalar identity and cheap name comparison.
//!
//! Every Ursa string (literals, symbols, and strings built at runtime)
//! lives in one `Interns` table and is referred to by `StringId`. Two
//! constructions with equal raw content always yield the same id, so
//! comparing ids IS comparing identity, which is exactly the interned-scalar
//! guarantee the value model promises.

use std::str::FromStr;

use ahash::AHashMap;
use strum::{EnumIter, EnumString, IntoStaticStr};

/// Index into the string interner's storage.
///
/// Uses `u32` to save space (4 bytes vs 8 bytes for `usize`). This limits us
/// to ~4 billion unique strings, which is more than sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize)]
pub struct StringId(u32);

impl StringId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Names that are known at compile time and pre-interned at table creation.
///
/// Covers the built-in method names so method dispatch can be driven by an
/// enum match instead of string comparison, plus the prelude binding names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum StaticName {
    // Shared across variants
    Equals,
    NotEquals,
    ToString,
    Len,
    Get,
    Set,
    Iter,
    // Number methods
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Neg,
    Abs,
    Floor,
    Ceil,
    Round,
    Sqrt,
    Min,
    Max,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,
    ShiftLeft,
    ShiftRight,
    ShiftRightArith,
    Lt,
    Leq,
    Gt,
    Geq,
    // Boolean methods
    Not,
    // String methods
    Split,
    Trim,
    StartsWith,
    EndsWith,
    Contains,
    IndexOf,
    Repeat,
    ToLowerCase,
    ToUpperCase,
    ToNum,
    // List methods
    Push,
    Pop,
    Insert,
    Sorted,
    Reversed,
    Join,
    Slice,
    // Map methods
    Has,
    Delete,
    Keys,
    Values,
    // Prelude bindings
    Version,
    Debug,
    Fs,
    #[strum(serialize = "Promise")]
    Promise,
    Fetch,
    Js,
    Jslib,
    Use,
    Range,
}

/// Interner mapping strings to stable `StringId`s.
///
/// The table only ever grows; ids stay valid for the lifetime of the owning
/// `Runtime`. `StaticName` variants are interned first, in declaration order,
/// so `StringId` for a static name can be computed without a lookup.
#[derive(Debug)]
pub struct Interns {
    strings: Vec<String>,
    lookup: AHashMap<String, StringId>,
}

impl Interns {
    /// Creates a new table with all `StaticName`s pre-interned.
    #[must_use]
    pub fn new() -> Self {
        let mut interns = Self {
            strings: Vec::with_capacity(128),
            lookup: AHashMap::with_capacity(128),
        };
        for name in <StaticName as strum::IntoEnumIterator>::iter() {
            let s: &'static str = name.into();
            interns.intern(s);
        }
        interns
    }

    /// Interns a string, returning the id of the existing entry if the
    /// content was seen before.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(id) = self.lookup.get(s) {
            return *id;
        }
        let id = StringId(u32::try_from(self.strings.len()).expect("intern table exceeds u32"));
        self.strings.push(s.to_owned());
        self.lookup.insert(s.to_owned(), id);
        id
    }

    /// Interns an owned string without re-allocating when it is new.
    pub fn intern_owned(&mut self, s: String) -> StringId {
        if let Some(id) = self.lookup.get(s.as_str()) {
            return *id;
        }
        let id = StringId(u32::try_from(self.strings.len()).expect("intern table exceeds u32"));
        self.strings.push(s.clone());
        self.lookup.insert(s, id);
        id
    }

    /// Returns the string content for an id.
    ///
    /// # Panics
    /// Panics if the id did not come from this table.
    #[must_use]
    pub fn get(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }

    /// Returns the id for a pre-interned static name.
    #[must_use]
    pub fn static_name(&self, name: StaticName) -> StringId {
        let s: &'static str = name.into();
        self.lookup[s]
    }

    /// Resolves an id back to a static name, if it is one.
    #[must_use]
    pub fn as_static(&self, id: StringId) -> Option<StaticName> {
        StaticName::from_str(self.get(id)).ok()
    }

    /// Number of interned strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the table is empty (never true in practice: static names).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for Interns {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_id() {
        let mut interns = Interns::new();
        let a = interns.intern("hello");
        let b = interns.intern("hello");
        assert_eq!(a, b);
        let c = interns.intern_owned("hello".to_owned());
        assert_eq!(a, c);
    }

    #[test]
    fn distinct_content_distinct_ids() {
        let mut interns = Interns::new();
        let a = interns.intern("alpha");
        let b = interns.intern("beta");
        assert_ne!(a, b);
        assert_eq!(interns.get(a), "alpha");
        assert_eq!(interns.get(b), "beta");
    }

    #[test]
    fn static_names_round_trip() {
        let mut interns = Interns::new();
        let id = interns.static_name(StaticName::ShiftRightArith);
        assert_eq!(interns.get(id), "shiftRightArith");
        assert_eq!(interns.as_static(id), Some(StaticName::ShiftRightArith));
        // interning the text again yields the pre-interned id
        assert_eq!(interns.intern("shiftRightArith"), id);
    }
}
