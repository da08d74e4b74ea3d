//! Native callables and opaque host objects.
//!
//! `NativeFn`/`NativeAsyncFn` are the prelude's fixed callables; their
//! bodies live in the interpreter (which owns the print writer and heap).
//! `NativeObject` is the host-object protocol: an opaque value exposing
//! get/set by name, used by the `fs` wrapper.

use std::{fmt::Debug, fs, io::ErrorKind, path::PathBuf};

use strum::{Display, IntoStaticStr};

use crate::{
    intern::Interns,
    value::{Value, format_num},
};

/// A synchronous native callable bound by the prelude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum NativeFn {
    /// Prints the repr of each argument.
    Debug,
    /// Returns a `NativeObject` wrapping a directory path.
    Fs,
    /// `js.use`: JavaScript bridging is not available in this runtime.
    JsUse,
    /// `jslib.use`: same as `JsUse`.
    JslibUse,
}

/// A native callable whose result is awaited inline by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum NativeAsyncFn {
    /// Wraps its argument in a resolved promise.
    Promise,
    /// Network access is out of scope; calling raises.
    Fetch,
}

/// An opaque host object exposing get/set by name.
///
/// `get` returns `Ok(None)` when the name does not exist (the interpreter
/// raises `Invalid property`); `Err` carries a host failure message.
pub trait NativeObject: Debug {
    /// A short name for error messages and repr.
    fn type_name(&self) -> &'static str;

    fn get(&self, name: &str, interns: &mut Interns) -> Result<Option<Value>, String>;

    fn set(&mut self, name: &str, value: Value, interns: &Interns) -> Result<(), String>;
}

/// A filesystem directory viewed as a name-to-string mapping.
///
/// Each operation opens the directory entry afresh and releases the handle
/// on drop; the wrapper never holds a file open across instructions.
#[derive(Debug)]
pub struct FsObject {
    root: PathBuf,
}

impl FsObject {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn entry(&self, name: &str) -> Result<PathBuf, String> {
        if name.contains('/') || name.contains('\\') || name == ".." {
            return Err(format!("fs: invalid entry name `{name}'"));
        }
        Ok(self.root.join(name))
    }
}

impl NativeObject for FsObject {
    fn type_name(&self) -> &'static str {
        "fs"
    }

    fn get(&self, name: &str, interns: &mut Interns) -> Result<Option<Value>, String> {
        let path = self.entry(name)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(Value::Str(interns.intern_owned(contents)))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Some(Value::Null)),
            Err(err) => Err(format!("fs: cannot read `{name}': {err}")),
        }
    }

    fn set(&mut self, name: &str, value: Value, interns: &Interns) -> Result<(), String> {
        let path = self.entry(name)?;
        let contents = match value {
            Value::Str(id) => interns.get(id).to_owned(),
            Value::Num(n) => format_num(n),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            _ => return Err("fs: can only write scalar values".to_owned()),
        };
        fs::write(&path, contents).map_err(|err| format!("fs: cannot write `{name}': {err}"))
    }
}
