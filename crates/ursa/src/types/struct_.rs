//! The Struct value: a name-keyed record whose member set is fixed at
//! construction. The globals struct is additionally frozen after the
//! prelude runs, rejecting all assignment.

use indexmap::IndexMap;

use crate::{
    intern::{Interns, StringId},
    value::Value,
};

/// A value with a fixed, ordered member set.
#[derive(Debug, Default)]
pub struct Struct {
    pub members: IndexMap<StringId, Value>,
    /// Set once on the globals struct after the prelude executes.
    pub frozen: bool,
}

impl Struct {
    #[must_use]
    pub fn new(members: IndexMap<StringId, Value>) -> Self {
        Self {
            members,
            frozen: false,
        }
    }

    /// Writes an existing member. The key set never grows: writing a
    /// missing member is an error, as is any write once frozen.
    pub fn set_member(&mut self, name: StringId, value: Value, interns: &Interns) -> Result<(), String> {
        if self.frozen {
            return Err(format!(
                "Cannot assign to frozen struct member `{}'",
                interns.get(name)
            ));
        }
        match self.members.get_mut(&name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!("Invalid property `{}'", interns.get(name))),
        }
    }
}
