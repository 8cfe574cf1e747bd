//! Declared types and the subtype relation between them.
//!
//! The kernel never introspects types. Whatever knows the hierarchy (the
//! declaration discovery collaborator) hands in a [`TypeRelation`]; the
//! kernel only asks it whether one erased type may stand in for another.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A declared type as written at a declaration site, possibly generic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(pub String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The type with generic arguments removed: `List<String>` -> `List`.
    pub fn erased(&self) -> &str {
        match self.0.find('<') {
            Some(pos) => self.0[..pos].trim(),
            None => self.0.trim(),
        }
    }

    /// Whether two declared types erase to the same type.
    pub fn same_erasure(&self, other: &TypeRef) -> bool {
        self.erased() == other.erased()
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Assignability between erased types.
///
/// Used for covariant return types only; parameter types must always erase
/// identically.
pub trait TypeRelation: Send + Sync {
    /// Whether a value of `sub` may be used where `sup` is expected.
    fn is_assignable(&self, sub: &TypeRef, sup: &TypeRef) -> bool;
}

/// Assignable exactly when both sides erase to the same type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErasedEquality;

impl TypeRelation for ErasedEquality {
    fn is_assignable(&self, sub: &TypeRef, sup: &TypeRef) -> bool {
        sub.same_erasure(sup)
    }
}

/// Explicit direct-supertype table over erased type names.
///
/// Assignability is the reflexive, transitive closure of the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubtypeTable {
    supertypes: BTreeMap<String, BTreeSet<String>>,
}

impl SubtypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `sub` directly extends or implements `sup`.
    pub fn declare(&mut self, sub: impl Into<String>, sup: impl Into<String>) -> &mut Self {
        self.supertypes
            .entry(sub.into())
            .or_default()
            .insert(sup.into());
        self
    }

    /// All transitive supertypes of `name`, excluding `name` itself.
    pub fn supertypes_of(&self, name: &str) -> BTreeSet<&str> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = vec![name];
        while let Some(current) = stack.pop() {
            if let Some(direct) = self.supertypes.get(current) {
                for sup in direct {
                    if sup != name && seen.insert(sup.as_str()) {
                        stack.push(sup.as_str());
                    }
                }
            }
        }
        seen
    }
}

impl TypeRelation for SubtypeTable {
    fn is_assignable(&self, sub: &TypeRef, sup: &TypeRef) -> bool {
        sub.same_erasure(sup) || self.supertypes_of(sub.erased()).contains(sup.erased())
    }
}
