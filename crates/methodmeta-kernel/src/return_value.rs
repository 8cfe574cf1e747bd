//! Constraint metadata for a method's return value.

use crate::constraint::{ConstraintRecord, display_constraints};
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Immutable constraint metadata of the return slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnValueMetadata {
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    constraints: Vec<Arc<ConstraintRecord>>,
    #[serde(default)]
    cascading: bool,
}

impl ReturnValueMetadata {
    pub fn new(ty: TypeRef, constraints: Vec<Arc<ConstraintRecord>>, cascading: bool) -> Self {
        Self {
            ty,
            constraints,
            cascading,
        }
    }

    pub fn empty(ty: TypeRef) -> Self {
        Self::new(ty, Vec::new(), false)
    }

    pub fn with_constraint(mut self, constraint: Arc<ConstraintRecord>) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn cascaded(mut self) -> Self {
        self.cascading = true;
        self
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn constraints(&self) -> &[Arc<ConstraintRecord>] {
        &self.constraints
    }

    pub fn is_cascading(&self) -> bool {
        self.cascading
    }

    pub fn is_constrained(&self) -> bool {
        self.cascading || !self.constraints.is_empty()
    }

    pub fn constraint_set(&self) -> BTreeSet<&ConstraintRecord> {
        self.constraints.iter().map(Arc::as_ref).collect()
    }

    /// Accumulate the return-value declarations of an overriding site.
    ///
    /// Postconditions may only grow, so this never fails. The merged type is
    /// `other`'s: folding root-to-leaf, that is the most specific (covariant)
    /// return type. Compatibility of the two types is checked by the merger
    /// before any fold.
    pub fn merge(&self, other: &ReturnValueMetadata) -> ReturnValueMetadata {
        let mut constraints = Vec::with_capacity(self.constraints.len() + other.constraints.len());
        constraints.extend(self.constraints.iter().cloned());
        constraints.extend(other.constraints.iter().cloned());

        ReturnValueMetadata {
            ty: other.ty.clone(),
            constraints,
            cascading: self.cascading || other.cascading,
        }
    }
}

impl fmt::Display for ReturnValueMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReturnValueMetadata[type={}, constraints={}, cascading={}]",
            self.ty,
            display_constraints(&self.constraints),
            self.cascading
        )
    }
}
