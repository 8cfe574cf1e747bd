//! Constraint metadata for one method parameter.

use crate::constraint::{ConstraintRecord, display_constraints};
use crate::error::MetadataError;
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Immutable constraint metadata of the parameter at one position.
///
/// Constraints keep declaration order and may repeat; use
/// [`ParameterMetadata::constraint_set`] when only membership matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    #[serde(rename = "type")]
    ty: TypeRef,
    index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    constraints: Vec<Arc<ConstraintRecord>>,
    #[serde(default)]
    cascading: bool,
}

impl ParameterMetadata {
    pub fn new(
        index: usize,
        ty: TypeRef,
        name: Option<String>,
        constraints: Vec<Arc<ConstraintRecord>>,
        cascading: bool,
    ) -> Self {
        Self {
            ty,
            index,
            name,
            constraints,
            cascading,
        }
    }

    /// An unconstrained, non-cascading parameter: the identity for `merge`.
    pub fn empty_at(index: usize, ty: TypeRef) -> Self {
        Self::new(index, ty, None, Vec::new(), false)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
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

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn constraints(&self) -> &[Arc<ConstraintRecord>] {
        &self.constraints
    }

    pub fn is_cascading(&self) -> bool {
        self.cascading
    }

    /// Whether validation has anything to do for this parameter: at least
    /// one constraint, or a cascaded validation of the value itself.
    pub fn is_constrained(&self) -> bool {
        self.cascading || !self.constraints.is_empty()
    }

    pub fn constraint_set(&self) -> BTreeSet<&ConstraintRecord> {
        self.constraints.iter().map(Arc::as_ref).collect()
    }

    /// Combine with the metadata of the same parameter declared elsewhere in
    /// the hierarchy.
    ///
    /// Neither input is touched. The result holds `self`'s constraints
    /// followed by `other`'s, and cascades if either side does.
    pub fn merge(&self, other: &ParameterMetadata) -> Result<ParameterMetadata, MetadataError> {
        if self.index != other.index {
            return Err(MetadataError::IndexMismatch {
                left: self.index,
                right: other.index,
            });
        }
        if !self.ty.same_erasure(&other.ty) {
            return Err(MetadataError::ParameterTypeMismatch {
                index: self.index,
                left: self.ty.clone(),
                right: other.ty.clone(),
            });
        }

        let mut constraints = Vec::with_capacity(self.constraints.len() + other.constraints.len());
        constraints.extend(self.constraints.iter().cloned());
        constraints.extend(other.constraints.iter().cloned());

        Ok(ParameterMetadata {
            ty: self.ty.clone(),
            index: self.index,
            name: self.name.clone().or_else(|| other.name.clone()),
            constraints,
            cascading: self.cascading || other.cascading,
        })
    }
}

impl fmt::Display for ParameterMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ParameterMetadata[type={}, index={}, name={}, constraints={}, cascading={}]",
            self.ty,
            self.index,
            self.name.as_deref().unwrap_or("-"),
            display_constraints(&self.constraints),
            self.cascading
        )
    }
}
