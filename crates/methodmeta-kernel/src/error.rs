//! Error types for metadata construction, merging and hierarchy validation.

use crate::method::MethodSignature;
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};

/// Precondition failures raised by the record types themselves.
///
/// These carry no method context; the merger lifts them into a
/// [`ConfigurationError`] naming the method and the sites involved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    /// Two parameter records for different positions were merged.
    #[error("parameter index mismatch: {left} vs {right}")]
    IndexMismatch { left: usize, right: usize },

    /// The same position carries different erased types.
    #[error("parameter {index} type mismatch: {left} vs {right}")]
    ParameterTypeMismatch {
        index: usize,
        left: TypeRef,
        right: TypeRef,
    },

    /// Parameter count does not match the signature arity.
    #[error("arity mismatch: signature {signature} expects {expected} parameters, got {actual}")]
    ArityMismatch {
        signature: String,
        expected: usize,
        actual: usize,
    },

    /// A parameter record sits at the wrong position of its method.
    #[error("parameter at position {position} declares index {index}")]
    IndexOutOfOrder { position: usize, index: usize },

    /// A parameter's declared type disagrees with the method signature.
    #[error("parameter {index} declared as {declared} but signature has {expected}")]
    SignatureTypeMismatch {
        index: usize,
        declared: TypeRef,
        expected: TypeRef,
    },
}

/// Which configuration rule a method's declaration sites violated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationErrorKind {
    /// Arity or per-position type mismatch across declaration sites.
    IncompatibleSignature,
    /// An override added a parameter constraint or cascade marker.
    ParameterConstraintStrengthened,
    /// Sibling ancestors disagree and nothing restates their union.
    AmbiguousParameterConstraints,
    /// An override dropped an inherited parameter cascade marker (strict mode).
    ParameterCascadeMismatch,
    /// The site list is empty, repeats a type, or overrides a later site.
    MalformedHierarchy,
}

impl std::fmt::Display for ConfigurationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::IncompatibleSignature => "incompatible signature",
            Self::ParameterConstraintStrengthened => "parameter constraint strengthened",
            Self::AmbiguousParameterConstraints => "ambiguous parameter constraints",
            Self::ParameterCascadeMismatch => "parameter cascade mismatch",
            Self::MalformedHierarchy => "malformed hierarchy",
        };
        f.write_str(label)
    }
}

/// A configuration-time failure for one method.
///
/// Never recovered from inside the kernel: the build orchestrator reports it
/// as a startup failure (or not) as it sees fit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind} in {method}: {detail}")]
pub struct ConfigurationError {
    pub kind: ConfigurationErrorKind,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
    pub sites: Vec<String>,
    pub detail: String,
}

impl ConfigurationError {
    pub fn new(
        kind: ConfigurationErrorKind,
        method: &MethodSignature,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            method: method.to_string(),
            parameter: None,
            constraint: None,
            sites: Vec::new(),
            detail: detail.into(),
        }
    }

    pub fn at_parameter(mut self, index: usize) -> Self {
        self.parameter = Some(index);
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn with_sites<I, S>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sites = sites.into_iter().map(Into::into).collect();
        self
    }

    /// Lift a record-level failure into an incompatible-signature error.
    pub(crate) fn from_metadata(
        method: &MethodSignature,
        error: MetadataError,
        sites: &[&str],
    ) -> Self {
        let parameter = match &error {
            MetadataError::IndexMismatch { left, .. } => Some(*left),
            MetadataError::ParameterTypeMismatch { index, .. }
            | MetadataError::SignatureTypeMismatch { index, .. } => Some(*index),
            MetadataError::IndexOutOfOrder { position, .. } => Some(*position),
            MetadataError::ArityMismatch { .. } => None,
        };
        let mut lifted = Self::new(
            ConfigurationErrorKind::IncompatibleSignature,
            method,
            error.to_string(),
        )
        .with_sites(sites.iter().copied());
        lifted.parameter = parameter;
        lifted
    }
}
