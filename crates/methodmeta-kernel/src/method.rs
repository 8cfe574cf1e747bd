//! Method signatures, per-method metadata and declaration sites.

use crate::error::MetadataError;
use crate::fingerprint::ContentHash;
use crate::parameter::ParameterMetadata;
use crate::return_value::ReturnValueMetadata;
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name plus parameter types of a method.
///
/// Ordering and equality are on the types as written; "the same method"
/// across a hierarchy is decided on erasures by [`MethodSignature::parallel_to`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSignature {
    pub name: String,
    #[serde(default)]
    pub parameter_types: Vec<TypeRef>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, parameter_types: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            parameter_types,
        }
    }

    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Same name, same arity, same erased type at every position.
    pub fn parallel_to(&self, other: &MethodSignature) -> bool {
        self.name == other.name
            && self.arity() == other.arity()
            && self
                .parameter_types
                .iter()
                .zip(&other.parameter_types)
                .all(|(a, b)| a.same_erasure(b))
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, ty) in self.parameter_types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        f.write_str(")")
    }
}

/// Immutable constraint metadata of one method.
///
/// Either the metadata of a single declaration site, or the published result
/// of folding every site of a hierarchy together. `declaring_types` lists the
/// sites whose metadata was confirmed parallel and folded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodMetadata {
    signature: MethodSignature,
    parameters: Vec<ParameterMetadata>,
    return_value: ReturnValueMetadata,
    declaring_types: Vec<String>,
    constrained: bool,
}

impl MethodMetadata {
    /// Build the metadata of one method.
    ///
    /// There must be exactly one parameter record per signature position,
    /// in order, each erasing to the signature's type at that position.
    pub fn new(
        signature: MethodSignature,
        parameters: Vec<ParameterMetadata>,
        return_value: ReturnValueMetadata,
    ) -> Result<Self, MetadataError> {
        if parameters.len() != signature.arity() {
            return Err(MetadataError::ArityMismatch {
                signature: signature.to_string(),
                expected: signature.arity(),
                actual: parameters.len(),
            });
        }
        for (position, (param, expected)) in
            parameters.iter().zip(&signature.parameter_types).enumerate()
        {
            if param.index() != position {
                return Err(MetadataError::IndexOutOfOrder {
                    position,
                    index: param.index(),
                });
            }
            if !param.ty().same_erasure(expected) {
                return Err(MetadataError::SignatureTypeMismatch {
                    index: position,
                    declared: param.ty().clone(),
                    expected: expected.clone(),
                });
            }
        }

        let constrained =
            return_value.is_constrained() || parameters.iter().any(ParameterMetadata::is_constrained);

        Ok(Self {
            signature,
            parameters,
            return_value,
            declaring_types: Vec::new(),
            constrained,
        })
    }

    /// Unconstrained metadata for a signature: every slot empty.
    pub fn unconstrained(signature: MethodSignature, return_type: TypeRef) -> Self {
        let parameters = signature
            .parameter_types
            .iter()
            .enumerate()
            .map(|(i, ty)| ParameterMetadata::empty_at(i, ty.clone()))
            .collect();
        Self {
            signature,
            parameters,
            return_value: ReturnValueMetadata::empty(return_type),
            declaring_types: Vec::new(),
            constrained: false,
        }
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn parameters(&self) -> &[ParameterMetadata] {
        &self.parameters
    }

    pub fn parameter(&self, index: usize) -> Option<&ParameterMetadata> {
        self.parameters.get(index)
    }

    pub fn return_value(&self) -> &ReturnValueMetadata {
        &self.return_value
    }

    pub fn declaring_types(&self) -> &[String] {
        &self.declaring_types
    }

    /// Any parameter or the return value is constrained.
    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    pub fn has_parameter_constraints(&self) -> bool {
        self.parameters.iter().any(ParameterMetadata::is_constrained)
    }

    pub(crate) fn with_declaring_types(mut self, declaring_types: Vec<String>) -> Self {
        self.declaring_types = declaring_types;
        self
    }

    /// Fold `other` (a more specific declaration of the same method) into a
    /// new record. Neither input is touched.
    ///
    /// The merged signature is `other`'s, as is the return type.
    pub fn merge(&self, other: &MethodMetadata) -> Result<MethodMetadata, MetadataError> {
        if self.parameters.len() != other.parameters.len() {
            return Err(MetadataError::ArityMismatch {
                signature: self.signature.to_string(),
                expected: self.parameters.len(),
                actual: other.parameters.len(),
            });
        }

        let parameters = self
            .parameters
            .iter()
            .zip(&other.parameters)
            .map(|(mine, theirs)| mine.merge(theirs))
            .collect::<Result<Vec<_>, _>>()?;
        let return_value = self.return_value.merge(&other.return_value);

        let mut declaring_types = self.declaring_types.clone();
        for ty in &other.declaring_types {
            if !declaring_types.contains(ty) {
                declaring_types.push(ty.clone());
            }
        }

        Ok(MethodMetadata {
            signature: other.signature.clone(),
            constrained: self.constrained || other.constrained,
            parameters,
            return_value,
            declaring_types,
        })
    }

    /// Order-independent fingerprint of the signature plus, per slot, the
    /// constraint set and cascade flag.
    pub fn fingerprint(&self) -> ContentHash {
        let mut builder = ContentHash::builder().field("method", &self.signature.to_string());
        for param in &self.parameters {
            builder = builder
                .field_set(
                    &format!("param:{}", param.index()),
                    param.constraint_set().iter().map(|c| c.canonical()),
                )
                .field_bool(&format!("param:{}:cascade", param.index()), param.is_cascading());
        }
        builder
            .field_set(
                "return",
                self.return_value.constraint_set().iter().map(|c| c.canonical()),
            )
            .field_bool("return:cascade", self.return_value.is_cascading())
            .finish()
    }
}

impl fmt::Display for MethodMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MethodMetadata[{}]", self.signature)?;
        for param in &self.parameters {
            writeln!(f, "  {param}")?;
        }
        write!(f, "  {}", self.return_value)
    }
}

/// Whether a declaration site is an interface or a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    Interface,
    #[default]
    Class,
}

/// One type in the hierarchy that declares or overrides the method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationSite {
    pub declaring_type: String,
    pub kind: SiteKind,
    /// Declaring types of the sites this one directly overrides. Empty for a
    /// root declaration.
    pub overrides: Vec<String>,
    pub metadata: MethodMetadata,
}

impl DeclarationSite {
    pub fn new(declaring_type: impl Into<String>, kind: SiteKind, metadata: MethodMetadata) -> Self {
        let declaring_type = declaring_type.into();
        let metadata = metadata.with_declaring_types(vec![declaring_type.clone()]);
        Self {
            declaring_type,
            kind,
            overrides: Vec::new(),
            metadata,
        }
    }

    pub fn interface(declaring_type: impl Into<String>, metadata: MethodMetadata) -> Self {
        Self::new(declaring_type, SiteKind::Interface, metadata)
    }

    pub fn class(declaring_type: impl Into<String>, metadata: MethodMetadata) -> Self {
        Self::new(declaring_type, SiteKind::Class, metadata)
    }

    pub fn overriding<I, S>(mut self, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides = ancestors.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_root(&self) -> bool {
        self.overrides.is_empty()
    }
}
