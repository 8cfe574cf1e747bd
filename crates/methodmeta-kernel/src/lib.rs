//! # methodmeta kernel
//!
//! Hierarchy-aware aggregation of method contract metadata: for every method
//! of a type hierarchy, fold the parameter and return-value constraints
//! declared at each declaration site into one immutable record, and reject
//! hierarchies in which an override strengthens a precondition.
//!
//! Declaration discovery and constraint evaluation are not part of this
//! crate. Discovery hands in already-resolved [`DeclarationSite`]s, ordered
//! root-to-leaf; the published [`MethodMetadata`] is read-only from then on.
//!
//! ## Architecture
//!
//! ```text
//! ConstraintRecord        ← one applied constraint (kind + attributes)
//!     │
//! ParameterMetadata       ← per-position constraints + cascade flag
//! ReturnValueMetadata     ← same, for the return slot
//!     │
//! MethodMetadata          ← one method; DeclarationSite = one type's view
//!     │
//! HierarchyMerger         ← parallelism check, then root-to-leaf fold
//!     │
//! ConsistencyValidator    ← no strengthened or ambiguous preconditions
//!     │
//! MetadataAggregator      ← every method, independently
//! ```

pub mod aggregate;
pub mod config;
pub mod constraint;
pub mod error;
pub mod fingerprint;
pub mod hierarchy;
pub mod merger;
pub mod method;
pub mod parameter;
pub mod report;
pub mod return_value;
pub mod types;
pub mod validator;

pub use aggregate::{AggregationResults, MetadataAggregator, SitesPerMethod, aggregate};
pub use config::{AggregationConfig, Strictness};
pub use constraint::{AttributeValue, ConstraintKind, ConstraintRecord};
pub use error::{ConfigurationError, ConfigurationErrorKind, MetadataError};
pub use fingerprint::ContentHash;
pub use hierarchy::SiteGraph;
pub use merger::HierarchyMerger;
pub use method::{DeclarationSite, MethodMetadata, MethodSignature, SiteKind};
pub use parameter::ParameterMetadata;
pub use report::{AggregationReport, MethodReport};
pub use return_value::ReturnValueMetadata;
pub use types::{ErasedEquality, SubtypeTable, TypeRef, TypeRelation};
pub use validator::ConsistencyValidator;
