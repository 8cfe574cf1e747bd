//! Building the published metadata of every method.
//!
//! Each method is merged and validated independently: a configuration error
//! in one method never keeps the others from being published. Methods share
//! no mutable state, so a caller may fan them out across threads with
//! [`MetadataAggregator::aggregate_method`]; within one method the fold is
//! sequential.

use crate::config::AggregationConfig;
use crate::error::ConfigurationError;
use crate::merger::HierarchyMerger;
use crate::method::{DeclarationSite, MethodMetadata, MethodSignature};
use crate::types::{ErasedEquality, TypeRelation};
use crate::validator::ConsistencyValidator;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Declaration sites (root-to-leaf) per method.
pub type SitesPerMethod = BTreeMap<MethodSignature, Vec<DeclarationSite>>;

/// Outcome per method.
pub type AggregationResults = BTreeMap<MethodSignature, Result<MethodMetadata, ConfigurationError>>;

#[derive(Clone)]
pub struct MetadataAggregator {
    config: AggregationConfig,
    relation: Arc<dyn TypeRelation>,
}

impl Default for MetadataAggregator {
    fn default() -> Self {
        Self::new(AggregationConfig::default())
    }
}

impl std::fmt::Debug for MetadataAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataAggregator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MetadataAggregator {
    /// An aggregator that treats types as assignable only when they erase
    /// identically.
    pub fn new(config: AggregationConfig) -> Self {
        Self {
            config,
            relation: Arc::new(ErasedEquality),
        }
    }

    /// Use `relation` to decide covariant return types.
    pub fn with_type_relation(mut self, relation: Arc<dyn TypeRelation>) -> Self {
        self.relation = relation;
        self
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Merge then validate one method. Nothing is returned for a method
    /// whose hierarchy violates a rule.
    pub fn aggregate_method(
        &self,
        method: &MethodSignature,
        sites: &[DeclarationSite],
    ) -> Result<MethodMetadata, ConfigurationError> {
        let outcome = HierarchyMerger::new(self.relation.as_ref())
            .merge(method, sites)
            .and_then(|merged| {
                ConsistencyValidator::new(self.config.strictness)
                    .validate(method, sites)
                    .map(|()| merged)
            });

        match &outcome {
            Ok(merged) => tracing::debug!(
                method = %method,
                parameter_constraints = merged.has_parameter_constraints(),
                fingerprint = %merged.fingerprint(),
                "published method metadata"
            ),
            Err(err) => tracing::warn!(
                method = %method,
                kind = ?err.kind,
                "rejected method metadata: {}",
                err.detail
            ),
        }
        outcome
    }

    /// All violations of one method, for diagnostics. Signature failures
    /// stop the check early since nothing else is meaningful past them.
    pub fn diagnose_method(
        &self,
        method: &MethodSignature,
        sites: &[DeclarationSite],
    ) -> Vec<ConfigurationError> {
        if let Err(err) = HierarchyMerger::new(self.relation.as_ref()).merge(method, sites) {
            return vec![err];
        }
        ConsistencyValidator::new(self.config.strictness).violations(method, sites)
    }

    pub fn aggregate(&self, sites_per_method: &SitesPerMethod) -> AggregationResults {
        sites_per_method
            .iter()
            .map(|(method, sites)| (method.clone(), self.aggregate_method(method, sites)))
            .collect()
    }
}

/// Aggregate with the default configuration.
pub fn aggregate(sites_per_method: &SitesPerMethod) -> AggregationResults {
    MetadataAggregator::default().aggregate(sites_per_method)
}
