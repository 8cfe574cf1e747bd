//! Folding the declaration sites of one method into a single record.
//!
//! Sites are folded root-to-leaf. The direction only affects the order in
//! which constraints are listed for diagnostics: the folded constraint *set*
//! is the same for any order, since merging is plain concatenation.
//!
//! Before any fold, every site must be parallel to the requested signature:
//! with mismatched arity a per-position union means nothing.

use crate::error::{ConfigurationError, ConfigurationErrorKind};
use crate::hierarchy::SiteGraph;
use crate::method::{DeclarationSite, MethodMetadata, MethodSignature};
use crate::types::TypeRelation;

pub struct HierarchyMerger<'r> {
    relation: &'r dyn TypeRelation,
}

impl<'r> HierarchyMerger<'r> {
    pub fn new(relation: &'r dyn TypeRelation) -> Self {
        Self { relation }
    }

    /// Fold `sites` (root-to-leaf) into the published metadata of `method`.
    ///
    /// This applies no substitution-safety rule; see
    /// [`crate::validator::ConsistencyValidator`].
    pub fn merge(
        &self,
        method: &MethodSignature,
        sites: &[DeclarationSite],
    ) -> Result<MethodMetadata, ConfigurationError> {
        let graph = SiteGraph::build(method, sites)?;
        self.check_parallel(method, &graph)?;

        let (first, rest) = sites
            .split_first()
            .ok_or_else(|| {
                ConfigurationError::new(
                    ConfigurationErrorKind::MalformedHierarchy,
                    method,
                    "no declaration sites",
                )
            })?;

        let mut merged = first.metadata.clone();
        for site in rest {
            tracing::debug!(
                method = %method,
                site = %site.declaring_type,
                "folding declaration site"
            );
            merged = merged.merge(&site.metadata).map_err(|e| {
                ConfigurationError::from_metadata(
                    method,
                    e,
                    &[first.declaring_type.as_str(), site.declaring_type.as_str()],
                )
            })?;
        }

        tracing::debug!(
            method = %method,
            sites = sites.len(),
            constrained = merged.is_constrained(),
            "merged declaration sites"
        );
        Ok(merged)
    }

    /// Every site declares the same method: same name, arity and erased
    /// parameter types as `method`, with a return type assignable to that of
    /// each site it overrides.
    pub fn check_parallel(
        &self,
        method: &MethodSignature,
        graph: &SiteGraph<'_>,
    ) -> Result<(), ConfigurationError> {
        for (i, site) in graph.sites().iter().enumerate() {
            let declared = site.metadata.signature();
            if !declared.parallel_to(method) {
                return Err(signature_mismatch(method, site));
            }

            let returned = site.metadata.return_value().ty();
            for &p in graph.parents(i) {
                let overridden = graph.sites()[p].metadata.return_value().ty();
                if !self.relation.is_assignable(returned, overridden) {
                    return Err(ConfigurationError::new(
                        ConfigurationErrorKind::IncompatibleSignature,
                        method,
                        format!(
                            "return type {returned} of {} is not assignable to {overridden} of {}",
                            site.declaring_type,
                            graph.declaring_type(p)
                        ),
                    )
                    .with_sites([site.declaring_type.as_str(), graph.declaring_type(p)]));
                }
            }
        }
        Ok(())
    }
}

/// Name the first way `site` fails to declare `method`.
fn signature_mismatch(method: &MethodSignature, site: &DeclarationSite) -> ConfigurationError {
    let declared = site.metadata.signature();
    let error = |detail: String| {
        ConfigurationError::new(ConfigurationErrorKind::IncompatibleSignature, method, detail)
            .with_sites([site.declaring_type.as_str()])
    };

    if declared.name != method.name {
        return error(format!("{} declares {declared} instead", site.declaring_type));
    }
    if declared.arity() != method.arity() {
        return error(format!(
            "{} declares {} parameters, expected {}",
            site.declaring_type,
            declared.arity(),
            method.arity()
        ));
    }
    declared
        .parameter_types
        .iter()
        .zip(&method.parameter_types)
        .enumerate()
        .find(|(_, (ours, theirs))| !ours.same_erasure(theirs))
        .map(|(index, (ours, theirs))| {
            error(format!(
                "{} declares parameter {index} as {ours}, expected {theirs}",
                site.declaring_type
            ))
            .at_parameter(index)
        })
        .unwrap_or_else(|| error(format!("{} declares {declared}", site.declaring_type)))
}
