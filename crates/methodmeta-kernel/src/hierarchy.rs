//! The override graph between the declaration sites of one method.
//!
//! Sites arrive root-to-leaf. Each names the sites it directly overrides, so
//! every edge points to an earlier position and the graph is acyclic by
//! construction.

use crate::error::{ConfigurationError, ConfigurationErrorKind};
use crate::method::{DeclarationSite, MethodSignature};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
pub struct SiteGraph<'a> {
    sites: &'a [DeclarationSite],
    parents: Vec<Vec<usize>>,
    ancestors: Vec<BTreeSet<usize>>,
    has_children: Vec<bool>,
}

impl<'a> SiteGraph<'a> {
    /// Index the sites and check the hierarchy is well formed: non-empty,
    /// unique declaring types, every override pointing at an earlier site.
    pub fn build(
        method: &MethodSignature,
        sites: &'a [DeclarationSite],
    ) -> Result<Self, ConfigurationError> {
        if sites.is_empty() {
            return Err(ConfigurationError::new(
                ConfigurationErrorKind::MalformedHierarchy,
                method,
                "no declaration sites",
            ));
        }

        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut parents = Vec::with_capacity(sites.len());
        let mut ancestors: Vec<BTreeSet<usize>> = Vec::with_capacity(sites.len());
        let mut has_children = vec![false; sites.len()];

        for (i, site) in sites.iter().enumerate() {
            let mut direct = Vec::with_capacity(site.overrides.len());
            let mut reachable = BTreeSet::new();
            for overridden in &site.overrides {
                let Some(&p) = positions.get(overridden.as_str()) else {
                    let detail = if sites.iter().any(|s| &s.declaring_type == overridden) {
                        format!(
                            "{} overrides {overridden}, which is not declared before it",
                            site.declaring_type
                        )
                    } else {
                        format!(
                            "{} overrides {overridden}, which declares no such method",
                            site.declaring_type
                        )
                    };
                    return Err(ConfigurationError::new(
                        ConfigurationErrorKind::MalformedHierarchy,
                        method,
                        detail,
                    )
                    .with_sites([site.declaring_type.as_str(), overridden.as_str()]));
                };
                if !direct.contains(&p) {
                    direct.push(p);
                }
                has_children[p] = true;
                reachable.insert(p);
                reachable.extend(ancestors[p].iter().copied());
            }

            if positions.insert(site.declaring_type.as_str(), i).is_some() {
                return Err(ConfigurationError::new(
                    ConfigurationErrorKind::MalformedHierarchy,
                    method,
                    format!("{} is listed more than once", site.declaring_type),
                )
                .with_sites([site.declaring_type.as_str()]));
            }

            parents.push(direct);
            ancestors.push(reachable);
        }

        Ok(Self {
            sites,
            parents,
            ancestors,
            has_children,
        })
    }

    pub fn sites(&self) -> &'a [DeclarationSite] {
        self.sites
    }

    /// Positions of the sites that `site` directly overrides.
    pub fn parents(&self, site: usize) -> &[usize] {
        &self.parents[site]
    }

    /// Whether `ancestor` is reachable from `site` through overrides.
    pub fn is_ancestor(&self, ancestor: usize, site: usize) -> bool {
        self.ancestors[site].contains(&ancestor)
    }

    /// Neither site overrides the other, directly or transitively.
    pub fn unrelated(&self, a: usize, b: usize) -> bool {
        a != b && !self.is_ancestor(a, b) && !self.is_ancestor(b, a)
    }

    /// Sites nothing overrides, in declaration order.
    pub fn leaves(&self) -> Vec<usize> {
        (0..self.sites.len())
            .filter(|&i| !self.has_children[i])
            .collect()
    }

    pub fn declaring_type(&self, site: usize) -> &'a str {
        &self.sites[site].declaring_type
    }
}
