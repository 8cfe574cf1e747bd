//! Substitution-safety checks over the declaration sites of one method.
//!
//! Callers bound to an ancestor type must not see stronger preconditions
//! when the call dispatches to an override:
//!
//! - an override's own parameter constraints and cascade markers must be
//!   contained in what it inherits from the sites it overrides;
//! - where unrelated ancestors disagree about a parameter, the override
//!   must restate their union, otherwise the effective precondition depends
//!   on which ancestor the caller is bound to;
//! - return values are unrestricted: postconditions only accumulate.
//!
//! What a site inherits at a position is the union of the effective
//! declarations (own plus inherited) of every site it directly overrides.

use crate::config::Strictness;
use crate::constraint::ConstraintRecord;
use crate::error::{ConfigurationError, ConfigurationErrorKind};
use crate::hierarchy::SiteGraph;
use crate::method::{DeclarationSite, MethodSignature};
use std::collections::BTreeSet;

/// Effective parameter declarations of one site at one position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Slot<'a> {
    constraints: BTreeSet<&'a ConstraintRecord>,
    cascading: bool,
}

impl<'a> Slot<'a> {
    fn absorb(&mut self, other: &Slot<'a>) {
        self.constraints.extend(other.constraints.iter().copied());
        self.cascading |= other.cascading;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyValidator {
    strictness: Strictness,
}

impl ConsistencyValidator {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Fail on the first violation, in site order then parameter order.
    pub fn validate(
        &self,
        method: &MethodSignature,
        sites: &[DeclarationSite],
    ) -> Result<(), ConfigurationError> {
        match self.violations(method, sites).into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }

    /// Every violation, in site order then parameter order, followed by
    /// disagreements between unresolved leaf sites.
    pub fn violations(
        &self,
        method: &MethodSignature,
        sites: &[DeclarationSite],
    ) -> Vec<ConfigurationError> {
        let graph = match SiteGraph::build(method, sites) {
            Ok(graph) => graph,
            Err(err) => return vec![err],
        };

        let arity = method.arity();
        if let Some(site) = sites.iter().find(|s| s.metadata.parameters().len() != arity) {
            return vec![
                ConfigurationError::new(
                    ConfigurationErrorKind::IncompatibleSignature,
                    method,
                    format!(
                        "{} declares {} parameters, expected {arity}",
                        site.declaring_type,
                        site.metadata.parameters().len()
                    ),
                )
                .with_sites([site.declaring_type.as_str()]),
            ];
        }

        let mut violations = Vec::new();
        // effective[site][position]
        let mut effective: Vec<Vec<Slot<'_>>> = Vec::with_capacity(sites.len());

        for (s, site) in sites.iter().enumerate() {
            let mut row = Vec::with_capacity(arity);
            for index in 0..arity {
                let own_param = &site.metadata.parameters()[index];
                let own = Slot {
                    constraints: own_param.constraint_set(),
                    cascading: own_param.is_cascading(),
                };

                let mut inherited = Slot::default();
                for &p in graph.parents(s) {
                    inherited.absorb(&effective[p][index]);
                }

                if !site.is_root() {
                    self.check_override(
                        method, &graph, s, index, &own, &inherited, &effective, &mut violations,
                    );
                }

                let mut slot = own;
                slot.absorb(&inherited);
                row.push(slot);
            }
            effective.push(row);
        }

        let leaves = graph.leaves();
        for index in 0..arity {
            for (a_pos, &a) in leaves.iter().enumerate() {
                for &b in &leaves[a_pos + 1..] {
                    if effective[a][index] != effective[b][index] {
                        violations.push(
                            ConfigurationError::new(
                                ConfigurationErrorKind::AmbiguousParameterConstraints,
                                method,
                                format!(
                                    "{} and {} declare parameter {index} differently and no \
                                     declaration overrides both",
                                    graph.declaring_type(a),
                                    graph.declaring_type(b)
                                ),
                            )
                            .at_parameter(index)
                            .with_sites([graph.declaring_type(a), graph.declaring_type(b)]),
                        );
                    }
                }
            }
        }

        if !violations.is_empty() {
            tracing::debug!(
                method = %method,
                count = violations.len(),
                "hierarchy violates substitution safety"
            );
        }
        violations
    }

    #[allow(clippy::too_many_arguments)]
    fn check_override<'a>(
        &self,
        method: &MethodSignature,
        graph: &SiteGraph<'a>,
        site: usize,
        index: usize,
        own: &Slot<'a>,
        inherited: &Slot<'a>,
        effective: &[Vec<Slot<'a>>],
        violations: &mut Vec<ConfigurationError>,
    ) {
        let parents = graph.parents(site);
        let site_name = graph.declaring_type(site);
        let involved: Vec<&str> = std::iter::once(site_name)
            .chain(parents.iter().map(|&p| graph.declaring_type(p)))
            .collect();

        for added in own.constraints.difference(&inherited.constraints) {
            violations.push(
                ConfigurationError::new(
                    ConfigurationErrorKind::ParameterConstraintStrengthened,
                    method,
                    format!(
                        "{site_name} adds {added} to parameter {index}, which the overridden \
                         declaration does not have"
                    ),
                )
                .at_parameter(index)
                .with_constraint(added.to_string())
                .with_sites(involved.iter().copied()),
            );
        }
        if own.cascading && !inherited.cascading {
            violations.push(
                ConfigurationError::new(
                    ConfigurationErrorKind::ParameterConstraintStrengthened,
                    method,
                    format!(
                        "{site_name} marks parameter {index} for cascaded validation, which the \
                         overridden declaration does not"
                    ),
                )
                .at_parameter(index)
                .with_constraint("cascade")
                .with_sites(involved.iter().copied()),
            );
        }

        let restates_union = own.constraints.is_superset(&inherited.constraints)
            && (own.cascading || !inherited.cascading);
        if !restates_union {
            'pairs: for (i, &a) in parents.iter().enumerate() {
                for &b in &parents[i + 1..] {
                    if graph.unrelated(a, b) && effective[a][index] != effective[b][index] {
                        violations.push(
                            ConfigurationError::new(
                                ConfigurationErrorKind::AmbiguousParameterConstraints,
                                method,
                                format!(
                                    "{} and {} declare parameter {index} differently and \
                                     {site_name} does not restate their union",
                                    graph.declaring_type(a),
                                    graph.declaring_type(b)
                                ),
                            )
                            .at_parameter(index)
                            .with_sites([
                                site_name,
                                graph.declaring_type(a),
                                graph.declaring_type(b),
                            ]),
                        );
                        break 'pairs;
                    }
                }
            }
        }

        if self.strictness == Strictness::Strict && inherited.cascading && !own.cascading {
            violations.push(
                ConfigurationError::new(
                    ConfigurationErrorKind::ParameterCascadeMismatch,
                    method,
                    format!(
                        "{site_name} drops the inherited cascade marker of parameter {index}"
                    ),
                )
                .at_parameter(index)
                .with_constraint("cascade")
                .with_sites(involved.iter().copied()),
            );
        }
    }
}
