//! Serializable summary of one aggregation run.

use crate::aggregate::AggregationResults;
use crate::error::{ConfigurationError, ConfigurationErrorKind};
use crate::fingerprint::ContentHash;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    pub method_count: usize,
    pub published_count: usize,
    pub failed_count: usize,
    pub methods: Vec<MethodReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodReport {
    pub method: String,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constrained: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<ContentHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ConfigurationError>,
}

impl AggregationReport {
    pub fn from_results(results: &AggregationResults) -> Self {
        let methods: Vec<MethodReport> = results
            .iter()
            .map(|(method, outcome)| match outcome {
                Ok(metadata) => MethodReport {
                    method: method.to_string(),
                    published: true,
                    constrained: Some(metadata.is_constrained()),
                    fingerprint: Some(metadata.fingerprint()),
                    error: None,
                },
                Err(err) => MethodReport {
                    method: method.to_string(),
                    published: false,
                    constrained: None,
                    fingerprint: None,
                    error: Some(err.clone()),
                },
            })
            .collect();

        let published_count = methods.iter().filter(|m| m.published).count();
        Self {
            method_count: methods.len(),
            published_count,
            failed_count: methods.len() - published_count,
            methods,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed_count == 0
    }

    /// Failure counts per error kind.
    pub fn failures_by_kind(&self) -> BTreeMap<ConfigurationErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for err in self.methods.iter().filter_map(|m| m.error.as_ref()) {
            *counts.entry(err.kind).or_insert(0) += 1;
        }
        counts
    }
}
