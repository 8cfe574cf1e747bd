//! The hierarchy document: JSON input handed over by declaration discovery.
//!
//! ```json
//! {
//!   "subtypes": { "java.lang.Integer": ["java.lang.Number"] },
//!   "methods": [{
//!     "name": "f",
//!     "parameterTypes": ["java.lang.Object"],
//!     "returnType": "int",
//!     "sites": [{
//!       "declaringType": "I",
//!       "kind": "interface",
//!       "parameters": [{ "name": "x", "constraints": [{ "kind": "NotNull" }] }]
//!     }]
//!   }]
//! }
//! ```
//!
//! A site may restate `name`, `parameterTypes` or `returnType` to declare a
//! signature that differs from the method's; omitted `parameters` means
//! every position is unconstrained.

use methodmeta_kernel::{
    ConstraintRecord, DeclarationSite, MetadataError, MethodMetadata, MethodSignature,
    ParameterMetadata, ReturnValueMetadata, SiteKind, SitesPerMethod, SubtypeTable, TypeRef,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HierarchyDocument {
    #[serde(default)]
    pub subtypes: BTreeMap<String, Vec<String>>,
    pub methods: Vec<MethodEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MethodEntry {
    pub name: String,
    #[serde(default)]
    pub parameter_types: Vec<TypeRef>,
    #[serde(default = "void_type")]
    pub return_type: TypeRef,
    pub sites: Vec<SiteEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SiteEntry {
    pub declaring_type: String,
    #[serde(default)]
    pub kind: SiteKind,
    #[serde(default)]
    pub overrides: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parameter_types: Option<Vec<TypeRef>>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub parameters: Option<Vec<SlotEntry>>,
    #[serde(default)]
    pub return_value: Option<SlotEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SlotEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub constraints: Vec<ConstraintRecord>,
    #[serde(default)]
    pub cascading: bool,
}

fn void_type() -> TypeRef {
    TypeRef::new("void")
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("method {method}, site {site}: {source}")]
    Site {
        method: String,
        site: String,
        #[source]
        source: MetadataError,
    },
    #[error("method {method} is listed more than once")]
    DuplicateMethod { method: String },
}

/// Shares one allocation between identical constraint records.
#[derive(Default)]
struct Interner {
    records: HashMap<ConstraintRecord, Arc<ConstraintRecord>>,
}

impl Interner {
    fn intern(&mut self, record: ConstraintRecord) -> Arc<ConstraintRecord> {
        self.records
            .entry(record)
            .or_insert_with_key(|r| Arc::new(r.clone()))
            .clone()
    }

    fn intern_all(&mut self, records: Vec<ConstraintRecord>) -> Vec<Arc<ConstraintRecord>> {
        records.into_iter().map(|r| self.intern(r)).collect()
    }
}

impl HierarchyDocument {
    pub fn subtype_table(&self) -> SubtypeTable {
        let mut table = SubtypeTable::new();
        for (sub, sups) in &self.subtypes {
            for sup in sups {
                table.declare(sub.clone(), sup.clone());
            }
        }
        table
    }

    /// Resolve into per-method declaration sites keyed by the method's own
    /// signature.
    pub fn into_sites(self) -> Result<SitesPerMethod, DocumentError> {
        let mut interner = Interner::default();
        let mut out = SitesPerMethod::new();

        for method in self.methods {
            let signature = MethodSignature::new(method.name.clone(), method.parameter_types.clone());
            if out.contains_key(&signature) {
                return Err(DocumentError::DuplicateMethod {
                    method: signature.to_string(),
                });
            }
            let mut sites = Vec::with_capacity(method.sites.len());

            for site in method.sites {
                let declared = MethodSignature::new(
                    site.name.clone().unwrap_or_else(|| method.name.clone()),
                    site.parameter_types
                        .clone()
                        .unwrap_or_else(|| method.parameter_types.clone()),
                );
                let return_type = site
                    .return_type
                    .clone()
                    .unwrap_or_else(|| method.return_type.clone());

                let metadata = match site.parameters {
                    None if site.return_value.is_none() => {
                        MethodMetadata::unconstrained(declared, return_type)
                    }
                    parameters => {
                        let parameters = match parameters {
                            Some(slots) => slots
                                .into_iter()
                                .enumerate()
                                .map(|(i, slot)| {
                                    let ty = declared
                                        .parameter_types
                                        .get(i)
                                        .cloned()
                                        .unwrap_or_else(|| TypeRef::new("?"));
                                    ParameterMetadata::new(
                                        i,
                                        ty,
                                        slot.name,
                                        interner.intern_all(slot.constraints),
                                        slot.cascading,
                                    )
                                })
                                .collect(),
                            None => declared
                                .parameter_types
                                .iter()
                                .enumerate()
                                .map(|(i, ty)| ParameterMetadata::empty_at(i, ty.clone()))
                                .collect(),
                        };
                        let ret = site.return_value.unwrap_or_default();
                        let return_value = ReturnValueMetadata::new(
                            return_type,
                            interner.intern_all(ret.constraints),
                            ret.cascading,
                        );
                        MethodMetadata::new(declared, parameters, return_value).map_err(
                            |source| DocumentError::Site {
                                method: signature.to_string(),
                                site: site.declaring_type.clone(),
                                source,
                            },
                        )?
                    }
                };

                sites.push(
                    DeclarationSite::new(site.declaring_type, site.kind, metadata)
                        .overriding(site.overrides),
                );
            }

            out.insert(signature, sites);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "methods": [{
            "name": "f",
            "parameterTypes": ["java.lang.Object"],
            "returnType": "int",
            "sites": [
                {
                    "declaringType": "I",
                    "kind": "interface",
                    "parameters": [{ "name": "x", "constraints": [{ "kind": "NotNull" }] }]
                },
                {
                    "declaringType": "C",
                    "overrides": ["I"],
                    "parameters": [{ "constraints": [{ "kind": "NotNull" }] }],
                    "returnValue": {
                        "constraints": [{ "kind": "Min", "attributes": { "value": { "int": 1 } } }]
                    }
                }
            ]
        }]
    }"#;

    #[test]
    fn resolves_sites_and_shares_identical_records() {
        let doc: HierarchyDocument = serde_json::from_str(DOC).unwrap();
        let sites = doc.into_sites().unwrap();
        let (signature, sites) = sites.into_iter().next().unwrap();
        assert_eq!(signature.to_string(), "f(java.lang.Object)");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].kind, SiteKind::Interface);
        assert_eq!(sites[1].overrides, vec!["I"]);

        let first = &sites[0].metadata.parameters()[0].constraints()[0];
        let second = &sites[1].metadata.parameters()[0].constraints()[0];
        assert!(Arc::ptr_eq(first, second));
        assert_eq!(
            sites[1].metadata.return_value().constraints()[0].to_string(),
            "Min(value=1)"
        );
    }

    #[test]
    fn wrong_slot_count_is_a_document_error() {
        let doc: HierarchyDocument = serde_json::from_str(
            r#"{"methods":[{"name":"f","parameterTypes":["A"],"sites":[
                {"declaringType":"C","parameters":[{},{}]}
            ]}]}"#,
        )
        .unwrap();
        let err = doc.into_sites().unwrap_err();
        match err {
            DocumentError::Site { site, source, .. } => {
                assert_eq!(site, "C");
                assert!(matches!(source, MetadataError::ArityMismatch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn repeated_method_entry_is_rejected() {
        let doc: HierarchyDocument = serde_json::from_str(
            r#"{"methods":[
                {"name":"f","parameterTypes":["A"],"sites":[
                    {"declaringType":"I","kind":"interface"},
                    {"declaringType":"C","overrides":["I"],
                     "parameters":[{"constraints":[{"kind":"NotNull"}]}]}
                ]},
                {"name":"f","parameterTypes":["A"],"sites":[{"declaringType":"D"}]}
            ]}"#,
        )
        .unwrap();
        let err = doc.into_sites().unwrap_err();
        assert!(matches!(
            &err,
            DocumentError::DuplicateMethod { method } if method == "f(A)"
        ));
        assert_eq!(err.to_string(), "method f(A) is listed more than once");
    }

    #[test]
    fn omitted_slots_are_unconstrained() {
        let doc: HierarchyDocument = serde_json::from_str(
            r#"{"methods":[{"name":"f","parameterTypes":["A","B"],"sites":[{"declaringType":"C"}]}]}"#,
        )
        .unwrap();
        let sites = doc.into_sites().unwrap();
        let site = &sites.values().next().unwrap()[0];
        assert_eq!(site.metadata.parameters().len(), 2);
        assert!(!site.metadata.is_constrained());
        assert_eq!(site.metadata.return_value().ty(), &TypeRef::new("void"));
    }
}
