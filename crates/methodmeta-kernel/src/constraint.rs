//! Applied constraints.
//!
//! A [`ConstraintRecord`] names one constraint applied to a parameter or a
//! return value, together with its static attributes. Records are produced
//! by the descriptor model upstream; the kernel only compares, orders and
//! shares them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Fully qualified type tag of a constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintKind(pub String);

impl ConstraintKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Last `.`-separated segment, used for display.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static attribute value of a constraint.
///
/// Decimal bounds travel as `Str`, exactly as they are declared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Type(String),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Unambiguous rendering that keeps the variant: `Int(1)` and
    /// `Type("1")` differ here while both display as `1`.
    fn write_canonical(&self, out: &mut String) {
        match self {
            Self::Bool(b) => out.push_str(if *b { "bool:true" } else { "bool:false" }),
            Self::Int(i) => out.push_str(&format!("int:{i}")),
            Self::Str(s) => out.push_str(&format!("str:{s:?}")),
            Self::Type(t) => out.push_str(&format!("type:{t:?}")),
            Self::List(items) => {
                out.push_str(&format!("list:{}[", items.len()));
                for item in items {
                    item.write_canonical(out);
                    out.push(';');
                }
                out.push(']');
            }
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Type(t) => write!(f, "{t}"),
            Self::List(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// One applied constraint. Identity is the kind plus the attribute set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintRecord {
    pub kind: ConstraintKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl ConstraintRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: ConstraintKind::new(kind),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Identity-preserving rendering for hashing: fully qualified kind plus
    /// every attribute with its value variant. Equal records, and only
    /// those, render equally.
    pub fn canonical(&self) -> String {
        let mut out = format!("{:?}", self.kind.0);
        for (name, value) in &self.attributes {
            out.push_str(&format!(" {name:?}="));
            value.write_canonical(&mut out);
        }
        out
    }

    /// Wrap for sharing between per-site and merged records.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl fmt::Display for ConstraintRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.simple_name())?;
        if self.attributes.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, (name, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

/// Render a constraint sequence as `[A, B(x=1)]`.
pub(crate) fn display_constraints(constraints: &[Arc<ConstraintRecord>]) -> String {
    let names: Vec<String> = constraints.iter().map(ToString::to_string).collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_kind_plus_attributes() {
        let a = ConstraintRecord::new("javax.validation.constraints.Min")
            .with_attribute("value", AttributeValue::Int(1));
        let b = ConstraintRecord::new("javax.validation.constraints.Min")
            .with_attribute("value", AttributeValue::Int(1));
        let c = ConstraintRecord::new("javax.validation.constraints.Min")
            .with_attribute("value", AttributeValue::Int(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_uses_simple_name() {
        let record = ConstraintRecord::new("javax.validation.constraints.Size")
            .with_attribute("min", AttributeValue::Int(1))
            .with_attribute("max", AttributeValue::Int(8));
        insta::assert_snapshot!(record.to_string(), @"Size(max=8, min=1)");
        assert_eq!(ConstraintRecord::new("NotNull").to_string(), "NotNull");
    }

    #[test]
    fn list_attributes_render_braced() {
        let record = ConstraintRecord::new("Pattern").with_attribute(
            "groups",
            AttributeValue::List(vec![
                AttributeValue::Type("Default".into()),
                AttributeValue::Type("Strict".into()),
            ]),
        );
        assert_eq!(record.to_string(), "Pattern(groups={Default, Strict})");
    }

    #[test]
    fn canonical_form_keeps_what_display_drops() {
        let javax = ConstraintRecord::new("javax.validation.constraints.NotNull");
        let acme = ConstraintRecord::new("com.acme.NotNull");
        assert_eq!(javax.to_string(), acme.to_string());
        assert_ne!(javax.canonical(), acme.canonical());

        let int = ConstraintRecord::new("Min").with_attribute("value", AttributeValue::Int(1));
        let ty = ConstraintRecord::new("Min").with_attribute("value", AttributeValue::Type("1".into()));
        let text = ConstraintRecord::new("Min").with_attribute("value", AttributeValue::Str("1".into()));
        assert_eq!(int.to_string(), ty.to_string());
        assert_ne!(int.canonical(), ty.canonical());
        assert_ne!(int.canonical(), text.canonical());
        assert_eq!(int.canonical(), int.clone().canonical());
    }

    #[test]
    fn deserialization_rejects_unknown_fields() {
        let parsed: ConstraintRecord =
            serde_json::from_str(r#"{"kind":"Min","attributes":{"value":{"int":1}}}"#).unwrap();
        assert_eq!(parsed.attributes["value"], AttributeValue::Int(1));

        let typo = serde_json::from_str::<ConstraintRecord>(
            r#"{"kind":"Min","attribute":{"value":{"int":1}}}"#,
        );
        assert!(typo.is_err());
    }
}
