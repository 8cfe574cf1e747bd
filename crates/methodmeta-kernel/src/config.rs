//! Aggregation settings.
//!
//! The strictness level decides how parameter cascade markers are compared
//! between an override and what it inherits:
//!
//! - **Standard**: an override may not add a cascade marker, but may omit one
//!   it inherits (the merged record still cascades).
//! - **Strict**: an override must restate exactly the cascade markers it
//!   inherits.

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    #[default]
    Standard,
    Strict,
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Ok(Self::Standard),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("unknown strictness level: {s}")),
        }
    }
}

/// Settings shared by every method of one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AggregationConfig {
    pub strictness: Strictness,
}

impl AggregationConfig {
    pub fn strict() -> Self {
        Self {
            strictness: Strictness::Strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictness_parse() {
        assert_eq!("strict".parse::<Strictness>().unwrap(), Strictness::Strict);
        assert_eq!("Standard".parse::<Strictness>().unwrap(), Strictness::Standard);
        assert!("lenient".parse::<Strictness>().is_err());
    }

    #[test]
    fn config_defaults_to_standard() {
        let config: AggregationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.strictness, Strictness::Standard);
        let strict: AggregationConfig =
            serde_json::from_str(r#"{"strictness":"strict"}"#).unwrap();
        assert_eq!(strict, AggregationConfig::strict());
    }
}
