//! Content-addressed fingerprints of published metadata.
//!
//! Two merged records with the same fingerprint carry the same constraint
//! sets and cascade flags for every slot, whatever order their declaration
//! sites were folded in. Constraints enter the hash through
//! [`ConstraintRecord::canonical`](crate::constraint::ConstraintRecord::canonical),
//! never through their display form.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 content hash, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn builder() -> ContentHashBuilder {
        ContentHashBuilder {
            hasher: Sha256::new(),
        }
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incremental hash over named, length-delimited fields.
///
/// Every value is prefixed with its byte length, so no choice of field
/// contents can make two different field sequences hash alike.
pub struct ContentHashBuilder {
    hasher: Sha256,
}

impl ContentHashBuilder {
    fn chunk(&mut self, bytes: &[u8]) {
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.chunk(name.as_bytes());
        self.chunk(value.as_bytes());
        self
    }

    pub fn field_bool(self, name: &str, value: bool) -> Self {
        self.field(name, if value { "true" } else { "false" })
    }

    /// Hash an already ordered collection as one field.
    pub fn field_set<I, S>(mut self, name: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<S> = items.into_iter().collect();
        self.chunk(name.as_bytes());
        self.hasher.update((items.len() as u64).to_le_bytes());
        for item in &items {
            self.chunk(item.as_ref().as_bytes());
        }
        self
    }

    pub fn finish(self) -> ContentHash {
        let hash = self.hasher.finalize();
        ContentHash(format!("{hash:x}"))
    }
}
