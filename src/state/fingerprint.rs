//! Deterministic fingerprinting of recorded objects.
//!
//! This module provides stable hashing of resource instance objects so the
//! refresh pipeline can detect attribute drift between the recorded snapshot
//! and what the provider reports, without diffing attribute trees.

use sha2::{Digest, Sha256};

use super::types::ResourceInstanceObject;

/// Hasher for computing object fingerprints.
#[derive(Debug, Default)]
pub struct ObjectFingerprinter;

impl ObjectFingerprinter {
    /// Creates a new object fingerprinter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a fingerprint of an object's identity-bearing fields.
    ///
    /// Refresh timestamps are metadata, not identity, and are excluded so
    /// that re-verifying an unchanged object keeps its fingerprint stable.
    #[must_use]
    pub fn fingerprint(&self, object: &ResourceInstanceObject) -> String {
        let mut hasher = Sha256::new();

        // serde_json renders map keys in sorted order, so the attribute
        // encoding is canonical.
        hasher.update(object.attrs.to_string().as_bytes());
        hasher.update(object.status.to_string().as_bytes());

        // Dependencies (sorted for determinism)
        let mut deps: Vec<String> = object.dependencies.iter().map(ToString::to_string).collect();
        deps.sort_unstable();
        for dep in deps {
            hasher.update(dep.as_bytes());
        }

        hasher.update(object.schema_version.to_be_bytes());

        hex::encode(hasher.finalize())
    }

    /// Computes a short fingerprint (first 8 characters) for log lines.
    #[must_use]
    pub fn short_fingerprint(&self, object: &ResourceInstanceObject) -> String {
        self.fingerprint(object).chars().take(8).collect()
    }
}
