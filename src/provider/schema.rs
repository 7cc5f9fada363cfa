//! Provider schema descriptions.
//!
//! A provider advertises which resource kinds it manages and the schema
//! version each kind's attributes are encoded under. Pipelines consult the
//! schema before calling into the provider so unsupported kinds fail with a
//! clear error instead of an opaque provider response.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Everything a provider advertises about the resource kinds it manages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderSchema {
    /// Supported resource kinds and their schemas.
    pub resource_types: HashMap<String, ResourceTypeSchema>,
}

/// Schema information for one resource kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceTypeSchema {
    /// Version of the attribute encoding for this kind.
    pub version: u64,
}

impl ProviderSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource kind at the given schema version.
    #[must_use]
    pub fn with_resource_type(mut self, kind: &str, version: u64) -> Self {
        self.resource_types
            .insert(kind.to_string(), ResourceTypeSchema { version });
        self
    }

    /// Looks up the schema for a resource kind.
    #[must_use]
    pub fn resource_type_schema(&self, kind: &str) -> Option<&ResourceTypeSchema> {
        self.resource_types.get(kind)
    }

    /// Checks whether the provider manages a resource kind.
    #[must_use]
    pub fn supports(&self, kind: &str) -> bool {
        self.resource_types.contains_key(kind)
    }
}
