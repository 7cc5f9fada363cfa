//! Addressing for resource instances and provider configurations.
//!
//! Every object the orchestrator tracks is filed under a [`ResourceAddr`]: the
//! module path it was declared in, its resource kind, its name, and an optional
//! per-instance index. Provider configurations are referenced through
//! [`ProviderRef`] and resolved to live gateways by the provider registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The index distinguishing one instance of a multi-instance resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceIndex {
    /// Positional index from a count-style expansion.
    Count(u64),
    /// String key from a map-style expansion.
    Key(String),
}

/// Address of a single resource instance.
///
/// This is the key under which both the current object and all deposed objects
/// of an instance are filed in the state repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceAddr {
    /// Module path segments, outermost first. Empty for the root module.
    #[serde(default)]
    pub module: Vec<String>,
    /// Resource kind (e.g., `compute_instance`).
    pub kind: String,
    /// Resource name within its module.
    pub name: String,
    /// Optional instance index for multi-instance resources.
    #[serde(default)]
    pub index: Option<InstanceIndex>,
}

/// Reference to a provider configuration.
///
/// Resolved against the provider registry to obtain a gateway handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderRef {
    /// Provider name (e.g., `compute`).
    pub name: String,
    /// Optional configuration alias (e.g., `east`).
    #[serde(default)]
    pub alias: Option<String>,
}

impl ResourceAddr {
    /// Creates an address for a single-instance resource in the root module.
    #[must_use]
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            module: Vec::new(),
            kind: kind.to_string(),
            name: name.to_string(),
            index: None,
        }
    }

    /// Sets the module path.
    #[must_use]
    pub fn with_module<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module = segments.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a positional instance index.
    #[must_use]
    pub fn with_count_index(mut self, index: u64) -> Self {
        self.index = Some(InstanceIndex::Count(index));
        self
    }

    /// Sets a string instance key.
    #[must_use]
    pub fn with_key_index(mut self, key: &str) -> Self {
        self.index = Some(InstanceIndex::Key(key.to_string()));
        self
    }

    /// Returns true if the resource lives in the root module.
    #[must_use]
    pub fn is_root_module(&self) -> bool {
        self.module.is_empty()
    }
}

impl ProviderRef {
    /// Creates a reference to a provider's default configuration.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
        }
    }

    /// Sets the configuration alias.
    #[must_use]
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }
}

impl fmt::Display for InstanceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(i) => write!(f, "[{i}]"),
            Self::Key(k) => write!(f, "[{k:?}]"),
        }
    }
}

impl fmt::Display for ResourceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.module {
            write!(f, "module.{segment}.")?;
        }
        write!(f, "{}.{}", self.kind, self.name)?;
        if let Some(index) = &self.index {
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}.{alias}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
