//! Core state types for resource instance objects.
//!
//! These types represent the recorded state of provisioned infrastructure,
//! used by the evaluation pipelines for refresh and destroy decisions. Each
//! resource instance has one optional "current" object plus any number of
//! "deposed" objects left behind by create-before-destroy replacements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::addrs::ResourceAddr;
use crate::error::{Result, StateError};

/// Number of hex digits in a deposed key.
const DEPOSED_KEY_LEN: usize = 8;

/// The recorded snapshot of one provisioned object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceInstanceObject {
    /// Attribute values as last reported by the provider.
    pub attrs: serde_json::Value,
    /// Health of the object.
    pub status: ObjectStatus,
    /// Addresses this object depended on when it was created.
    #[serde(default)]
    pub dependencies: Vec<ResourceAddr>,
    /// Provider schema version the attributes were written under.
    #[serde(default)]
    pub schema_version: u64,
    /// When the snapshot was last verified against real infrastructure.
    #[serde(default)]
    pub last_refreshed: Option<DateTime<Utc>>,
}

/// Health of a recorded object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStatus {
    /// The object exists and provisioning completed.
    Ready,
    /// Provisioning partially failed; the object must be replaced.
    Tainted,
}

/// Identifier for one deposed object of a resource instance.
///
/// Keys are eight lowercase hex digits, unique within the set of deposed
/// objects for a single address, and stable for the lifetime of that object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DeposedKey(String);

/// Which slot of a resource instance an operation addresses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// The live object.
    Current,
    /// A deposed object, identified by its key.
    Deposed(DeposedKey),
}

impl ResourceInstanceObject {
    /// Creates a ready object with the given attributes.
    #[must_use]
    pub const fn ready(attrs: serde_json::Value) -> Self {
        Self {
            attrs,
            status: ObjectStatus::Ready,
            dependencies: Vec::new(),
            schema_version: 0,
            last_refreshed: None,
        }
    }

    /// Creates a tainted object with the given attributes.
    #[must_use]
    pub const fn tainted(attrs: serde_json::Value) -> Self {
        Self {
            attrs,
            status: ObjectStatus::Tainted,
            dependencies: Vec::new(),
            schema_version: 0,
            last_refreshed: None,
        }
    }

    /// Sets the recorded dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<ResourceAddr>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Sets the schema version the attributes were written under.
    #[must_use]
    pub const fn with_schema_version(mut self, version: u64) -> Self {
        self.schema_version = version;
        self
    }

    /// Checks whether the object is in a healthy state.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.status, ObjectStatus::Ready)
    }

    /// Marks the snapshot as verified now.
    pub fn mark_refreshed(&mut self) {
        self.last_refreshed = Some(Utc::now());
    }
}

impl DeposedKey {
    /// Generates a fresh random key.
    ///
    /// Uniqueness within an address is the repository's responsibility; the
    /// key space is small enough that collisions must be re-rolled there.
    #[must_use]
    pub fn generate() -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self(id[..DEPOSED_KEY_LEN].to_string())
    }

    /// Parses a key from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidDeposedKey`] unless the value is exactly
    /// eight lowercase hex digits.
    pub fn parse(value: &str) -> Result<Self> {
        let valid = value.len() == DEPOSED_KEY_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(StateError::InvalidDeposedKey {
                value: value.to_string(),
            }
            .into())
        }
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Generation {
    /// Checks whether this generation addresses a deposed object.
    #[must_use]
    pub const fn is_deposed(&self) -> bool {
        matches!(self, Self::Deposed(_))
    }
}

impl std::fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            Self::Ready => "ready",
            Self::Tainted => "tainted",
        };
        write!(f, "{status}")
    }
}

impl std::fmt::Display for DeposedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Deposed(key) => write!(f, "deposed {key}"),
        }
    }
}
