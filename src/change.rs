//! Computed resource-instance transitions.
//!
//! Diff computation is delegated to the provider gateway; this module only
//! defines the change vocabulary the pipeline carries from the diff step to
//! the apply step. The deposed lifecycle only ever constructs
//! [`ChangeAction::Delete`] changes, but the full action set is part of the
//! orchestrator's wire vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::addrs::ResourceAddr;
use crate::state::DeposedKey;

/// The action a change asks the provider to perform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// No action required.
    NoOp,
    /// Create a new object.
    Create,
    /// Update the object in place.
    Update,
    /// Destroy the object.
    Delete,
}

/// A computed transition for one resource instance object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceInstanceChange {
    /// Address of the resource instance.
    pub addr: ResourceAddr,
    /// Deposed key, when the change targets a deposed object rather than the
    /// current one.
    #[serde(default)]
    pub deposed_key: Option<DeposedKey>,
    /// The action to perform.
    pub action: ChangeAction,
    /// Attribute values before the change (JSON null when creating).
    pub before: Value,
    /// Attribute values after the change (JSON null when destroying).
    pub after: Value,
}

impl ChangeAction {
    /// Returns true if this action removes the object.
    #[must_use]
    pub const fn is_destroy(self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl ResourceInstanceChange {
    /// Creates a destroy change for the given object attributes.
    #[must_use]
    pub const fn destroy(addr: ResourceAddr, deposed_key: Option<DeposedKey>, before: Value) -> Self {
        Self {
            addr,
            deposed_key,
            action: ChangeAction::Delete,
            before,
            after: Value::Null,
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ResourceInstanceChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.addr)?;
        if let Some(key) = &self.deposed_key {
            write!(f, " (deposed {key})")?;
        }
        write!(f, ": {}", self.action)
    }
}
