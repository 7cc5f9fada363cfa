//! Operation kinds.

use serde::{Deserialize, Serialize};

/// The kind of walk a pipeline is being evaluated under.
///
/// Pipelines declare which kinds their branches participate in; a node
/// scheduled under any other kind evaluates to a clean no-op.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Compute planned changes without touching infrastructure.
    Plan,
    /// Reconcile recorded state with real infrastructure.
    Refresh,
    /// Apply planned changes.
    Apply,
    /// Tear down managed infrastructure.
    Destroy,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            Self::Plan => "plan",
            Self::Refresh => "refresh",
            Self::Apply => "apply",
            Self::Destroy => "destroy",
        };
        write!(f, "{op}")
    }
}
