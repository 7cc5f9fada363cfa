//! Error types for the strata execution core.
//!
//! Errors fall into the three classes the pipeline distinguishes: repository
//! errors (fatal to the invocation, since no further step can proceed
//! without a known state baseline), provider errors (captured, deferred
//! until the mandatory final state write, then surfaced), and invariant
//! violations (immediate, never retried). The [`StrataError::Node`] variant
//! annotates a pipeline error with the resource address and deposed key at
//! the graph-node boundary.

use thiserror::Error;

use crate::addrs::{ProviderRef, ResourceAddr};
use crate::state::DeposedKey;

/// The main error type for the strata execution core.
#[derive(Debug, Error)]
pub enum StrataError {
    /// State repository errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Provider gateway errors.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Structural invariant violations.
    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantError),

    /// A pipeline error annotated with the node it came from.
    #[error("{}: {}", node_label(.addr, .deposed_key), .source)]
    Node {
        /// Address of the resource instance the node operates on.
        addr: ResourceAddr,
        /// Deposed key, when the node targets a deposed object.
        deposed_key: Option<DeposedKey>,
        /// The underlying pipeline error.
        source: Box<StrataError>,
    },
}

/// State repository errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// The backing store failed to serve a read or write.
    #[error("state backend failure: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },

    /// An object could not be serialized or deserialized.
    #[error("state serialization failure: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// A deposed key string did not have the expected form.
    #[error("invalid deposed key {value:?}: expected 8 lowercase hex digits")]
    InvalidDeposedKey {
        /// The rejected key string.
        value: String,
    },
}

/// Provider gateway errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No gateway is registered for the referenced provider configuration.
    #[error("no provider registered for {provider}")]
    Unregistered {
        /// The unresolved provider reference.
        provider: ProviderRef,
    },

    /// The provider's schema does not include the requested resource kind.
    #[error("provider {provider} does not support resource kind {kind:?}")]
    UnsupportedResourceType {
        /// The resource kind missing from the schema.
        kind: String,
        /// The provider whose schema was consulted.
        provider: ProviderRef,
    },

    /// A gateway call failed.
    #[error("provider {operation} failed: {message}")]
    CallFailed {
        /// The gateway operation that failed.
        operation: String,
        /// Error message reported by the provider.
        message: String,
    },
}

/// Structural invariant violations.
#[derive(Debug, Error)]
pub enum InvariantError {
    /// Create-before-destroy cannot be disabled on a deposed node: deposed
    /// objects exist only because a create-before-destroy replacement
    /// happened.
    #[error("cannot deactivate create_before_destroy for deposed instance {node}")]
    CreateBeforeDestroyRequired {
        /// Diagnostic name of the offending node.
        node: String,
    },

    /// A preallocated deposed key already names a filed object for the same
    /// address. Indicates two replacements raced or state was modified
    /// between allocation and use.
    #[error("deposed key {key} already in use for {addr}")]
    DeposedKeyInUse {
        /// The address whose deposed set already holds the key.
        addr: ResourceAddr,
        /// The colliding key.
        key: DeposedKey,
    },

    /// A pipeline step evaluated before the step that populates its input.
    /// Indicates a mis-built pipeline, not a runtime condition.
    #[error("step {step} requires {slot}, but no prior step populated it")]
    MissingPipelineInput {
        /// Name of the step that found its input missing.
        step: &'static str,
        /// Name of the missing context slot.
        slot: &'static str,
    },
}

/// Result type alias for strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;

/// Formats the node portion of an annotated error.
fn node_label(addr: &ResourceAddr, deposed_key: &Option<DeposedKey>) -> String {
    match deposed_key {
        Some(key) => format!("{addr} (deposed {key})"),
        None => addr.to_string(),
    }
}

impl StrataError {
    /// Wraps an error with the node it came from, for user-facing reporting.
    #[must_use]
    pub fn for_node(addr: ResourceAddr, deposed_key: Option<DeposedKey>, source: Self) -> Self {
        Self::Node {
            addr,
            deposed_key,
            source: Box::new(source),
        }
    }

    /// Returns true if a later, independent run may succeed where this one
    /// failed.
    ///
    /// Provider call failures qualify: state was persisted before they were
    /// surfaced, so the next run starts from an accurate baseline. Invariant
    /// violations and configuration mistakes never qualify.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(ProviderError::CallFailed { .. }) => true,
            Self::Node { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

impl StateError {
    /// Creates a backend error with the given message.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl ProviderError {
    /// Creates a call failure for the named gateway operation.
    #[must_use]
    pub fn call_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CallFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
