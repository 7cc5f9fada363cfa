//! Lifecycle event hooks.
//!
//! Hooks let an embedding host observe pipeline progress: a change is about
//! to be applied, a change finished applying, the state was persisted. All
//! methods default to no-ops so sinks implement only what they care about.
//! Hook failures cannot abort a pipeline; implementations must not panic.

use crate::addrs::ResourceAddr;
use crate::change::ResourceInstanceChange;
use crate::error::ProviderError;
use crate::state::{Generation, ResourceInstanceObject};

/// Trait for pipeline event sinks.
pub trait Hook: Send + Sync {
    /// Called before a change is applied against real infrastructure.
    fn pre_apply(
        &self,
        _addr: &ResourceAddr,
        _generation: &Generation,
        _change: &ResourceInstanceChange,
    ) {
    }

    /// Called after an apply attempt, with the resulting object and the
    /// provider failure if there was one.
    fn post_apply(
        &self,
        _addr: &ResourceAddr,
        _generation: &Generation,
        _new_object: Option<&ResourceInstanceObject>,
        _error: Option<&ProviderError>,
    ) {
    }

    /// Called after a pipeline's outcome has been persisted without error.
    fn state_updated(&self) {}
}

/// Hook implementation that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHook;

impl Hook for NullHook {}
