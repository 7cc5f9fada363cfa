//! Deposed key pre-allocation.
//!
//! When a create-before-destroy replacement is planned, the graph builder
//! allocates the deposed key up front and pairs it: the replacement node
//! files the old object under that key, and the destroy node scheduled for
//! the same walk looks it up under that key. The [`Deposer`] capability is
//! how the builder injects the key; [`DeposedKeyAllocator`] is the holder
//! nodes embed so they all treat the injected key the same way.

use std::sync::{Mutex, PoisonError};

use crate::state::DeposedKey;

/// Capability of nodes that may create exactly one new deposed object for
/// their associated instance during apply.
pub trait Deposer: Send + Sync {
    /// Injects the key the node must file its deposed object under.
    ///
    /// A node that received a key through this method must depose under
    /// exactly that key, never a freshly generated one.
    fn set_preallocated_deposed_key(&self, key: DeposedKey);
}

/// Holder for an injected deposed key.
///
/// `None` means no pre-allocation occurred and a fresh key should be
/// generated at depose time.
#[derive(Debug, Default)]
pub struct DeposedKeyAllocator {
    key: Mutex<Option<DeposedKey>>,
}

impl DeposedKeyAllocator {
    /// Creates an allocator with no key injected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the injected key, replacing any previous one.
    pub fn set(&self, key: DeposedKey) {
        *self.key.lock().unwrap_or_else(PoisonError::into_inner) = Some(key);
    }

    /// Returns a copy of the injected key, if any.
    #[must_use]
    pub fn preallocated(&self) -> Option<DeposedKey> {
        self.key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consumes the injected key, leaving the allocator empty.
    #[must_use]
    pub fn take(&self) -> Option<DeposedKey> {
        self.key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
