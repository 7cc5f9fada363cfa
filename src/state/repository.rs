//! State repository trait definition.
//!
//! This module defines the common interface for state storage backends. The
//! repository files objects per resource instance address in two kinds of
//! slot: one optional current object and any number of deposed objects keyed
//! by [`DeposedKey`].

use async_trait::async_trait;

use super::types::{DeposedKey, ResourceInstanceObject};
use crate::addrs::ResourceAddr;
use crate::error::Result;

/// Trait for state storage backends.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Reads the current object for an address.
    ///
    /// Returns `None` if the instance has no current object.
    async fn read_current(&self, addr: &ResourceAddr) -> Result<Option<ResourceInstanceObject>>;

    /// Writes the current object for an address.
    ///
    /// Passing `None` clears the slot.
    async fn write_current(
        &self,
        addr: &ResourceAddr,
        object: Option<ResourceInstanceObject>,
    ) -> Result<()>;

    /// Reads one deposed object for an address.
    ///
    /// Returns `None` if no object is filed under the key.
    async fn read_deposed(
        &self,
        addr: &ResourceAddr,
        key: &DeposedKey,
    ) -> Result<Option<ResourceInstanceObject>>;

    /// Writes one deposed object for an address.
    ///
    /// Passing `None` prunes the entry; the instance record itself is
    /// dropped once it holds neither a current object nor deposed entries.
    async fn write_deposed(
        &self,
        addr: &ResourceAddr,
        key: &DeposedKey,
        object: Option<ResourceInstanceObject>,
    ) -> Result<()>;

    /// Moves the current object for an address into the deposed set.
    ///
    /// Uses `preallocated` as the key when given, otherwise allocates a
    /// fresh one. Returns the key the object was filed under, or `None`
    /// when there was no current object to depose.
    async fn depose_current(
        &self,
        addr: &ResourceAddr,
        preallocated: Option<DeposedKey>,
    ) -> Result<Option<DeposedKey>>;

    /// Lists the deposed keys filed for an address, in sorted order.
    async fn deposed_keys(&self, addr: &ResourceAddr) -> Result<Vec<DeposedKey>>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}
