//! Provider gateway trait definition.
//!
//! This module defines the interface the evaluation pipelines use to talk to
//! real infrastructure. Refresh and plan calls report failure through their
//! `Result`; apply reports through [`ApplyResponse`] because a failed destroy
//! can still leave a partially-changed object that must be recorded.

use async_trait::async_trait;

use crate::addrs::ResourceAddr;
use crate::change::ResourceInstanceChange;
use crate::error::ProviderError;
use crate::state::ResourceInstanceObject;

use super::schema::ProviderSchema;

/// Outcome of an apply call.
///
/// Both channels may carry data at once: a destroy that fails midway reports
/// the object that still exists alongside the error.
#[derive(Debug)]
pub struct ApplyResponse {
    /// The object as it exists after the apply; `None` means it is gone.
    pub new_object: Option<ResourceInstanceObject>,
    /// The failure, if the apply did not fully complete.
    pub error: Option<ProviderError>,
}

impl ApplyResponse {
    /// Creates a response for a destroy that completed.
    #[must_use]
    pub const fn destroyed() -> Self {
        Self {
            new_object: None,
            error: None,
        }
    }

    /// Creates a response for an apply that failed, with whatever object
    /// remains.
    #[must_use]
    pub const fn failed(remaining: Option<ResourceInstanceObject>, error: ProviderError) -> Self {
        Self {
            new_object: remaining,
            error: Some(error),
        }
    }

    /// Checks whether the apply completed without error.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Trait for provider integrations.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Fetches the provider's schema.
    async fn schema(&self) -> Result<ProviderSchema, ProviderError>;

    /// Reads the real infrastructure backing a recorded object.
    ///
    /// Returns `Ok(None)` when the remote object no longer exists.
    async fn refresh(
        &self,
        addr: &ResourceAddr,
        object: &ResourceInstanceObject,
    ) -> Result<Option<ResourceInstanceObject>, ProviderError>;

    /// Computes the destroy change for a recorded object.
    async fn plan_destroy(
        &self,
        addr: &ResourceAddr,
        object: &ResourceInstanceObject,
    ) -> Result<ResourceInstanceChange, ProviderError>;

    /// Applies a change against real infrastructure.
    async fn apply_destroy(
        &self,
        addr: &ResourceAddr,
        change: &ResourceInstanceChange,
    ) -> ApplyResponse;
}
