//! Provider registry.
//!
//! The registry maps provider configuration references to live gateway
//! handles. The graph walker registers gateways once at startup; pipelines
//! resolve them by reference at execution time.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::addrs::ProviderRef;
use crate::error::ProviderError;

use super::gateway::ProviderGateway;

/// Registry of configured provider gateways.
#[derive(Default)]
pub struct ProviderRegistry {
    gateways: DashMap<ProviderRef, Arc<dyn ProviderGateway>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gateways: DashMap::new(),
        }
    }

    /// Registers a gateway under a provider reference.
    ///
    /// Re-registering a reference replaces the previous gateway.
    pub fn register(&self, provider: ProviderRef, gateway: Arc<dyn ProviderGateway>) {
        debug!(%provider, "registered provider gateway");
        self.gateways.insert(provider, gateway);
    }

    /// Resolves a provider reference to its gateway.
    ///
    /// Returns [`ProviderError::Unregistered`] when no gateway was
    /// registered under the reference.
    pub fn resolve(&self, provider: &ProviderRef) -> Result<Arc<dyn ProviderGateway>, ProviderError> {
        self.gateways
            .get(provider)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ProviderError::Unregistered {
                provider: provider.clone(),
            })
    }

    /// Returns the number of registered gateways.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    /// Checks whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("gateways", &self.gateways.len())
            .finish()
    }
}
