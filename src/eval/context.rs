//! Pipeline-scoped evaluation context.

use std::sync::Arc;

use crate::change::ResourceInstanceChange;
use crate::error::StrataError;
use crate::hooks::{Hook, NullHook};
use crate::provider::{ProviderGateway, ProviderRegistry, ProviderSchema};
use crate::state::{DeposedKey, ResourceInstanceObject, StateRepository};

use super::op::OperationKind;

/// Shared context for one pipeline evaluation.
///
/// Service handles are private and reached through accessors; the public
/// fields are the scratch slots steps hand data to each other through. Each
/// pipeline gets a fresh context, so scratch values never leak between
/// nodes.
pub struct EvalContext {
    op: OperationKind,
    repository: Arc<dyn StateRepository>,
    providers: Arc<ProviderRegistry>,
    hooks: Arc<dyn Hook>,

    /// Gateway resolved by the acquire step.
    pub provider: Option<Arc<dyn ProviderGateway>>,
    /// Schema fetched by the acquire step.
    pub schema: Option<ProviderSchema>,
    /// Working copy of the object under evaluation.
    pub object: Option<ResourceInstanceObject>,
    /// Change computed by the plan step.
    pub change: Option<ResourceInstanceChange>,
    /// Provider error captured for surfacing after the final state write.
    pub deferred: Option<StrataError>,
    /// Key recorded by the depose step.
    pub deposed_key: Option<DeposedKey>,
}

impl EvalContext {
    /// Creates a context for one pipeline run.
    #[must_use]
    pub fn new(
        op: OperationKind,
        repository: Arc<dyn StateRepository>,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            op,
            repository,
            providers,
            hooks: Arc::new(NullHook),
            provider: None,
            schema: None,
            object: None,
            change: None,
            deferred: None,
            deposed_key: None,
        }
    }

    /// Sets the hook sink events are delivered to.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn Hook>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Returns the operation kind this pipeline runs under.
    #[must_use]
    pub const fn op(&self) -> OperationKind {
        self.op
    }

    /// Returns the state repository.
    #[must_use]
    pub fn repository(&self) -> &dyn StateRepository {
        self.repository.as_ref()
    }

    /// Returns the provider registry.
    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        self.providers.as_ref()
    }

    /// Returns the hook sink.
    #[must_use]
    pub fn hooks(&self) -> &dyn Hook {
        self.hooks.as_ref()
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("op", &self.op)
            .field("backend", &self.repository.backend_type())
            .field("provider", &self.provider.is_some())
            .field("schema", &self.schema.is_some())
            .field("object", &self.object.is_some())
            .field("change", &self.change.is_some())
            .field("deferred", &self.deferred)
            .field("deposed_key", &self.deposed_key)
            .finish()
    }
}
