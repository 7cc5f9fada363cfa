//! Deposed object lifecycle node.
//!
//! A deposed object is the old object of a create-before-destroy
//! replacement: the new object took the current slot and the old one was
//! filed under a deposed key, waiting to be destroyed. This node owns that
//! destruction. It refreshes the object during refresh walks and destroys it
//! during apply and destroy walks; during plan walks it does nothing. A
//! deposed object is never promoted back to current: the only ways out are
//! destruction or retention for a later retry.

use async_trait::async_trait;
use tracing::{debug, error};

use crate::addrs::{ProviderRef, ResourceAddr};
use crate::error::{InvariantError, Result, StrataError};
use crate::eval::{
    AcquireProvider, ApplyChange, EvalContext, EvalSequence, EvalStep, OpFilter, OperationKind,
    PlanDestroyChange, PostApplyHook, PreApplyHook, ReadDeposedObject, RefreshObject,
    SurfaceDeferred, UpdateStateHook, WriteDeposedObject,
};
use crate::state::{DeposedKey, Generation};

use super::node::{Destroyer, GraphNode};

/// Graph node that manages the lifecycle of one deposed object.
pub struct DeposedInstanceNode {
    addr: ResourceAddr,
    key: DeposedKey,
    provider: ProviderRef,
}

impl DeposedInstanceNode {
    /// Creates a node for the deposed object of `addr` filed under `key`.
    #[must_use]
    pub const fn new(addr: ResourceAddr, key: DeposedKey, provider: ProviderRef) -> Self {
        Self {
            addr,
            key,
            provider,
        }
    }

    /// Returns the instance address this node operates on.
    #[must_use]
    pub const fn addr(&self) -> &ResourceAddr {
        &self.addr
    }

    /// Returns the deposed key this node operates on.
    #[must_use]
    pub const fn key(&self) -> &DeposedKey {
        &self.key
    }

    fn generation(&self) -> Generation {
        Generation::Deposed(self.key.clone())
    }

    /// Builds the node's operation-filtered pipeline.
    ///
    /// The refresh branch re-verifies the object and writes it back; the
    /// destroy branch plans and applies the destroy, persists the outcome,
    /// and only then surfaces any provider failure. Under any other
    /// operation both branches are skipped.
    #[must_use]
    pub fn pipeline(&self) -> EvalSequence {
        let refresh = EvalSequence::new()
            .with_step(AcquireProvider::new(self.provider.clone()))
            .with_step(ReadDeposedObject::new(self.addr.clone(), self.key.clone()))
            .with_step(RefreshObject::new(self.addr.clone(), self.provider.clone()))
            .with_step(WriteDeposedObject::new(self.addr.clone(), self.key.clone()))
            .with_step(SurfaceDeferred::new());

        let destroy = EvalSequence::new()
            .with_step(AcquireProvider::new(self.provider.clone()))
            .with_step(ReadDeposedObject::new(self.addr.clone(), self.key.clone()))
            .with_step(PlanDestroyChange::new(self.addr.clone(), self.key.clone()))
            .with_step(PreApplyHook::new(self.addr.clone(), self.generation()))
            .with_step(ApplyChange::new(self.addr.clone(), self.provider.clone()))
            .with_step(WriteDeposedObject::new(self.addr.clone(), self.key.clone()))
            .with_step(PostApplyHook::new(self.addr.clone(), self.generation()))
            .with_step(SurfaceDeferred::new())
            .with_step(UpdateStateHook::new());

        EvalSequence::new()
            .with_step(OpFilter::new(vec![OperationKind::Refresh], refresh))
            .with_step(OpFilter::new(
                vec![OperationKind::Apply, OperationKind::Destroy],
                destroy,
            ))
    }
}

#[async_trait]
impl GraphNode for DeposedInstanceNode {
    fn name(&self) -> String {
        format!("{} (deposed {})", self.addr, self.key)
    }

    // A deposed object is a remnant of configuration that no longer exists;
    // nothing can reference it and it references nothing.
    fn referenceable_addrs(&self) -> Vec<ResourceAddr> {
        Vec::new()
    }

    fn references(&self) -> Vec<ResourceAddr> {
        Vec::new()
    }

    async fn execute(&self, ctx: &mut EvalContext) -> Result<()> {
        debug!("Executing {} under {} walk", self.name(), ctx.op());
        self.pipeline().eval(ctx).await.map_err(|source| {
            error!("{} failed: {source}", self.name());
            StrataError::for_node(self.addr.clone(), Some(self.key.clone()), source)
        })
    }

    fn as_destroyer(&self) -> Option<&dyn Destroyer> {
        Some(self)
    }
}

impl Destroyer for DeposedInstanceNode {
    fn destroy_addr(&self) -> &ResourceAddr {
        &self.addr
    }

    // Deposed objects only exist because a create-before-destroy
    // replacement happened; the ordering is structural, not configured.
    fn create_before_destroy(&self) -> bool {
        true
    }

    fn set_create_before_destroy(&self, enabled: bool) -> Result<()> {
        if enabled {
            Ok(())
        } else {
            Err(InvariantError::CreateBeforeDestroyRequired { node: self.name() }.into())
        }
    }
}
