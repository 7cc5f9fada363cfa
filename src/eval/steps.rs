//! Concrete pipeline steps.
//!
//! Each step is a small struct holding the address data it needs; everything
//! else flows through the [`EvalContext`] scratch slots. Steps that talk to
//! the provider capture failures into `ctx.deferred` and return `Ok`, so the
//! state-persisting steps behind them always run; repository failures and
//! invariant violations are returned directly and abort the pipeline.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::addrs::{ProviderRef, ResourceAddr};
use crate::error::{InvariantError, ProviderError, Result, StrataError};
use crate::state::{DeposedKey, Generation, ObjectFingerprinter};

use super::context::EvalContext;
use super::step::EvalStep;

/// Resolves the provider gateway and fetches its schema.
///
/// Runs first in every branch; failures here are fatal because no later
/// step can do useful work without a gateway.
pub struct AcquireProvider {
    provider: ProviderRef,
}

impl AcquireProvider {
    /// Creates the step for the given provider reference.
    #[must_use]
    pub const fn new(provider: ProviderRef) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl EvalStep for AcquireProvider {
    fn name(&self) -> &'static str {
        "acquire-provider"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        let gateway = ctx.providers().resolve(&self.provider)?;
        let schema = gateway.schema().await?;
        debug!(
            "Acquired provider {} ({} resource kinds)",
            self.provider,
            schema.resource_types.len()
        );
        ctx.schema = Some(schema);
        ctx.provider = Some(gateway);
        Ok(())
    }
}

/// Loads one deposed object into the working slot.
pub struct ReadDeposedObject {
    addr: ResourceAddr,
    key: DeposedKey,
}

impl ReadDeposedObject {
    /// Creates the step for the given address and key.
    #[must_use]
    pub const fn new(addr: ResourceAddr, key: DeposedKey) -> Self {
        Self { addr, key }
    }
}

#[async_trait]
impl EvalStep for ReadDeposedObject {
    fn name(&self) -> &'static str {
        "read-deposed-object"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        let object = ctx.repository().read_deposed(&self.addr, &self.key).await?;
        match &object {
            Some(_) => debug!("Loaded deposed object {} ({})", self.addr, self.key),
            None => debug!(
                "No deposed object recorded for {} ({})",
                self.addr, self.key
            ),
        }
        ctx.object = object;
        Ok(())
    }
}

/// Re-reads the working object from real infrastructure.
///
/// The working slot is replaced with what the provider reports, which may be
/// `None` when the remote object is gone. A provider failure is deferred and
/// the prior snapshot is retained, so the follow-up write never persists a
/// half-read object.
pub struct RefreshObject {
    addr: ResourceAddr,
    provider: ProviderRef,
}

impl RefreshObject {
    /// Creates the step for the given address.
    #[must_use]
    pub const fn new(addr: ResourceAddr, provider: ProviderRef) -> Self {
        Self { addr, provider }
    }
}

#[async_trait]
impl EvalStep for RefreshObject {
    fn name(&self) -> &'static str {
        "refresh-object"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        let Some(object) = ctx.object.clone() else {
            debug!("No recorded object to refresh for {}", self.addr);
            return Ok(());
        };
        let Some(gateway) = ctx.provider.clone() else {
            return Err(InvariantError::MissingPipelineInput {
                step: self.name(),
                slot: "provider gateway",
            }
            .into());
        };
        let type_schema = ctx
            .schema
            .as_ref()
            .ok_or(InvariantError::MissingPipelineInput {
                step: self.name(),
                slot: "provider schema",
            })?
            .resource_type_schema(&self.addr.kind)
            .copied();
        let Some(type_schema) = type_schema else {
            ctx.deferred = Some(
                ProviderError::UnsupportedResourceType {
                    kind: self.addr.kind.clone(),
                    provider: self.provider.clone(),
                }
                .into(),
            );
            return Ok(());
        };

        match gateway.refresh(&self.addr, &object).await {
            Ok(Some(mut refreshed)) => {
                refreshed.schema_version = type_schema.version;
                refreshed.mark_refreshed();

                let fingerprinter = ObjectFingerprinter::new();
                let before = fingerprinter.short_fingerprint(&object);
                let after = fingerprinter.short_fingerprint(&refreshed);
                if before == after {
                    debug!("Refreshed {} (no drift, {before})", self.addr);
                } else {
                    info!("Refreshed {} (drift: {before} -> {after})", self.addr);
                }
                ctx.object = Some(refreshed);
            }
            Ok(None) => {
                info!("Object {} no longer exists remotely", self.addr);
                ctx.object = None;
            }
            Err(error) => {
                warn!("Refresh of {} failed: {error}", self.addr);
                ctx.deferred = Some(error.into());
            }
        }
        Ok(())
    }
}

/// Asks the gateway for the destroy change of the working object.
///
/// No working object means nothing to destroy and no change is recorded.
pub struct PlanDestroyChange {
    addr: ResourceAddr,
    key: DeposedKey,
}

impl PlanDestroyChange {
    /// Creates the step for the given address and key.
    #[must_use]
    pub const fn new(addr: ResourceAddr, key: DeposedKey) -> Self {
        Self { addr, key }
    }
}

#[async_trait]
impl EvalStep for PlanDestroyChange {
    fn name(&self) -> &'static str {
        "plan-destroy-change"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        let Some(object) = ctx.object.clone() else {
            debug!("Nothing to destroy for {} ({})", self.addr, self.key);
            ctx.change = None;
            return Ok(());
        };
        let Some(gateway) = ctx.provider.clone() else {
            return Err(InvariantError::MissingPipelineInput {
                step: self.name(),
                slot: "provider gateway",
            }
            .into());
        };

        match gateway.plan_destroy(&self.addr, &object).await {
            Ok(mut change) => {
                change.deposed_key = Some(self.key.clone());
                debug!("Planned {change}");
                ctx.change = Some(change);
            }
            Err(error) => {
                warn!("Destroy planning for {} failed: {error}", self.addr);
                ctx.deferred = Some(error.into());
            }
        }
        Ok(())
    }
}

/// Fires the pre-apply hook when a change is about to be applied.
pub struct PreApplyHook {
    addr: ResourceAddr,
    generation: Generation,
}

impl PreApplyHook {
    /// Creates the step for the given address and generation.
    #[must_use]
    pub const fn new(addr: ResourceAddr, generation: Generation) -> Self {
        Self { addr, generation }
    }
}

#[async_trait]
impl EvalStep for PreApplyHook {
    fn name(&self) -> &'static str {
        "pre-apply-hook"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        if let Some(change) = ctx.change.as_ref() {
            ctx.hooks().pre_apply(&self.addr, &self.generation, change);
        }
        Ok(())
    }
}

/// Applies the recorded change against real infrastructure.
///
/// The resulting object is stored unconditionally: `None` prunes the record
/// on the follow-up write, a partial object preserves it. Skipped when an
/// earlier step already deferred a failure.
pub struct ApplyChange {
    addr: ResourceAddr,
    provider: ProviderRef,
}

impl ApplyChange {
    /// Creates the step for the given address.
    #[must_use]
    pub const fn new(addr: ResourceAddr, provider: ProviderRef) -> Self {
        Self { addr, provider }
    }
}

#[async_trait]
impl EvalStep for ApplyChange {
    fn name(&self) -> &'static str {
        "apply-change"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        if ctx.deferred.is_some() {
            debug!("Skipping apply for {}, earlier failure pending", self.addr);
            return Ok(());
        }
        let Some(change) = ctx.change.clone() else {
            debug!("No change to apply for {}", self.addr);
            return Ok(());
        };
        let Some(gateway) = ctx.provider.clone() else {
            return Err(InvariantError::MissingPipelineInput {
                step: self.name(),
                slot: "provider gateway",
            }
            .into());
        };
        let type_schema = ctx
            .schema
            .as_ref()
            .ok_or(InvariantError::MissingPipelineInput {
                step: self.name(),
                slot: "provider schema",
            })?
            .resource_type_schema(&self.addr.kind)
            .copied();
        let Some(type_schema) = type_schema else {
            ctx.deferred = Some(
                ProviderError::UnsupportedResourceType {
                    kind: self.addr.kind.clone(),
                    provider: self.provider.clone(),
                }
                .into(),
            );
            return Ok(());
        };

        info!("Applying {change}");
        let mut response = gateway.apply_destroy(&self.addr, &change).await;
        if let Some(remaining) = response.new_object.as_mut() {
            remaining.schema_version = type_schema.version;
        }
        ctx.object = response.new_object;

        match response.error {
            Some(error) => {
                warn!("Apply for {} failed: {error}", self.addr);
                ctx.deferred = Some(error.into());
            }
            None => info!("Applied destroy for {}", self.addr),
        }
        Ok(())
    }
}

/// Writes the working object back under its deposed key.
///
/// Runs on success and failure paths alike; this is the mandatory persist
/// before any deferred failure is surfaced.
pub struct WriteDeposedObject {
    addr: ResourceAddr,
    key: DeposedKey,
}

impl WriteDeposedObject {
    /// Creates the step for the given address and key.
    #[must_use]
    pub const fn new(addr: ResourceAddr, key: DeposedKey) -> Self {
        Self { addr, key }
    }
}

#[async_trait]
impl EvalStep for WriteDeposedObject {
    fn name(&self) -> &'static str {
        "write-deposed-object"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        let object = ctx.object.clone();
        let present = object.is_some();
        ctx.repository()
            .write_deposed(&self.addr, &self.key, object)
            .await?;
        if present {
            debug!("Recorded deposed object {} ({})", self.addr, self.key);
        } else {
            debug!("Cleared deposed object {} ({})", self.addr, self.key);
        }
        Ok(())
    }
}

/// Fires the post-apply hook with the apply outcome.
///
/// Reports the deferred failure, if any, alongside whatever object remains.
pub struct PostApplyHook {
    addr: ResourceAddr,
    generation: Generation,
}

impl PostApplyHook {
    /// Creates the step for the given address and generation.
    #[must_use]
    pub const fn new(addr: ResourceAddr, generation: Generation) -> Self {
        Self { addr, generation }
    }
}

#[async_trait]
impl EvalStep for PostApplyHook {
    fn name(&self) -> &'static str {
        "post-apply-hook"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        if ctx.change.is_some() {
            let error = match ctx.deferred.as_ref() {
                Some(StrataError::Provider(error)) => Some(error),
                _ => None,
            };
            ctx.hooks()
                .post_apply(&self.addr, &self.generation, ctx.object.as_ref(), error);
        }
        Ok(())
    }
}

/// Returns the deferred provider failure, if one was captured.
///
/// Placed after every state-persisting step so "always persist, then
/// report" holds; steps registered behind it do not run on the failure path.
#[derive(Debug, Default)]
pub struct SurfaceDeferred;

impl SurfaceDeferred {
    /// Creates the step.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EvalStep for SurfaceDeferred {
    fn name(&self) -> &'static str {
        "surface-deferred"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        match ctx.deferred.take() {
            Some(error) => {
                debug!("Surfacing deferred failure: {error}");
                Err(error)
            }
            None => Ok(()),
        }
    }
}

/// Fires the state-updated hook.
///
/// Registered after [`SurfaceDeferred`], so sinks only hear about runs whose
/// outcome was persisted without a pending failure.
#[derive(Debug, Default)]
pub struct UpdateStateHook;

impl UpdateStateHook {
    /// Creates the step.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EvalStep for UpdateStateHook {
    fn name(&self) -> &'static str {
        "update-state-hook"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        ctx.hooks().state_updated();
        Ok(())
    }
}

/// Moves the current object for an address into the deposed set.
///
/// Uses the pre-allocated key when one was injected, otherwise lets the
/// repository generate a fresh unique one. The key the object was filed
/// under lands in [`EvalContext::deposed_key`].
pub struct DeposeObject {
    addr: ResourceAddr,
    preallocated: Option<DeposedKey>,
}

impl DeposeObject {
    /// Creates the step for the given address.
    #[must_use]
    pub const fn new(addr: ResourceAddr, preallocated: Option<DeposedKey>) -> Self {
        Self { addr, preallocated }
    }
}

#[async_trait]
impl EvalStep for DeposeObject {
    fn name(&self) -> &'static str {
        "depose-object"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        let key = ctx
            .repository()
            .depose_current(&self.addr, self.preallocated.clone())
            .await?;
        match &key {
            Some(key) => info!("Deposed current object of {} as {key}", self.addr),
            None => debug!("No current object to depose for {}", self.addr),
        }
        ctx.deposed_key = key;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::change::ResourceInstanceChange;
    use crate::eval::op::OperationKind;
    use crate::hooks::testing::RecordingHook;
    use crate::hooks::Hook;
    use crate::provider::fake::FakeGateway;
    use crate::provider::{ApplyResponse, ProviderGateway, ProviderRegistry};
    use crate::state::{MemoryStateStore, ResourceInstanceObject, StateRepository};

    struct Harness {
        repository: Arc<MemoryStateStore>,
        registry: Arc<ProviderRegistry>,
        gateway: Arc<FakeGateway>,
        hooks: Arc<RecordingHook>,
        provider: ProviderRef,
    }

    impl Harness {
        fn new() -> Self {
            let registry = Arc::new(ProviderRegistry::new());
            let gateway = Arc::new(FakeGateway::new());
            let provider = ProviderRef::new("compute");
            registry.register(
                provider.clone(),
                Arc::clone(&gateway) as Arc<dyn ProviderGateway>,
            );
            Self {
                repository: Arc::new(MemoryStateStore::new()),
                registry,
                gateway,
                hooks: Arc::new(RecordingHook::new()),
                provider,
            }
        }

        fn ctx(&self, op: OperationKind) -> EvalContext {
            EvalContext::new(
                op,
                Arc::clone(&self.repository) as Arc<dyn StateRepository>,
                Arc::clone(&self.registry),
            )
            .with_hooks(Arc::clone(&self.hooks) as Arc<dyn Hook>)
        }

        async fn acquired_ctx(&self, op: OperationKind) -> EvalContext {
            let mut ctx = self.ctx(op);
            AcquireProvider::new(self.provider.clone())
                .eval(&mut ctx)
                .await
                .expect("acquire provider");
            ctx
        }
    }

    fn web_addr() -> ResourceAddr {
        ResourceAddr::new("compute_instance", "web")
    }

    fn dep_key() -> DeposedKey {
        DeposedKey::parse("deadbeef").expect("valid key")
    }

    fn deposed_gen() -> Generation {
        Generation::Deposed(dep_key())
    }

    #[tokio::test]
    async fn test_acquire_provider_populates_context() {
        let h = Harness::new();
        let mut ctx = h.ctx(OperationKind::Destroy);

        AcquireProvider::new(h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("acquire provider");

        assert!(ctx.provider.is_some());
        assert!(ctx.schema.as_ref().expect("schema").supports("compute_instance"));
    }

    #[tokio::test]
    async fn test_acquire_unregistered_provider_is_fatal() {
        let h = Harness::new();
        let mut ctx = h.ctx(OperationKind::Destroy);

        let err = AcquireProvider::new(ProviderRef::new("absent"))
            .eval(&mut ctx)
            .await
            .expect_err("unregistered provider");

        assert!(matches!(
            err,
            StrataError::Provider(ProviderError::Unregistered { .. })
        ));
        assert!(ctx.deferred.is_none());
    }

    #[tokio::test]
    async fn test_acquire_schema_failure_is_fatal() {
        let h = Harness::new();
        h.gateway
            .fail_schema(ProviderError::call_failed("schema", "wire cut"));
        let mut ctx = h.ctx(OperationKind::Destroy);

        AcquireProvider::new(h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect_err("schema failure");

        assert!(ctx.provider.is_none());
    }

    #[tokio::test]
    async fn test_read_loads_recorded_object() {
        let h = Harness::new();
        let (addr, key) = (web_addr(), dep_key());
        let object = ResourceInstanceObject::ready(json!({"id": "i-1"}));
        h.repository
            .write_deposed(&addr, &key, Some(object.clone()))
            .await
            .expect("seed");

        let mut ctx = h.ctx(OperationKind::Destroy);
        ReadDeposedObject::new(addr, key)
            .eval(&mut ctx)
            .await
            .expect("read");

        assert_eq!(ctx.object, Some(object));
    }

    #[tokio::test]
    async fn test_read_missing_object_clears_slot() {
        let h = Harness::new();
        let mut ctx = h.ctx(OperationKind::Destroy);
        ctx.object = Some(ResourceInstanceObject::ready(json!({"stale": true})));

        ReadDeposedObject::new(web_addr(), dep_key())
            .eval(&mut ctx)
            .await
            .expect("read");

        assert_eq!(ctx.object, None);
    }

    #[tokio::test]
    async fn test_refresh_skips_when_no_object() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Refresh).await;

        RefreshObject::new(web_addr(), h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("refresh");

        assert_eq!(h.gateway.calls(), vec!["schema"]);
        assert!(ctx.deferred.is_none());
    }

    #[tokio::test]
    async fn test_refresh_replaces_object_and_stamps_metadata() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Refresh).await;
        ctx.object = Some(ResourceInstanceObject::ready(json!({"id": "i-1"})));
        h.gateway.push_refresh(Ok(Some(ResourceInstanceObject::ready(
            json!({"id": "i-1", "zone": "west"}),
        ))));

        RefreshObject::new(web_addr(), h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("refresh");

        let refreshed = ctx.object.expect("object retained");
        assert_eq!(refreshed.attrs, json!({"id": "i-1", "zone": "west"}));
        assert_eq!(refreshed.schema_version, 1);
        assert!(refreshed.last_refreshed.is_some());
    }

    #[tokio::test]
    async fn test_refresh_records_remote_deletion() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Refresh).await;
        ctx.object = Some(ResourceInstanceObject::ready(json!({"id": "i-1"})));
        h.gateway.push_refresh(Ok(None));

        RefreshObject::new(web_addr(), h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("refresh");

        assert_eq!(ctx.object, None);
        assert!(ctx.deferred.is_none());
    }

    #[tokio::test]
    async fn test_refresh_failure_defers_and_keeps_snapshot() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Refresh).await;
        let object = ResourceInstanceObject::ready(json!({"id": "i-1"}));
        ctx.object = Some(object.clone());
        h.gateway
            .push_refresh(Err(ProviderError::call_failed("refresh", "api timeout")));

        RefreshObject::new(web_addr(), h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("step itself succeeds");

        assert_eq!(ctx.object, Some(object));
        assert!(ctx.deferred.is_some());
    }

    #[tokio::test]
    async fn test_refresh_unsupported_kind_defers_without_calling_provider() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Refresh).await;
        ctx.object = Some(ResourceInstanceObject::ready(json!({})));
        let addr = ResourceAddr::new("dns_record", "api");

        RefreshObject::new(addr, h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("step itself succeeds");

        assert!(matches!(
            ctx.deferred,
            Some(StrataError::Provider(
                ProviderError::UnsupportedResourceType { .. }
            ))
        ));
        assert_eq!(h.gateway.calls(), vec!["schema"]);
    }

    #[tokio::test]
    async fn test_refresh_without_provider_is_invariant_error() {
        let h = Harness::new();
        let mut ctx = h.ctx(OperationKind::Refresh);
        ctx.object = Some(ResourceInstanceObject::ready(json!({})));

        let err = RefreshObject::new(web_addr(), h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect_err("mis-built pipeline");

        assert!(matches!(
            err,
            StrataError::Invariant(InvariantError::MissingPipelineInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_plan_skips_without_object() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Destroy).await;

        PlanDestroyChange::new(web_addr(), dep_key())
            .eval(&mut ctx)
            .await
            .expect("plan");

        assert!(ctx.change.is_none());
        assert_eq!(h.gateway.calls(), vec!["schema"]);
    }

    #[tokio::test]
    async fn test_plan_records_change_with_deposed_key() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Destroy).await;
        ctx.object = Some(ResourceInstanceObject::ready(json!({"id": "i-1"})));

        PlanDestroyChange::new(web_addr(), dep_key())
            .eval(&mut ctx)
            .await
            .expect("plan");

        let change = ctx.change.expect("change recorded");
        assert!(change.action.is_destroy());
        assert_eq!(change.deposed_key, Some(dep_key()));
        assert_eq!(change.before, json!({"id": "i-1"}));
    }

    #[tokio::test]
    async fn test_plan_failure_defers() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Destroy).await;
        ctx.object = Some(ResourceInstanceObject::ready(json!({})));
        h.gateway
            .push_plan(Err(ProviderError::call_failed("plan_destroy", "bad attrs")));

        PlanDestroyChange::new(web_addr(), dep_key())
            .eval(&mut ctx)
            .await
            .expect("step itself succeeds");

        assert!(ctx.change.is_none());
        assert!(ctx.deferred.is_some());
    }

    #[tokio::test]
    async fn test_pre_apply_hook_fires_only_with_change() {
        let h = Harness::new();
        let mut ctx = h.ctx(OperationKind::Destroy);

        PreApplyHook::new(web_addr(), deposed_gen())
            .eval(&mut ctx)
            .await
            .expect("hook step");
        assert!(h.hooks.events().is_empty());

        ctx.change = Some(ResourceInstanceChange::destroy(
            web_addr(),
            Some(dep_key()),
            json!({}),
        ));
        PreApplyHook::new(web_addr(), deposed_gen())
            .eval(&mut ctx)
            .await
            .expect("hook step");

        assert_eq!(
            h.hooks.events(),
            vec!["pre_apply compute_instance.web (deposed deadbeef): delete"]
        );
    }

    #[tokio::test]
    async fn test_apply_destroys_object() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Destroy).await;
        ctx.object = Some(ResourceInstanceObject::ready(json!({"id": "i-1"})));
        ctx.change = Some(ResourceInstanceChange::destroy(
            web_addr(),
            Some(dep_key()),
            json!({"id": "i-1"}),
        ));

        ApplyChange::new(web_addr(), h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("apply");

        assert_eq!(ctx.object, None);
        assert!(ctx.deferred.is_none());
    }

    #[tokio::test]
    async fn test_apply_failure_keeps_partial_object() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Destroy).await;
        ctx.object = Some(ResourceInstanceObject::ready(json!({"id": "i-1"})));
        ctx.change = Some(ResourceInstanceChange::destroy(
            web_addr(),
            Some(dep_key()),
            json!({"id": "i-1"}),
        ));
        let partial = ResourceInstanceObject::tainted(json!({"id": "i-1", "detached": false}));
        h.gateway.push_apply(ApplyResponse::failed(
            Some(partial.clone()),
            ProviderError::call_failed("apply_destroy", "volume still attached"),
        ));

        ApplyChange::new(web_addr(), h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("step itself succeeds");

        let remaining = ctx.object.expect("partial object retained");
        assert_eq!(remaining.attrs, partial.attrs);
        assert_eq!(remaining.schema_version, 1);
        assert!(ctx.deferred.is_some());
    }

    #[tokio::test]
    async fn test_apply_skipped_when_failure_pending() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Destroy).await;
        let object = ResourceInstanceObject::ready(json!({"id": "i-1"}));
        ctx.object = Some(object.clone());
        ctx.change = Some(ResourceInstanceChange::destroy(
            web_addr(),
            Some(dep_key()),
            json!({"id": "i-1"}),
        ));
        ctx.deferred = Some(ProviderError::call_failed("plan_destroy", "earlier").into());

        ApplyChange::new(web_addr(), h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("apply step");

        assert_eq!(ctx.object, Some(object));
        assert_eq!(h.gateway.calls(), vec!["schema"]);
    }

    #[tokio::test]
    async fn test_apply_skips_without_change() {
        let h = Harness::new();
        let mut ctx = h.acquired_ctx(OperationKind::Destroy).await;

        ApplyChange::new(web_addr(), h.provider.clone())
            .eval(&mut ctx)
            .await
            .expect("apply step");

        assert_eq!(h.gateway.calls(), vec!["schema"]);
    }

    #[tokio::test]
    async fn test_write_persists_and_clears() {
        let h = Harness::new();
        let (addr, key) = (web_addr(), dep_key());
        let object = ResourceInstanceObject::ready(json!({"id": "i-1"}));
        let mut ctx = h.ctx(OperationKind::Destroy);

        ctx.object = Some(object.clone());
        WriteDeposedObject::new(addr.clone(), key.clone())
            .eval(&mut ctx)
            .await
            .expect("write");
        assert_eq!(
            h.repository.read_deposed(&addr, &key).await.expect("read"),
            Some(object)
        );

        ctx.object = None;
        WriteDeposedObject::new(addr.clone(), key.clone())
            .eval(&mut ctx)
            .await
            .expect("write");
        assert_eq!(
            h.repository.read_deposed(&addr, &key).await.expect("read"),
            None
        );
    }

    #[tokio::test]
    async fn test_post_apply_hook_reports_failure() {
        let h = Harness::new();
        let mut ctx = h.ctx(OperationKind::Destroy);
        ctx.change = Some(ResourceInstanceChange::destroy(
            web_addr(),
            Some(dep_key()),
            json!({}),
        ));
        ctx.object = Some(ResourceInstanceObject::tainted(json!({"id": "i-1"})));
        ctx.deferred = Some(ProviderError::call_failed("apply_destroy", "boom").into());

        PostApplyHook::new(web_addr(), deposed_gen())
            .eval(&mut ctx)
            .await
            .expect("hook step");

        assert_eq!(
            h.hooks.events(),
            vec!["post_apply compute_instance.web (deposed deadbeef): failed"]
        );
    }

    #[tokio::test]
    async fn test_surface_deferred_returns_captured_error() {
        let h = Harness::new();
        let mut ctx = h.ctx(OperationKind::Destroy);

        SurfaceDeferred::new()
            .eval(&mut ctx)
            .await
            .expect("nothing deferred");

        ctx.deferred = Some(ProviderError::call_failed("apply_destroy", "boom").into());
        let err = SurfaceDeferred::new()
            .eval(&mut ctx)
            .await
            .expect_err("deferred failure surfaces");

        assert!(err.is_retryable());
        assert!(ctx.deferred.is_none());
    }

    #[tokio::test]
    async fn test_update_state_hook_fires() {
        let h = Harness::new();
        let mut ctx = h.ctx(OperationKind::Destroy);

        UpdateStateHook::new().eval(&mut ctx).await.expect("hook step");

        assert_eq!(h.hooks.events(), vec!["state_updated"]);
    }

    #[tokio::test]
    async fn test_depose_object_records_key() {
        let h = Harness::new();
        let addr = web_addr();
        h.repository
            .write_current(&addr, Some(ResourceInstanceObject::ready(json!({"id": "i-old"}))))
            .await
            .expect("seed");

        let mut ctx = h.ctx(OperationKind::Apply);
        DeposeObject::new(addr.clone(), None)
            .eval(&mut ctx)
            .await
            .expect("depose");

        let key = ctx.deposed_key.expect("key recorded");
        assert_eq!(h.repository.read_current(&addr).await.expect("read"), None);
        assert!(h
            .repository
            .read_deposed(&addr, &key)
            .await
            .expect("read")
            .is_some());
    }

    #[tokio::test]
    async fn test_depose_object_honors_preallocated_key() {
        let h = Harness::new();
        let addr = web_addr();
        h.repository
            .write_current(&addr, Some(ResourceInstanceObject::ready(json!({}))))
            .await
            .expect("seed");

        let mut ctx = h.ctx(OperationKind::Apply);
        DeposeObject::new(addr.clone(), Some(dep_key()))
            .eval(&mut ctx)
            .await
            .expect("depose");

        assert_eq!(ctx.deposed_key, Some(dep_key()));
    }

    #[tokio::test]
    async fn test_depose_object_without_current_leaves_slot_empty() {
        let h = Harness::new();
        let mut ctx = h.ctx(OperationKind::Apply);

        DeposeObject::new(web_addr(), None)
            .eval(&mut ctx)
            .await
            .expect("depose");

        assert_eq!(ctx.deposed_key, None);
    }
}
