//! Scripted provider gateway for tests.
//!
//! Each call pops the next scripted outcome for that operation; when a
//! script is exhausted the gateway falls back to a benign default (echo the
//! object on refresh, a plain destroy change on plan, success on apply).
//! Every call is journaled so tests can assert on call order.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::addrs::ResourceAddr;
use crate::change::ResourceInstanceChange;
use crate::error::ProviderError;
use crate::state::ResourceInstanceObject;

use super::gateway::{ApplyResponse, ProviderGateway};
use super::schema::ProviderSchema;

/// Deterministic gateway with per-operation scripts and a call journal.
pub(crate) struct FakeGateway {
    schema: ProviderSchema,
    schema_failure: Mutex<Option<ProviderError>>,
    refresh_script: Mutex<VecDeque<Result<Option<ResourceInstanceObject>, ProviderError>>>,
    plan_script: Mutex<VecDeque<Result<ResourceInstanceChange, ProviderError>>>,
    apply_script: Mutex<VecDeque<ApplyResponse>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    /// Creates a gateway whose schema supports `compute_instance` at
    /// version 1.
    pub(crate) fn new() -> Self {
        Self::with_schema(ProviderSchema::new().with_resource_type("compute_instance", 1))
    }

    /// Creates a gateway advertising the given schema.
    pub(crate) fn with_schema(schema: ProviderSchema) -> Self {
        Self {
            schema,
            schema_failure: Mutex::new(None),
            refresh_script: Mutex::new(VecDeque::new()),
            plan_script: Mutex::new(VecDeque::new()),
            apply_script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes the next `schema` call fail.
    pub(crate) fn fail_schema(&self, error: ProviderError) {
        *self.schema_failure.lock().expect("lock poisoned") = Some(error);
    }

    /// Queues the next `refresh` outcome.
    pub(crate) fn push_refresh(&self, result: Result<Option<ResourceInstanceObject>, ProviderError>) {
        self.refresh_script
            .lock()
            .expect("lock poisoned")
            .push_back(result);
    }

    /// Queues the next `plan_destroy` outcome.
    pub(crate) fn push_plan(&self, result: Result<ResourceInstanceChange, ProviderError>) {
        self.plan_script
            .lock()
            .expect("lock poisoned")
            .push_back(result);
    }

    /// Queues the next `apply_destroy` outcome.
    pub(crate) fn push_apply(&self, response: ApplyResponse) {
        self.apply_script
            .lock()
            .expect("lock poisoned")
            .push_back(response);
    }

    /// Returns the journal of calls made so far.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("lock poisoned").push(call);
    }
}

#[async_trait]
impl ProviderGateway for FakeGateway {
    async fn schema(&self) -> Result<ProviderSchema, ProviderError> {
        self.record("schema".to_string());
        if let Some(error) = self.schema_failure.lock().expect("lock poisoned").take() {
            return Err(error);
        }
        Ok(self.schema.clone())
    }

    async fn refresh(
        &self,
        addr: &ResourceAddr,
        object: &ResourceInstanceObject,
    ) -> Result<Option<ResourceInstanceObject>, ProviderError> {
        self.record(format!("refresh {addr}"));
        self.refresh_script
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(Some(object.clone())))
    }

    async fn plan_destroy(
        &self,
        addr: &ResourceAddr,
        object: &ResourceInstanceObject,
    ) -> Result<ResourceInstanceChange, ProviderError> {
        self.record(format!("plan_destroy {addr}"));
        self.plan_script
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ResourceInstanceChange::destroy(
                    addr.clone(),
                    None,
                    object.attrs.clone(),
                ))
            })
    }

    async fn apply_destroy(
        &self,
        addr: &ResourceAddr,
        _change: &ResourceInstanceChange,
    ) -> ApplyResponse {
        self.record(format!("apply_destroy {addr}"));
        self.apply_script
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(ApplyResponse::destroyed)
    }
}
