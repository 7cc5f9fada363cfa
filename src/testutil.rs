//! Shared helpers for pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::addrs::ResourceAddr;
use crate::error::Result;
use crate::state::{DeposedKey, ResourceInstanceObject, StateRepository};

/// Installs the test tracing subscriber once per process.
///
/// Later calls are no-ops; `RUST_LOG` overrides the default filter.
pub(crate) fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Repository wrapper that counts calls.
///
/// Used to assert that a filtered-out pipeline branch made no state access
/// at all, not merely no visible changes.
pub(crate) struct CountingRepository {
    inner: Arc<dyn StateRepository>,
    calls: AtomicUsize,
}

impl CountingRepository {
    pub(crate) fn new(inner: Arc<dyn StateRepository>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of repository calls made through this wrapper.
    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StateRepository for CountingRepository {
    async fn read_current(&self, addr: &ResourceAddr) -> Result<Option<ResourceInstanceObject>> {
        self.tick();
        self.inner.read_current(addr).await
    }

    async fn write_current(
        &self,
        addr: &ResourceAddr,
        object: Option<ResourceInstanceObject>,
    ) -> Result<()> {
        self.tick();
        self.inner.write_current(addr, object).await
    }

    async fn read_deposed(
        &self,
        addr: &ResourceAddr,
        key: &DeposedKey,
    ) -> Result<Option<ResourceInstanceObject>> {
        self.tick();
        self.inner.read_deposed(addr, key).await
    }

    async fn write_deposed(
        &self,
        addr: &ResourceAddr,
        key: &DeposedKey,
        object: Option<ResourceInstanceObject>,
    ) -> Result<()> {
        self.tick();
        self.inner.write_deposed(addr, key, object).await
    }

    async fn depose_current(
        &self,
        addr: &ResourceAddr,
        preallocated: Option<DeposedKey>,
    ) -> Result<Option<DeposedKey>> {
        self.tick();
        self.inner.depose_current(addr, preallocated).await
    }

    async fn deposed_keys(&self, addr: &ResourceAddr) -> Result<Vec<DeposedKey>> {
        self.tick();
        self.inner.deposed_keys(addr).await
    }

    fn backend_type(&self) -> &'static str {
        self.inner.backend_type()
    }
}
