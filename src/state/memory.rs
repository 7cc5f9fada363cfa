//! In-memory state repository.
//!
//! This backend keeps all instance records in a sharded concurrent map, so
//! pipelines for different addresses proceed without a global lock. It is the
//! default backend for tests and for embedding the executor in a host that
//! manages durable state itself.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::repository::StateRepository;
use super::types::{DeposedKey, ResourceInstanceObject};
use crate::addrs::ResourceAddr;
use crate::error::{InvariantError, Result};

/// All recorded objects for one resource instance address.
#[derive(Debug, Default)]
struct InstanceRecord {
    /// The live object, if any.
    current: Option<ResourceInstanceObject>,
    /// Objects waiting to be destroyed, keyed by deposed key.
    deposed: HashMap<DeposedKey, ResourceInstanceObject>,
}

impl InstanceRecord {
    fn is_empty(&self) -> bool {
        self.current.is_none() && self.deposed.is_empty()
    }
}

/// State repository backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    instances: DashMap<ResourceAddr, InstanceRecord>,
}

impl MemoryStateStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instances: DashMap::new(),
        }
    }

    /// Returns the number of addresses with at least one recorded object.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

#[async_trait]
impl StateRepository for MemoryStateStore {
    async fn read_current(&self, addr: &ResourceAddr) -> Result<Option<ResourceInstanceObject>> {
        Ok(self
            .instances
            .get(addr)
            .and_then(|record| record.current.clone()))
    }

    async fn write_current(
        &self,
        addr: &ResourceAddr,
        object: Option<ResourceInstanceObject>,
    ) -> Result<()> {
        match self.instances.entry(addr.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().current = object;
                if entry.get().is_empty() {
                    entry.remove();
                }
            }
            Entry::Vacant(entry) => {
                if let Some(object) = object {
                    entry.insert(InstanceRecord {
                        current: Some(object),
                        deposed: HashMap::new(),
                    });
                }
            }
        }
        Ok(())
    }

    async fn read_deposed(
        &self,
        addr: &ResourceAddr,
        key: &DeposedKey,
    ) -> Result<Option<ResourceInstanceObject>> {
        Ok(self
            .instances
            .get(addr)
            .and_then(|record| record.deposed.get(key).cloned()))
    }

    async fn write_deposed(
        &self,
        addr: &ResourceAddr,
        key: &DeposedKey,
        object: Option<ResourceInstanceObject>,
    ) -> Result<()> {
        match self.instances.entry(addr.clone()) {
            Entry::Occupied(mut entry) => {
                match object {
                    Some(object) => {
                        entry.get_mut().deposed.insert(key.clone(), object);
                    }
                    None => {
                        entry.get_mut().deposed.remove(key);
                        debug!(%addr, %key, "pruned deposed object");
                    }
                }
                if entry.get().is_empty() {
                    entry.remove();
                }
            }
            Entry::Vacant(entry) => {
                if let Some(object) = object {
                    let mut deposed = HashMap::new();
                    deposed.insert(key.clone(), object);
                    entry.insert(InstanceRecord {
                        current: None,
                        deposed,
                    });
                }
            }
        }
        Ok(())
    }

    async fn depose_current(
        &self,
        addr: &ResourceAddr,
        preallocated: Option<DeposedKey>,
    ) -> Result<Option<DeposedKey>> {
        let Entry::Occupied(mut entry) = self.instances.entry(addr.clone()) else {
            return Ok(None);
        };
        let record = entry.get_mut();
        if record.current.is_none() {
            return Ok(None);
        }

        let key = match preallocated {
            // A preallocated key must still be unused when the object is
            // filed; refusing the collision keeps the earlier object on
            // record.
            Some(key) => {
                if record.deposed.contains_key(&key) {
                    return Err(InvariantError::DeposedKeyInUse {
                        addr: addr.clone(),
                        key,
                    }
                    .into());
                }
                key
            }
            None => {
                let mut key = DeposedKey::generate();
                while record.deposed.contains_key(&key) {
                    key = DeposedKey::generate();
                }
                key
            }
        };
        let Some(object) = record.current.take() else {
            return Ok(None);
        };
        record.deposed.insert(key.clone(), object);
        debug!(%addr, %key, "deposed current object");
        Ok(Some(key))
    }

    async fn deposed_keys(&self, addr: &ResourceAddr) -> Result<Vec<DeposedKey>> {
        let mut keys: Vec<DeposedKey> = self
            .instances
            .get(addr)
            .map(|record| record.deposed.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort_unstable();
        Ok(keys)
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
