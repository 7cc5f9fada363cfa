//! State management for provisioned resource instances.
//!
//! This module records which objects exist for each resource instance
//! address: the current object plus any deposed objects left behind by
//! create-before-destroy replacements, each filed under its own key.

mod fingerprint;
mod memory;
mod repository;
mod types;

pub use fingerprint::ObjectFingerprinter;
pub use memory::MemoryStateStore;
pub use repository::StateRepository;
pub use types::{DeposedKey, Generation, ObjectStatus, ResourceInstanceObject};
