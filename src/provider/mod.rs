//! Provider integration surface.
//!
//! This module defines how the executor talks to infrastructure providers:
//! the gateway trait each provider implements, the schema a provider
//! advertises, and the registry pipelines resolve gateways through.

mod gateway;
mod registry;
mod schema;

#[cfg(test)]
pub(crate) mod fake;

pub use gateway::{ApplyResponse, ProviderGateway};
pub use registry::ProviderRegistry;
pub use schema::{ProviderSchema, ResourceTypeSchema};
