// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![forbid(unsafe_code)]               // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Strata
//!
//! Execution core for a declarative infrastructure orchestrator.
//!
//! ## Overview
//!
//! Strata executes the lifecycle of provisioned resource instances. An
//! external graph walker decides *which* nodes run and in what order; this
//! crate provides *what* each node does:
//!
//! - Record state per resource instance: one current object plus any number
//!   of deposed objects left behind by create-before-destroy replacements
//! - Evaluate operation-filtered step pipelines against provider gateways
//! - Persist every outcome before reporting failure, so a destroy that
//!   fails midway never loses track of infrastructure that still exists
//!
//! ## Architecture
//!
//! Work is described as pipelines of typed steps sharing one context per
//! node execution. Provider failures are captured and deferred until after
//! the mandatory state write; repository failures and invariant violations
//! abort immediately.
//!
//! ## Modules
//!
//! - [`addrs`]: Resource instance and provider addressing
//! - [`state`]: State repository, object model, and deposed keys
//! - [`provider`]: Provider gateway trait, schemas, and registry
//! - [`change`]: Computed changes and their actions
//! - [`eval`]: Evaluation steps, sequences, and operation filters
//! - [`graph`]: Graph node surface and the deposed lifecycle node
//! - [`hooks`]: Lifecycle event hooks
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use strata::{MemoryStateStore, ResourceAddr, ResourceInstanceObject, StateRepository};
//!
//! tokio_test::block_on(async {
//!     let store = MemoryStateStore::new();
//!     let addr = ResourceAddr::new("compute_instance", "web");
//!
//!     // A replacement succeeded: file the old object as deposed.
//!     let old = ResourceInstanceObject::ready(json!({"id": "i-0a1b"}));
//!     store.write_current(&addr, Some(old)).await?;
//!     let key = store
//!         .depose_current(&addr, None)
//!         .await?
//!         .expect("there was a current object");
//!
//!     // The deposed object stays filed under its key until destroyed.
//!     assert!(store.read_deposed(&addr, &key).await?.is_some());
//!     assert!(store.read_current(&addr).await?.is_none());
//!     Ok::<(), strata::StrataError>(())
//! })
//! # .unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod addrs;
pub mod change;
pub mod error;
pub mod eval;
pub mod graph;
pub mod hooks;
pub mod provider;
pub mod state;

#[cfg(test)]
mod testutil;

// ============================================================================
// Re-exports
// ============================================================================

pub use addrs::{InstanceIndex, ProviderRef, ResourceAddr};
pub use change::{ChangeAction, ResourceInstanceChange};
pub use error::{InvariantError, ProviderError, Result, StateError, StrataError};
pub use eval::{EvalContext, EvalSequence, EvalStep, OpFilter, OperationKind};
pub use graph::{DeposedInstanceNode, DeposedKeyAllocator, Deposer, Destroyer, GraphNode};
pub use hooks::{Hook, NullHook};
pub use provider::{
    ApplyResponse, ProviderGateway, ProviderRegistry, ProviderSchema, ResourceTypeSchema,
};
pub use state::{
    DeposedKey, Generation, MemoryStateStore, ObjectFingerprinter, ObjectStatus,
    ResourceInstanceObject, StateRepository,
};
