//! Evaluation pipeline.
//!
//! Graph nodes describe their work as an ordered sequence of typed steps
//! sharing one pipeline-scoped context. Sequences compose through operation
//! filters, so a node carries the branches for every walk it participates in
//! and the context's operation kind selects which branch actually runs.

mod context;
mod op;
mod step;
mod steps;

pub use context::EvalContext;
pub use op::OperationKind;
pub use step::{EvalSequence, EvalStep, OpFilter};
pub use steps::{
    AcquireProvider, ApplyChange, DeposeObject, PlanDestroyChange, PostApplyHook, PreApplyHook,
    ReadDeposedObject, RefreshObject, SurfaceDeferred, UpdateStateHook, WriteDeposedObject,
};
