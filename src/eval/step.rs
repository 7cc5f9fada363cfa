//! Evaluation step trait and combinators.

use async_trait::async_trait;
use tracing::trace;

use crate::error::Result;

use super::context::EvalContext;
use super::op::OperationKind;

/// One unit of pipeline work.
#[async_trait]
pub trait EvalStep: Send + Sync {
    /// Short name for trace logging.
    fn name(&self) -> &'static str;

    /// Evaluates the step against the pipeline context.
    async fn eval(&self, ctx: &mut EvalContext) -> Result<()>;
}

/// Ordered list of steps evaluated strictly in sequence.
///
/// The first step returning an error aborts the remainder. Steps that
/// capture provider failures into [`EvalContext::deferred`] return `Ok`, so
/// later persistence steps still run; the stored failure is surfaced by
/// [`super::steps::SurfaceDeferred`].
#[derive(Default)]
pub struct EvalSequence {
    steps: Vec<Box<dyn EvalStep>>,
}

impl EvalSequence {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Appends a step.
    #[must_use]
    pub fn with_step<S: EvalStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Checks whether the sequence holds no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[async_trait]
impl EvalStep for EvalSequence {
    fn name(&self) -> &'static str {
        "sequence"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        for step in &self.steps {
            trace!(step = step.name(), "evaluating step");
            step.eval(ctx).await?;
        }
        Ok(())
    }
}

/// Gates an inner step on the pipeline's operation kind.
///
/// When the context's operation is not a member, the inner step is skipped
/// entirely: no repository or provider calls, no hook notifications.
pub struct OpFilter {
    ops: Vec<OperationKind>,
    inner: Box<dyn EvalStep>,
}

impl OpFilter {
    /// Creates a filter admitting the given operation kinds.
    #[must_use]
    pub fn new<S: EvalStep + 'static>(ops: Vec<OperationKind>, inner: S) -> Self {
        Self {
            ops,
            inner: Box::new(inner),
        }
    }
}

#[async_trait]
impl EvalStep for OpFilter {
    fn name(&self) -> &'static str {
        "op-filter"
    }

    async fn eval(&self, ctx: &mut EvalContext) -> Result<()> {
        if self.ops.contains(&ctx.op()) {
            self.inner.eval(ctx).await
        } else {
            trace!(step = self.inner.name(), op = %ctx.op(), "skipped by operation filter");
            Ok(())
        }
    }
}
