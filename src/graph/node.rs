//! Graph node surface.
//!
//! The graph walker itself lives in the embedding host; this module defines
//! the surface it drives nodes through. Capabilities a node may carry beyond
//! plain execution (destroying an object, deposing an object) are discovered
//! through explicit accessor methods on the trait object rather than
//! downcasting.

use async_trait::async_trait;

use crate::addrs::ResourceAddr;
use crate::error::Result;
use crate::eval::EvalContext;

use super::deposer::Deposer;

/// Trait for nodes a graph walker can execute.
#[async_trait]
pub trait GraphNode: Send + Sync {
    /// Diagnostic name shown in logs and graph visualizations.
    fn name(&self) -> String;

    /// Addresses other nodes may reference this node by.
    fn referenceable_addrs(&self) -> Vec<ResourceAddr> {
        Vec::new()
    }

    /// Addresses this node references.
    fn references(&self) -> Vec<ResourceAddr> {
        Vec::new()
    }

    /// Runs the node's pipeline under the walker-provided context.
    async fn execute(&self, ctx: &mut EvalContext) -> Result<()>;

    /// Returns the destroyer capability when this node destroys an object.
    fn as_destroyer(&self) -> Option<&dyn Destroyer> {
        None
    }

    /// Returns the deposer capability when this node may depose an object
    /// during its own apply.
    fn as_deposer(&self) -> Option<&dyn Deposer> {
        None
    }
}

/// Capability of nodes that destroy a resource instance object.
pub trait Destroyer: Send + Sync {
    /// The instance address this node will destroy.
    fn destroy_addr(&self) -> &ResourceAddr;

    /// Whether the destroy is ordered after its replacement's create.
    fn create_before_destroy(&self) -> bool;

    /// Overrides the create-before-destroy ordering.
    ///
    /// Nodes whose ordering is structural rather than configured reject the
    /// override with an invariant error.
    fn set_create_before_destroy(&self, enabled: bool) -> Result<()>;
}
