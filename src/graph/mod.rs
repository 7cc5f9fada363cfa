//! Graph node surface and the deposed lifecycle node.
//!
//! The walker that schedules nodes lives in the embedding host. This module
//! defines what it walks: the node trait, the capability traits it discovers
//! through the node, and the node managing deposed objects.

mod deposed;
mod deposer;
mod node;

pub use deposed::DeposedInstanceNode;
pub use deposer::{DeposedKeyAllocator, Deposer};
pub use node::{Destroyer, GraphNode};
