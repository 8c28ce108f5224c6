//! Runtime scene graph for a configured product.
//!
//! The graph is rebuilt from scratch on every product (or quality) load:
//! a single root, one pivot node per configurable slot, and one variant
//! mesh node per candidate under each pivot. Nodes are stored in a slotmap
//! arena; handles stay cheap to copy and die with the product.

pub mod environment;
pub mod graph;
pub mod node;

pub use environment::Environment;
pub use graph::{SceneGraph, ROOT_NAME};
pub use node::Node;

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle into [`SceneGraph::nodes`].
    pub struct NodeHandle;
}
