use slotmap::SlotMap;

use crate::assets::Assets;
use crate::resources::BoundingBox;
use crate::scene::node::Node;
use crate::scene::NodeHandle;

/// Name of the synthetic root every product hangs under.
pub const ROOT_NAME: &str = "ModelRoot";

/// Arena-backed scene graph with a single fixed root.
///
/// The root survives [`SceneGraph::clear`]; everything else is rebuilt per
/// product load. Handles from a previous product are invalidated by the
/// slotmap generation, so a stale handle simply resolves to `None`.
pub struct SceneGraph {
    pub nodes: SlotMap<NodeHandle, Node>,
    root: NodeHandle,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(ROOT_NAME));
        Self { nodes, root }
    }

    /// Handle of the fixed root node.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Inserts `node` under `parent`, wiring both directions of the link.
    /// An invalid parent falls back to the root rather than leaving the
    /// node dangling.
    pub fn add_node(&mut self, node: Node, parent: NodeHandle) -> NodeHandle {
        let parent = if self.nodes.contains_key(parent) {
            parent
        } else {
            log::warn!("Parent node no longer exists, attaching to root");
            self.root
        };
        let handle = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        if let Some(c) = self.nodes.get_mut(handle) {
            c.parent = Some(parent);
        }
        handle
    }

    /// Removes a node and its whole subtree. Removing the root is refused.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if handle == self.root {
            log::warn!("Refusing to remove the scene root");
            return;
        }
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        for child in node.children.clone() {
            self.remove_subtree(child);
        }

        let parent = self.nodes.get(handle).and_then(|n| n.parent);
        if let Some(parent) = parent
            && let Some(p) = self.nodes.get_mut(parent)
            && let Some(pos) = p.children.iter().position(|&c| c == handle)
        {
            p.children.remove(pos);
        }
        self.nodes.remove(handle);
    }

    fn remove_subtree(&mut self, handle: NodeHandle) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        for child in node.children.clone() {
            self.remove_subtree(child);
        }
        self.nodes.remove(handle);
    }

    /// Drops every node except the root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(Node::new(ROOT_NAME));
    }

    /// Child handles of `parent`, or an empty slice if it no longer exists.
    #[must_use]
    pub fn children_of(&self, parent: NodeHandle) -> &[NodeHandle] {
        self.nodes.get(parent).map_or(&[], |n| n.children.as_slice())
    }

    /// Finds a direct child of `parent` by exact name.
    #[must_use]
    pub fn find_child(&self, parent: NodeHandle, name: &str) -> Option<NodeHandle> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|&c| self.nodes.get(c).is_some_and(|n| n.name == name))
    }

    /// Finds a pivot, i.e. a direct child of the root, by exact name.
    #[inline]
    #[must_use]
    pub fn find_pivot(&self, name: &str) -> Option<NodeHandle> {
        self.find_child(self.root, name)
    }

    /// Pivot handles in insertion order.
    #[must_use]
    pub fn pivots(&self) -> &[NodeHandle] {
        self.children_of(self.root)
    }

    /// Number of nodes, the root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Union of the world-space bounds of every mesh node, visible or not.
    /// Camera fitting runs on this so a product keeps its framing when the
    /// user flips variants.
    #[must_use]
    pub fn compute_bounds(&self, assets: &Assets) -> BoundingBox {
        let mut bounds = BoundingBox::EMPTY;
        for node in self.nodes.values() {
            let Some(handle) = node.geometry else {
                continue;
            };
            let Some(geometry) = assets.geometries.get(handle) else {
                continue;
            };
            let local = geometry.compute_bounding_box();
            bounds = bounds.union(&local.transform(&node.transform));
        }
        bounds
    }
}
