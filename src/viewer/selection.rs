//! Current-node tracking for the material editing flow.

use crate::assets::Assets;
use crate::scene::{NodeHandle, SceneGraph};

/// Tracks which pivot the user is editing.
///
/// At most one pivot is current. Only pivots qualify: the lookup runs over
/// direct children of the root, never over variant meshes. The handle goes
/// stale naturally on rebuild, so a forgotten clear cannot leak an edit
/// into the next product.
#[derive(Debug, Default)]
pub struct CurrentTracker {
    current: Option<NodeHandle>,
}

impl CurrentTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the pivot named `node_id` current and reports the name of its
    /// active material. `None` (or an unmatched id) clears the current
    /// node and reports nothing.
    pub fn set_current(
        &mut self,
        scene: &SceneGraph,
        assets: &Assets,
        node_id: Option<&str>,
    ) -> Option<String> {
        self.current = None;

        let pivot = scene.find_pivot(node_id?)?;
        self.current = Some(pivot);

        let material = scene.node(pivot)?.material?;
        let material = assets.materials.get(material)?;
        let name = material.read().name.clone();
        Some(name)
    }

    /// Handle of the current pivot, if it still exists in `scene`.
    #[must_use]
    pub fn current(&self, scene: &SceneGraph) -> Option<NodeHandle> {
        self.current.filter(|&h| scene.node(h).is_some())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
