//! Variant visibility switching.

use crate::binding::SelectionRecord;
use crate::scene::SceneGraph;

/// Re-evaluates the whole selection map: under every named pivot, each
/// variant becomes visible iff its name equals the selected mesh id.
///
/// A record naming a missing pivot is skipped; a mesh id matching no child
/// leaves that pivot entirely hidden. Both are accepted outcomes, the caller
/// still gets its render request.
pub fn apply_selection(scene: &mut SceneGraph, selection: &[SelectionRecord]) {
    for record in selection {
        let Some(pivot) = scene.find_pivot(&record.node_id) else {
            log::warn!("Selection references unknown node '{}'", record.node_id);
            continue;
        };

        let children = scene.children_of(pivot).to_vec();
        let mut any_visible = false;
        for child in children {
            if let Some(node) = scene.node_mut(child) {
                node.visible = node.name == record.mesh_id;
                any_visible |= node.visible;
            }
        }
        if !any_visible {
            log::debug!(
                "Selection '{}' matches no variant under '{}', all hidden",
                record.mesh_id,
                record.node_id
            );
        }
    }
}
