//! Binding resolver.
//!
//! Reconciles the declarative product description against the meshes that
//! actually exist in the loaded asset, producing the runtime pivot/variant
//! graph and the initial selection records. Matching degrades gracefully:
//! exact name first, loose match second, dropped candidate third, and a
//! whole-graph fallback when nothing matched at all.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::assets::graph::AssetGraph;
use crate::assets::{Assets, GeometryHandle};
use crate::product::ProductDescription;
use crate::scene::{Node, NodeHandle, SceneGraph};

/// One entry of the current-selection output: which mesh id is meant to be
/// visible under which pivot. Mirrors the JSON the surrounding UI consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRecord {
    pub node_id: String,
    pub mesh_id: String,
}

/// What structural resolution produced.
#[derive(Debug)]
pub struct ResolveOutcome {
    /// One record per configurable node, or a single synthetic record when
    /// the fallback path ran.
    pub selection: Vec<SelectionRecord>,
    /// True when no candidate matched and every asset mesh was attached
    /// under one synthetic pivot instead.
    pub used_fallback: bool,
}

/// Builds the runtime scene graph for `product` from a loaded asset.
///
/// The scene is rebuilt from scratch: one pivot per node spec (attached even
/// when none of its candidates match), one variant mesh per matched
/// candidate, visibility preset to the node spec's default mesh. Candidate ids
/// are matched exactly first, then by loose containment; misses are logged
/// and skipped. Duplicate candidate references share one stored geometry.
pub fn resolve(
    scene: &mut SceneGraph,
    assets: &Assets,
    asset_graph: &mut AssetGraph,
    product: &ProductDescription,
) -> ResolveOutcome {
    scene.clear();

    let mut interned: FxHashMap<usize, GeometryHandle> = FxHashMap::default();
    let mut variants_created = 0usize;

    for spec in &product.nodes {
        let pivot = scene.add_node(Node::new(spec.id.as_str()), scene.root());

        for candidate in &spec.candidate_meshes {
            let found = asset_graph.find_exact(&candidate.id).or_else(|| {
                let fuzzy = asset_graph.find_fuzzy(&candidate.id);
                if let Some(index) = fuzzy {
                    log::debug!(
                        "Candidate '{}' matched '{}' by loose lookup",
                        candidate.id,
                        asset_graph.nodes[index].name
                    );
                }
                fuzzy
            });

            let Some(index) = found else {
                log::debug!(
                    "Candidate mesh '{}' not found in asset, dropping it",
                    candidate.id
                );
                continue;
            };

            let visible = candidate.id == spec.default_mesh;
            if attach_variant(
                scene,
                assets,
                asset_graph,
                &mut interned,
                pivot,
                candidate.id.clone(),
                index,
                visible,
            ) {
                variants_created += 1;
            }
        }
    }

    if variants_created == 0 {
        return resolve_fallback(scene, assets, asset_graph, product, &mut interned);
    }

    let selection = product
        .nodes
        .iter()
        .map(|spec| SelectionRecord {
            node_id: spec.id.clone(),
            mesh_id: spec.default_mesh.clone(),
        })
        .collect();

    ResolveOutcome {
        selection,
        used_fallback: false,
    }
}

/// Nothing matched: throw the declared structure away and expose the whole
/// asset under one pivot, everything visible, so the user at least sees the
/// model they loaded.
fn resolve_fallback(
    scene: &mut SceneGraph,
    assets: &Assets,
    asset_graph: &mut AssetGraph,
    product: &ProductDescription,
    interned: &mut FxHashMap<usize, GeometryHandle>,
) -> ResolveOutcome {
    log::warn!("No candidate mesh matched the asset, falling back to all meshes");
    scene.clear();

    let pivot_name = product
        .nodes
        .first()
        .map_or("default", |spec| spec.id.as_str())
        .to_string();
    let pivot = scene.add_node(Node::new(pivot_name.as_str()), scene.root());

    let mut first_mesh: Option<String> = None;
    let mesh_indices: Vec<usize> = asset_graph.mesh_indices().collect();
    for index in mesh_indices {
        let name = asset_graph.nodes[index].name.clone();
        if attach_variant(
            scene,
            assets,
            asset_graph,
            interned,
            pivot,
            name.clone(),
            index,
            true,
        ) && first_mesh.is_none()
        {
            first_mesh = Some(name);
        }
    }

    let selection = match first_mesh {
        Some(mesh_id) => vec![SelectionRecord {
            node_id: pivot_name,
            mesh_id,
        }],
        None => {
            log::warn!("Asset contains no meshes at all");
            Vec::new()
        }
    };

    ResolveOutcome {
        selection,
        used_fallback: true,
    }
}

/// Attaches one variant mesh under `pivot`. The asset node's geometry is
/// moved into storage on first use and shared by handle afterwards, so two
/// candidates referencing the same asset mesh stay one buffer.
#[allow(clippy::too_many_arguments)]
fn attach_variant(
    scene: &mut SceneGraph,
    assets: &Assets,
    asset_graph: &mut AssetGraph,
    interned: &mut FxHashMap<usize, GeometryHandle>,
    pivot: NodeHandle,
    name: String,
    index: usize,
    visible: bool,
) -> bool {
    let handle = match interned.get(&index) {
        Some(&handle) => handle,
        None => {
            let Some(geometry) = asset_graph.nodes[index].geometry.take() else {
                log::warn!("Asset node '{name}' lost its geometry, skipping");
                return false;
            };
            let handle = assets.geometries.add(geometry);
            interned.insert(index, handle);
            handle
        }
    };

    let mut node = Node::new(name);
    node.transform = asset_graph.nodes[index].transform;
    node.visible = visible;
    node.geometry = Some(handle);
    node.cast_shadow = true;
    node.receive_shadow = true;
    scene.add_node(node, pivot);
    true
}
