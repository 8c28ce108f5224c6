//! FBX 7.x binary loading.
//!
//! Walks the raw node tree directly: `Objects > Geometry` for vertex data,
//! `Objects > Model` for names and local transforms, `Connections` to
//! attach geometry to models and models to their parents. Polygons are fan
//! triangulated. Normals and UV layers are left to the embedding renderer;
//! binding only needs names, transforms and positions.

use fbxcel::low::v7400::AttributeValue;
use fbxcel::tree::v7400::NodeHandle;
use glam::{Affine3A, EulerRot, Quat, Vec3};
use rustc_hash::FxHashMap;
use std::io::Cursor;

use crate::assets::graph::{AssetFormat, AssetGraph, AssetNode};
use crate::assets::io::AssetReaderVariant;
use crate::errors::{Result, ViewerError};
use crate::resources::geometry::Geometry;

/// Loads an FBX model into a raw (un-normalized) [`AssetGraph`].
pub async fn load(reader: &AssetReaderVariant, url: &str) -> Result<AssetGraph> {
    let bytes = reader.read_bytes(url).await?;
    tokio::task::spawn_blocking(move || parse(&bytes)).await?
}

struct RawModel {
    name: String,
    transform: Affine3A,
}

fn parse(bytes: &[u8]) -> Result<AssetGraph> {
    let tree = match fbxcel::tree::any::AnyTree::from_seekable_reader(Cursor::new(bytes))
        .map_err(|e| ViewerError::FbxError(format!("Failed to parse FBX: {e}")))?
    {
        fbxcel::tree::any::AnyTree::V7400(_, tree, _) => tree,
        other => {
            return Err(ViewerError::FbxError(format!(
                "Unsupported FBX version {:?}",
                other.fbx_version()
            )));
        }
    };
    let root = tree.root();

    let mut geometries: FxHashMap<i64, Geometry> = FxHashMap::default();
    let mut models: FxHashMap<i64, RawModel> = FxHashMap::default();
    let mut model_order: Vec<i64> = Vec::new();

    for objects in root.children_by_name("Objects") {
        for object in objects.children() {
            match object.name() {
                "Geometry" => {
                    if let Some((id, geometry)) = parse_geometry(&object) {
                        geometries.insert(id, geometry);
                    }
                }
                "Model" => {
                    if let Some((id, model)) = parse_model(&object) {
                        models.insert(id, model);
                        model_order.push(id);
                    }
                }
                _ => {}
            }
        }
    }

    // Connections: child object -> parent object ("OO" links only)
    let mut parents: FxHashMap<i64, i64> = FxHashMap::default();
    let mut geometry_of: FxHashMap<i64, i64> = FxHashMap::default();

    for connections in root.children_by_name("Connections") {
        for connection in connections.children_by_name("C") {
            let attrs = connection.attributes();
            let kind = attrs.first().and_then(AttributeValue::get_string);
            let child = attrs.get(1).and_then(AttributeValue::get_i64);
            let parent = attrs.get(2).and_then(AttributeValue::get_i64);
            let (Some("OO"), Some(child), Some(parent)) = (kind, child, parent) else {
                continue;
            };

            if geometries.contains_key(&child) && models.contains_key(&parent) {
                geometry_of.insert(parent, child);
            } else if models.contains_key(&child) {
                parents.insert(child, parent);
            }
        }
    }

    // World transforms, walking up the model parent chain
    let mut worlds: FxHashMap<i64, Affine3A> = FxHashMap::default();
    for &id in &model_order {
        resolve_world(id, &models, &parents, &mut worlds);
    }

    let mut graph = AssetGraph::new(AssetFormat::Fbx);
    for id in model_order {
        let Some(model) = models.get(&id) else {
            continue;
        };
        let world = worlds.get(&id).copied().unwrap_or(Affine3A::IDENTITY);
        let geometry = geometry_of.get(&id).and_then(|gid| {
            let mut geometry = geometries.remove(gid)?;
            geometry.name = model.name.clone();
            Some(geometry)
        });
        graph
            .nodes
            .push(AssetNode::new(model.name.clone(), world, geometry));
    }

    if graph.nodes.is_empty() {
        return Err(ViewerError::FbxError("File contains no model nodes".into()));
    }
    Ok(graph)
}

fn resolve_world(
    id: i64,
    models: &FxHashMap<i64, RawModel>,
    parents: &FxHashMap<i64, i64>,
    worlds: &mut FxHashMap<i64, Affine3A>,
) -> Affine3A {
    if let Some(world) = worlds.get(&id) {
        return *world;
    }
    let local = models.get(&id).map_or(Affine3A::IDENTITY, |m| m.transform);
    let world = match parents.get(&id) {
        Some(parent) if models.contains_key(parent) => {
            resolve_world(*parent, models, parents, worlds) * local
        }
        _ => local,
    };
    worlds.insert(id, world);
    world
}

/// `Objects > Geometry`: id, `Vertices` (f64 triples) and
/// `PolygonVertexIndex` (negative value terminates a polygon).
fn parse_geometry(node: &NodeHandle) -> Option<(i64, Geometry)> {
    let attrs = node.attributes();
    let id = attrs.first().and_then(AttributeValue::get_i64)?;
    let class = attrs.get(2).and_then(AttributeValue::get_string);
    if class != Some("Mesh") {
        return None;
    }

    let vertices = node
        .children_by_name("Vertices")
        .next()
        .and_then(|n| n.attributes().first().and_then(AttributeValue::get_arr_f64).map(<[f64]>::to_vec))?;
    let polygon_index = node
        .children_by_name("PolygonVertexIndex")
        .next()
        .and_then(|n| n.attributes().first().and_then(AttributeValue::get_arr_i32).map(<[i32]>::to_vec))?;

    let mut geometry = Geometry::new("");
    geometry.positions = vertices
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0] as f32, c[1] as f32, c[2] as f32))
        .collect();
    geometry.indices = Some(triangulate(&polygon_index));

    Some((id, geometry))
}

/// `Objects > Model`: id, `"Name\u{0}\u{1}Model"` and the `Properties70`
/// local transform.
fn parse_model(node: &NodeHandle) -> Option<(i64, RawModel)> {
    let attrs = node.attributes();
    let id = attrs.first().and_then(AttributeValue::get_i64)?;
    let raw_name = attrs.get(1).and_then(AttributeValue::get_string)?;
    let name = raw_name
        .split_once('\u{0}')
        .map_or(raw_name, |(n, _)| n)
        .to_string();

    let mut translation = Vec3::ZERO;
    let mut rotation = Vec3::ZERO;
    let mut scale = Vec3::ONE;

    for properties in node.children_by_name("Properties70") {
        for prop in properties.children_by_name("P") {
            let p_attrs = prop.attributes();
            let Some(prop_name) = p_attrs.first().and_then(AttributeValue::get_string) else {
                continue;
            };
            let Some(value) = read_vec3(p_attrs) else {
                continue;
            };
            match prop_name {
                "Lcl Translation" => translation = value,
                "Lcl Rotation" => rotation = value,
                "Lcl Scaling" => scale = value,
                _ => {}
            }
        }
    }

    let transform = Affine3A::from_scale_rotation_translation(
        scale,
        Quat::from_euler(
            EulerRot::XYZ,
            rotation.x.to_radians(),
            rotation.y.to_radians(),
            rotation.z.to_radians(),
        ),
        translation,
    );

    Some((id, RawModel { name, transform }))
}

/// The trailing three attributes of a `P` property node.
fn read_vec3(attrs: &[AttributeValue]) -> Option<Vec3> {
    if attrs.len() < 7 {
        return None;
    }
    let x = attrs[attrs.len() - 3].get_f64()?;
    let y = attrs[attrs.len() - 2].get_f64()?;
    let z = attrs[attrs.len() - 1].get_f64()?;
    Some(Vec3::new(x as f32, y as f32, z as f32))
}

/// FBX polygons are variable length; a negative index (bitwise NOT of the
/// real value) closes each polygon. Fan triangulation matches what every
/// runtime importer does for convex polygons.
fn triangulate(polygon_vertex_index: &[i32]) -> Vec<u32> {
    let mut triangles = Vec::new();
    let mut polygon: Vec<u32> = Vec::new();

    for &raw in polygon_vertex_index {
        let closing = raw < 0;
        let index = if closing { !raw } else { raw };
        polygon.push(index as u32);

        if closing {
            for i in 1..polygon.len().saturating_sub(1) {
                triangles.push(polygon[0]);
                triangles.push(polygon[i]);
                triangles.push(polygon[i + 1]);
            }
            polygon.clear();
        }
    }
    triangles
}
