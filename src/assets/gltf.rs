//! glTF / GLB loading.
//!
//! Parses the document, resolves external and embedded buffers through the
//! session's reader, and flattens the default scene into an [`AssetGraph`]
//! with world transforms baked in. Only what the binding pass needs is
//! extracted: node names, transforms, and triangle geometry.

use base64::Engine as _;
use glam::{Affine3A, Mat4, Vec2, Vec3};

use crate::assets::graph::{AssetFormat, AssetGraph, AssetNode};
use crate::assets::io::AssetReaderVariant;
use crate::errors::{Result, ViewerError};
use crate::resources::geometry::Geometry;

/// Loads a glTF or GLB model into a raw (un-normalized) [`AssetGraph`].
pub async fn load(reader: &AssetReaderVariant, url: &str) -> Result<AssetGraph> {
    let bytes = reader.read_bytes(url).await?;
    let gltf = gltf::Gltf::from_slice_without_validation(&bytes)?;
    let buffers = load_buffers(&gltf, reader, url).await?;

    // Geometry extraction is pure CPU work; keep it off the loader tasks.
    tokio::task::spawn_blocking(move || extract_graph(&gltf, &buffers)).await?
}

/// Resolves every buffer of the document: the GLB binary chunk, base64
/// data URIs, and sibling files fetched relative to the model's location.
async fn load_buffers(
    gltf: &gltf::Gltf,
    reader: &AssetReaderVariant,
    model_url: &str,
) -> Result<Vec<Vec<u8>>> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.to_vec());
                } else {
                    return Err(ViewerError::GltfError("Missing GLB binary chunk".into()));
                }
            }
            gltf::buffer::Source::Uri(uri) => {
                if let Some(encoded) = uri.strip_prefix("data:") {
                    let payload = encoded.split_once(";base64,").map(|(_, p)| p).ok_or_else(
                        || ViewerError::DataUriError(format!("Unsupported data URI in {model_url}")),
                    )?;
                    buffer_data.push(base64::engine::general_purpose::STANDARD.decode(payload)?);
                } else {
                    let data = reader.read_bytes(&sibling_uri(model_url, uri)).await?;
                    buffer_data.push(data);
                }
            }
        }
    }
    Ok(buffer_data)
}

/// Rewrites a URI found inside a model file to be relative to the same
/// root the model itself was fetched from.
fn sibling_uri(model_url: &str, uri: &str) -> String {
    match model_url.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{uri}"),
        None => uri.to_string(),
    }
}

fn extract_graph(gltf: &gltf::Gltf, buffers: &[Vec<u8>]) -> Result<AssetGraph> {
    let mut graph = AssetGraph::new(AssetFormat::Gltf);

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| ViewerError::GltfError("Document contains no scene".into()))?;

    for node in scene.nodes() {
        visit_node(&node, Affine3A::IDENTITY, buffers, &mut graph)?;
    }
    Ok(graph)
}

fn visit_node(
    node: &gltf::Node,
    parent: Affine3A,
    buffers: &[Vec<u8>],
    graph: &mut AssetGraph,
) -> Result<()> {
    let local = Affine3A::from_mat4(Mat4::from_cols_array_2d(&node.transform().matrix()));
    let world = parent * local;

    let name = node
        .name()
        .map_or_else(|| format!("Node_{}", node.index()), str::to_string);

    let geometry = match node.mesh() {
        Some(mesh) => Some(extract_mesh(&mesh, buffers, &name)?),
        None => None,
    };

    graph.nodes.push(AssetNode::new(name, world, geometry));

    for child in node.children() {
        visit_node(&child, world, buffers, graph)?;
    }
    Ok(())
}

/// Concatenates all primitives of a mesh into one [`Geometry`].
///
/// Primitive vertex streams are appended; indices are rebased onto the
/// combined vertex range and synthesized for non-indexed primitives so the
/// result is uniformly indexed. Missing normal/uv streams are zero-padded
/// to keep attribute lengths consistent across primitives.
fn extract_mesh(mesh: &gltf::Mesh, buffers: &[Vec<u8>], name: &str) -> Result<Geometry> {
    let mut geometry = Geometry::new(name);
    let mut indices: Vec<u32> = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "Skipping non-triangle primitive in mesh '{name}' (mode {:?})",
                primitive.mode()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .map(Iterator::collect)
            .unwrap_or_default();
        if positions.is_empty() {
            continue;
        }

        let base = u32::try_from(geometry.positions.len())
            .map_err(|_| ViewerError::GltfError(format!("Mesh '{name}' exceeds u32 vertices")))?;
        let count = positions.len();

        geometry
            .positions
            .extend(positions.into_iter().map(Vec3::from_array));

        if let Some(iter) = reader.read_normals() {
            geometry.normals.extend(iter.map(Vec3::from_array));
        } else {
            geometry
                .normals
                .extend(std::iter::repeat_n(Vec3::ZERO, count));
        }

        if let Some(iter) = reader.read_tex_coords(0).map(|r| r.into_f32()) {
            geometry.uvs.extend(iter.map(Vec2::from_array));
        } else {
            geometry.uvs.extend(std::iter::repeat_n(Vec2::ZERO, count));
        }

        match reader.read_indices() {
            Some(iter) => indices.extend(iter.into_u32().map(|i| base + i)),
            None => indices.extend((0..u32::try_from(count).unwrap_or(0)).map(|i| base + i)),
        }
    }

    geometry.indices = Some(indices);
    Ok(geometry)
}
