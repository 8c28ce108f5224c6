//! Asset Pipeline Tests
//!
//! Tests for:
//! - Format detection from URLs
//! - Graph queries: exact and loose mesh lookup, combined bounds
//! - Normalization: FBX unit scale + recentering, data-driven glTF fixes
//! - Handle-keyed storage: add/get/remove/clear, uuid lookup, stale handles
//! - Image decoding

use glam::{Affine3A, Quat, Vec3};
use vitrine::assets::{
    decode_image, AssetFormat, AssetGraph, AssetNode, AssetStorage, Assets, ColorSpace,
    GeometryHandle,
};
use vitrine::product::OrientationFix;
use vitrine::resources::{Geometry, TextureFormat};

fn triangle(name: &str, size: f32) -> Geometry {
    let mut geometry = Geometry::new(name);
    geometry.positions = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(size, 0.0, 0.0),
        Vec3::new(0.0, size, 0.0),
    ];
    geometry
}

fn mesh_node(name: &str, transform: Affine3A, size: f32) -> AssetNode {
    AssetNode::new(name.to_string(), transform, Some(triangle(name, size)))
}

// ============================================================================
// Format Detection
// ============================================================================

#[test]
fn format_detects_by_suffix() {
    assert_eq!(AssetFormat::from_path("shed.fbx").unwrap(), AssetFormat::Fbx);
    assert_eq!(AssetFormat::from_path("shed.glb").unwrap(), AssetFormat::Gltf);
    assert_eq!(AssetFormat::from_path("shed.gltf").unwrap(), AssetFormat::Gltf);
    assert_eq!(AssetFormat::from_path("SHED.FBX").unwrap(), AssetFormat::Fbx);
}

#[test]
fn format_ignores_query_and_fragment() {
    assert_eq!(
        AssetFormat::from_path("https://cdn.example.com/shed.glb?v=3#frag").unwrap(),
        AssetFormat::Gltf
    );
}

#[test]
fn format_rejects_unknown_suffix() {
    assert!(AssetFormat::from_path("shed.obj").is_err());
    assert!(AssetFormat::from_path("shed").is_err());
}

// ============================================================================
// Graph Queries
// ============================================================================

#[test]
fn graph_find_exact_is_case_sensitive() {
    let mut graph = AssetGraph::new(AssetFormat::Gltf);
    graph.nodes.push(mesh_node("Door_A", Affine3A::IDENTITY, 1.0));

    assert!(graph.find_exact("Door_A").is_some());
    assert!(graph.find_exact("door_a").is_none());
    assert!(graph.find_exact("Door").is_none());
}

#[test]
fn graph_find_fuzzy_ignores_case_and_separators() {
    let mut graph = AssetGraph::new(AssetFormat::Gltf);
    graph.nodes.push(mesh_node("doorA_mesh", Affine3A::IDENTITY, 1.0));

    assert!(graph.find_fuzzy("Door_A").is_some());
    assert!(graph.find_fuzzy("door a").is_some());
    assert!(graph.find_fuzzy("Door_B").is_none());
    assert!(graph.find_fuzzy("").is_none());
}

#[test]
fn graph_lookups_skip_non_mesh_nodes() {
    let mut graph = AssetGraph::new(AssetFormat::Gltf);
    graph
        .nodes
        .push(AssetNode::new("Door_A".to_string(), Affine3A::IDENTITY, None));

    assert!(graph.find_exact("Door_A").is_none());
    assert!(graph.find_fuzzy("Door_A").is_none());
    assert_eq!(graph.mesh_count(), 0);
}

#[test]
fn graph_mesh_indices_follow_file_order() {
    let mut graph = AssetGraph::new(AssetFormat::Gltf);
    graph.nodes.push(mesh_node("A", Affine3A::IDENTITY, 1.0));
    graph
        .nodes
        .push(AssetNode::new("Pivot".to_string(), Affine3A::IDENTITY, None));
    graph.nodes.push(mesh_node("B", Affine3A::IDENTITY, 1.0));

    let indices: Vec<usize> = graph.mesh_indices().collect();
    assert_eq!(indices, vec![0, 2]);
}

#[test]
fn graph_combined_bounds_of_empty_graph_is_empty() {
    let graph = AssetGraph::new(AssetFormat::Gltf);
    assert!(graph.combined_bounds().is_empty());
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn normalize_fbx_scales_to_meters_and_recenters() {
    let mut graph = AssetGraph::new(AssetFormat::Fbx);
    // Centimeter-scale triangle sitting 100cm off origin.
    graph.nodes.push(mesh_node(
        "Hull",
        Affine3A::from_translation(Vec3::new(100.0, 0.0, 0.0)),
        100.0,
    ));

    graph.normalize(None);

    let bounds = graph.combined_bounds();
    let size = bounds.size();
    assert!((size.x - 1.0).abs() < 1e-4, "100cm becomes 1m, got {}", size.x);
    assert!((size.y - 1.0).abs() < 1e-4);

    let center = bounds.center();
    assert!(center.length() < 1e-4, "Bounds recentered at origin, got {center}");
}

#[test]
fn normalize_gltf_applies_declared_fix() {
    let mut graph = AssetGraph::new(AssetFormat::Gltf);
    graph.nodes.push(mesh_node(
        "Hull",
        Affine3A::from_translation(Vec3::new(0.0, 0.0, 5.0)),
        1.0,
    ));

    let fix = OrientationFix {
        rotation_x: -std::f32::consts::FRAC_PI_2,
        position_y: -1.0,
    };
    graph.normalize(Some(&fix));

    // Rotating (0, 0, 5) by -90 degrees around X lands on (0, 5, 0);
    // the vertical offset then shifts it to (0, 4, 0).
    let translation = graph.nodes[0].transform.translation;
    assert!((translation.x - 0.0).abs() < 1e-4);
    assert!((translation.y - 4.0).abs() < 1e-4);
    assert!((translation.z - 0.0).abs() < 1e-4);
}

#[test]
fn normalize_gltf_without_fix_is_identity() {
    let original = Affine3A::from_rotation_translation(
        Quat::from_rotation_y(0.5),
        Vec3::new(1.0, 2.0, 3.0),
    );
    let mut graph = AssetGraph::new(AssetFormat::Gltf);
    graph.nodes.push(mesh_node("Hull", original, 1.0));

    graph.normalize(None);

    assert_eq!(graph.nodes[0].transform, original);
}

// ============================================================================
// Handle-Keyed Storage
// ============================================================================

#[test]
fn storage_add_and_get() {
    let storage: AssetStorage<GeometryHandle, Geometry> = AssetStorage::new();
    let handle = storage.add(triangle("Hull", 1.0));

    let fetched = storage.get(handle).unwrap();
    assert_eq!(fetched.name, "Hull");
    assert_eq!(storage.len(), 1);
    assert!(!storage.is_empty());
}

#[test]
fn storage_get_returns_shared_instance() {
    let storage: AssetStorage<GeometryHandle, Geometry> = AssetStorage::new();
    let handle = storage.add(triangle("Hull", 1.0));

    let a = storage.get(handle).unwrap();
    let b = storage.get(handle).unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}

#[test]
fn storage_uuid_lookup() {
    let storage: AssetStorage<GeometryHandle, Geometry> = AssetStorage::new();
    let geometry = triangle("Hull", 1.0);
    let uuid = geometry.uuid;
    let handle = storage.add_with_uuid(uuid, geometry);

    assert_eq!(storage.get_handle_by_uuid(&uuid), Some(handle));
    assert_eq!(storage.get_by_uuid(&uuid).unwrap().name, "Hull");
}

#[test]
fn storage_remove_invalidates_handle() {
    let storage: AssetStorage<GeometryHandle, Geometry> = AssetStorage::new();
    let handle = storage.add(triangle("Hull", 1.0));

    assert!(storage.remove(handle).is_some());
    assert!(storage.get(handle).is_none());
    assert!(storage.remove(handle).is_none(), "Double remove is a no-op");
    assert_eq!(storage.len(), 0);
}

#[test]
fn storage_clear_invalidates_all_handles() {
    let assets = Assets::new();
    let g = assets.geometries.add(triangle("Hull", 1.0));
    let t = assets
        .textures
        .add(vitrine::resources::Texture::create_solid_color("w", [255; 4]));

    assets.clear_all();

    assert!(assets.geometries.get(g).is_none());
    assert!(assets.textures.get(t).is_none());
    assert!(assets.geometries.is_empty());
    assert!(assets.textures.is_empty());
}

// ============================================================================
// Image Decoding
// ============================================================================

#[test]
fn decode_image_produces_rgba_pixels() {
    let mut png = Vec::new();
    let source = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
    source
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&png, ColorSpace::Srgb, "test.png").unwrap();
    assert_eq!(decoded.width(), 2);
    assert_eq!(decoded.height(), 1);
    assert_eq!(decoded.format(), TextureFormat::Rgba8UnormSrgb);
    decoded.with_data(|data| {
        assert_eq!(data.unwrap(), &[255, 0, 0, 255, 0, 255, 0, 255]);
    });
}

#[test]
fn decode_image_linear_color_space_changes_format_only() {
    let mut png = Vec::new();
    let source = image::RgbaImage::from_raw(1, 1, vec![10, 20, 30, 255]).unwrap();
    source
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&png, ColorSpace::Linear, "rough.png").unwrap();
    assert_eq!(decoded.format(), TextureFormat::Rgba8Unorm);
    decoded.with_data(|data| {
        assert_eq!(data.unwrap(), &[10, 20, 30, 255]);
    });
}

#[test]
fn decode_image_rejects_garbage() {
    assert!(decode_image(&[0, 1, 2, 3], ColorSpace::Srgb, "junk.bin").is_err());
}
