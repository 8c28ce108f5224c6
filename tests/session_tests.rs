//! Viewer Session Tests
//!
//! End-to-end tests driving [`ViewerSession`] against on-disk fixtures:
//! - Product load: resolution, selection, camera fit, render requests
//! - Declared material records streaming in after the model
//! - Selection switching and current-node editing
//! - Failure paths: missing files leave a consistent empty state
//! - Generation guard: a newer load wins over in-flight events
//! - Quality switching rebuilds from the matching model file

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use base64::Engine as _;
use vitrine::binding::SelectionRecord;
use vitrine::product::MaterialRecord;
use vitrine::ViewerSession;

// ============================================================================
// Fixtures
// ============================================================================

/// Fresh fixture directory for one test, under the system temp dir.
fn fixture_dir(test: &str) -> PathBuf {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = std::env::temp_dir().join(format!("vitrine-session-{}-{test}", std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

/// Base64 data URI with one triangle's positions (nine little-endian f32).
fn triangle_buffer_uri() -> String {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let mut bytes = Vec::with_capacity(36);
    for v in positions {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Minimal self-contained glTF document where every named node carries the
/// same triangle mesh.
fn gltf_with_meshes(names: &[&str]) -> String {
    let nodes: Vec<String> = names
        .iter()
        .map(|n| format!(r#"{{"name": "{n}", "mesh": 0}}"#))
        .collect();
    let roots: Vec<String> = (0..names.len()).map(|i| i.to_string()).collect();
    format!(
        r#"{{
        "asset": {{"version": "2.0"}},
        "scene": 0,
        "scenes": [{{"nodes": [{roots}]}}],
        "nodes": [{nodes}],
        "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
        "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}}],
        "bufferViews": [{{"buffer": 0, "byteOffset": 0, "byteLength": 36}}],
        "buffers": [{{"byteLength": 36, "uri": "{uri}"}}]
    }}"#,
        roots = roots.join(", "),
        nodes = nodes.join(", "),
        uri = triangle_buffer_uri()
    )
}

const SHED_PRODUCT: &str = r#"{
    "id": "shed",
    "model": "shed.gltf",
    "nodes": [
        {
            "id": "door",
            "candidateMeshes": [{"id": "Door_A"}, {"id": "Door_B"}],
            "defaultMesh": "Door_B",
            "defaultMaterial": {"name": "Oak", "path": "oak.json"}
        },
        {
            "id": "roof",
            "candidateMeshes": [{"id": "Roof"}],
            "defaultMesh": "Roof"
        }
    ]
}"#;

const OAK_RECORD: &str = r#"{"name": "Oak", "color": "#8b4513", "roughness": 0.8}"#;

/// Writes the standard shed fixture and returns its product path.
fn shed_fixture(test: &str) -> (PathBuf, String) {
    let dir = fixture_dir(test);
    write(&dir, "shed.gltf", &gltf_with_meshes(&["Door_A", "Door_B", "Roof"]));
    write(&dir, "shed.json", SHED_PRODUCT);
    write(&dir, "oak.json", OAK_RECORD);
    let product = dir.join("shed.json").to_str().unwrap().to_string();
    (dir, product)
}

/// Pumps the session until every counted load settles.
fn pump_until_idle(session: &mut ViewerSession) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        session.pump();
        if !session.is_loading() {
            return;
        }
        assert!(Instant::now() < deadline, "Timed out waiting for loads to settle");
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn selected(node_id: &str, mesh_id: &str) -> SelectionRecord {
    SelectionRecord {
        node_id: node_id.to_string(),
        mesh_id: mesh_id.to_string(),
    }
}

fn visible_children(session: &ViewerSession, pivot: &str) -> Vec<String> {
    let scene = session.scene();
    let pivot = scene.find_pivot(pivot).unwrap();
    scene
        .children_of(pivot)
        .iter()
        .filter_map(|&h| scene.node(h))
        .filter(|n| n.visible)
        .map(|n| n.name.clone())
        .collect()
}

// ============================================================================
// Product Load
// ============================================================================

#[test]
fn session_load_builds_scene_and_selection() {
    let (_dir, product) = shed_fixture("load");
    let mut session = ViewerSession::new();

    session.load_product_from(&product).unwrap();
    assert!(session.is_loading(), "The description fetch counts immediately");

    pump_until_idle(&mut session);

    assert_eq!(session.product().unwrap().id, "shed");
    assert!(!session.used_fallback());

    let scene = session.scene();
    let door = scene.find_pivot("door").expect("door pivot");
    assert_eq!(scene.children_of(door).len(), 2);
    assert!(scene.find_pivot("roof").is_some());

    assert_eq!(visible_children(&session, "door"), vec!["Door_B"]);
    assert_eq!(visible_children(&session, "roof"), vec!["Roof"]);

    assert_eq!(
        session.selection(),
        &[selected("door", "Door_B"), selected("roof", "Roof")]
    );
}

#[test]
fn session_load_raises_render_and_camera_fit_requests() {
    let (_dir, product) = shed_fixture("fit");
    let mut session = ViewerSession::new();

    session.load_product_from(&product).unwrap();
    pump_until_idle(&mut session);

    let fit = session.take_camera_fit().expect("camera fit after load");
    assert!(fit.size.max_element() > 0.0);
    assert!(session.take_camera_fit().is_none(), "Fit request is one-shot");

    assert!(session.take_render_request());
    assert!(
        !session.take_render_request(),
        "Batched work coalesces into a single render request"
    );
}

#[test]
fn session_streams_declared_material_records() {
    let (_dir, product) = shed_fixture("records");
    let mut session = ViewerSession::new();

    session.load_product_from(&product).unwrap();
    pump_until_idle(&mut session);

    let scene = session.scene();
    let door = scene.find_pivot("door").unwrap();
    let handle = scene.node(door).unwrap().material.expect("pivot material");

    let material = session.assets().materials.get(handle).unwrap();
    let material = material.read();
    assert_eq!(material.name, "Oak");
    assert!((material.roughness - 0.8).abs() < 1e-5);
    assert!((material.color.x - 139.0 / 255.0).abs() < 1e-5);

    // The pivot and every variant share the one instance.
    for &child in scene.children_of(door) {
        assert_eq!(scene.node(child).unwrap().material, Some(handle));
    }
}

// ============================================================================
// Selection and Current Node
// ============================================================================

#[test]
fn session_set_selection_switches_variants() {
    let (_dir, product) = shed_fixture("selection");
    let mut session = ViewerSession::new();
    session.load_product_from(&product).unwrap();
    pump_until_idle(&mut session);
    session.take_render_request();

    session.set_selection(vec![selected("door", "Door_A"), selected("roof", "Roof")]);

    assert_eq!(visible_children(&session, "door"), vec!["Door_A"]);
    assert!(session.take_render_request(), "Selection raises a redraw");

    // An id matching nothing hides the whole slot, and is kept.
    session.set_selection(vec![selected("door", "Door_Z")]);
    assert!(visible_children(&session, "door").is_empty());
    assert_eq!(session.selection(), &[selected("door", "Door_Z")]);
}

#[test]
fn session_set_current_reports_the_material_name() {
    let (_dir, product) = shed_fixture("current");
    let mut session = ViewerSession::new();
    session.load_product_from(&product).unwrap();
    pump_until_idle(&mut session);

    assert_eq!(session.set_current(Some("door")).as_deref(), Some("Oak"));
    assert!(session.current_node().is_some());

    assert!(session.set_current(None).is_none());
    assert!(session.current_node().is_none());

    assert!(session.set_current(Some("window")).is_none());
    assert!(session.current_node().is_none(), "Unknown ids clear the current node");
}

#[test]
fn session_applies_edits_to_the_current_node() {
    let (_dir, product) = shed_fixture("edit");
    let mut session = ViewerSession::new();
    session.load_product_from(&product).unwrap();
    pump_until_idle(&mut session);

    session.set_current(Some("door"));
    let pine = MaterialRecord {
        name: "Pine".to_string(),
        ..Default::default()
    };
    session.apply_current_material(Some(&pine));

    let scene = session.scene();
    let door = scene.find_pivot("door").unwrap();
    let handle = scene.node(door).unwrap().material.unwrap();
    assert_eq!(session.assets().materials.get(handle).unwrap().read().name, "Pine");

    // No record or no current node: both are accepted no-ops.
    session.apply_current_material(None);
    session.set_current(None);
    let walnut = MaterialRecord {
        name: "Walnut".to_string(),
        ..Default::default()
    };
    session.apply_current_material(Some(&walnut));
    assert_eq!(
        session.assets().materials.get(handle).unwrap().read().name,
        "Pine",
        "Without a current node the edit goes nowhere"
    );
}

#[test]
fn session_applies_records_to_named_nodes() {
    let (_dir, product) = shed_fixture("named");
    let mut session = ViewerSession::new();
    session.load_product_from(&product).unwrap();
    pump_until_idle(&mut session);

    let slate = MaterialRecord {
        name: "Slate".to_string(),
        ..Default::default()
    };
    session.apply_node_material("roof", &slate);
    session.apply_node_material("window", &slate); // unknown: logged, ignored

    let scene = session.scene();
    let roof = scene.find_pivot("roof").unwrap();
    let handle = scene.node(roof).unwrap().material.unwrap();
    assert_eq!(session.assets().materials.get(handle).unwrap().read().name, "Slate");
}

// ============================================================================
// Failure Paths
// ============================================================================

#[test]
fn session_missing_model_leaves_an_empty_scene() {
    let dir = fixture_dir("missing-model");
    write(&dir, "shed.json", r#"{"id": "shed", "model": "nope.gltf"}"#);

    let mut session = ViewerSession::new();
    session
        .load_product_from(dir.join("shed.json").to_str().unwrap())
        .unwrap();
    pump_until_idle(&mut session);

    assert!(session.product().is_some(), "The description itself loaded");
    assert_eq!(session.scene().node_count(), 1, "Only the root remains");
    assert!(session.selection().is_empty());
}

#[test]
fn session_missing_product_description_reports_nothing() {
    let dir = fixture_dir("missing-product");
    let mut session = ViewerSession::new();

    session
        .load_product_from(dir.join("nope.json").to_str().unwrap())
        .unwrap();
    pump_until_idle(&mut session);

    assert!(session.product().is_none());
    assert_eq!(session.scene().node_count(), 1);
}

#[test]
fn session_unmatched_product_falls_back_to_all_meshes() {
    let dir = fixture_dir("fallback");
    write(&dir, "boat.gltf", &gltf_with_meshes(&["Hull", "Mast", "Sail"]));
    write(
        &dir,
        "boat.json",
        r#"{
            "id": "boat",
            "model": "boat.gltf",
            "nodes": [
                {"id": "door", "candidateMeshes": [{"id": "Door_A"}], "defaultMesh": "Door_A"}
            ]
        }"#,
    );

    let mut session = ViewerSession::new();
    session
        .load_product_from(dir.join("boat.json").to_str().unwrap())
        .unwrap();
    pump_until_idle(&mut session);

    assert!(session.used_fallback());
    assert_eq!(
        visible_children(&session, "door"),
        vec!["Hull", "Mast", "Sail"],
        "Every mesh is attached visible under the fallback pivot"
    );
    assert_eq!(session.selection(), &[selected("door", "Hull")]);
    assert!(session.take_camera_fit().is_some(), "Fallback still frames the model");
}

// ============================================================================
// Generation Guard
// ============================================================================

#[test]
fn session_newer_load_wins_over_inflight_events() {
    let dir = fixture_dir("generations");
    write(&dir, "a.gltf", &gltf_with_meshes(&["Door_A"]));
    write(
        &dir,
        "a.json",
        r#"{"id": "a", "model": "a.gltf",
            "nodes": [{"id": "door", "candidateMeshes": [{"id": "Door_A"}], "defaultMesh": "Door_A"}]}"#,
    );
    write(&dir, "b.gltf", &gltf_with_meshes(&["Window"]));
    write(
        &dir,
        "b.json",
        r#"{"id": "b", "model": "b.gltf",
            "nodes": [{"id": "window", "candidateMeshes": [{"id": "Window"}], "defaultMesh": "Window"}]}"#,
    );

    let mut session = ViewerSession::new();
    session
        .load_product_from(dir.join("a.json").to_str().unwrap())
        .unwrap();
    // Replace the load before pumping a single event.
    session
        .load_product_from(dir.join("b.json").to_str().unwrap())
        .unwrap();
    pump_until_idle(&mut session);

    assert_eq!(session.product().unwrap().id, "b");
    assert!(session.scene().find_pivot("window").is_some());
    assert!(
        session.scene().find_pivot("door").is_none(),
        "Nothing from the replaced load may leak through"
    );
}

// ============================================================================
// Quality Switching
// ============================================================================

#[test]
fn session_set_quality_rebuilds_from_the_matching_file() {
    let dir = fixture_dir("quality");
    write(&dir, "high.gltf", &gltf_with_meshes(&["Door_A"]));
    write(&dir, "low.gltf", &gltf_with_meshes(&["LowPoly"]));
    write(
        &dir,
        "shed.json",
        r#"{"id": "shed",
            "model": {"high": "high.gltf", "low": "low.gltf"},
            "nodes": [{"id": "door", "candidateMeshes": [{"id": "Door_A"}], "defaultMesh": "Door_A"}]}"#,
    );

    let mut session = ViewerSession::new();
    session
        .load_product_from(dir.join("shed.json").to_str().unwrap())
        .unwrap();
    pump_until_idle(&mut session);
    assert!(!session.used_fallback(), "The high tier matches the candidate");

    session.set_quality(Some("low"));
    assert!(session.is_loading(), "A tier switch reloads the model");
    pump_until_idle(&mut session);
    assert!(
        session.used_fallback(),
        "The low-poly file has no candidate match, so resolution falls back"
    );

    session.set_quality(Some("low"));
    assert!(!session.is_loading(), "Re-setting the same tier is a no-op");
}

// ============================================================================
// Environment Maps
// ============================================================================

#[test]
fn session_environment_map_reaches_every_material() {
    let dir = fixture_dir("environment");
    write(&dir, "shed.gltf", &gltf_with_meshes(&["Door_A", "Door_B", "Roof"]));
    write(&dir, "oak.json", OAK_RECORD);
    write(
        &dir,
        "shed.json",
        &SHED_PRODUCT.replacen("\"id\": \"shed\",", "\"id\": \"shed\", \"envMap\": \"studio.hdr\",", 1),
    );

    let mut hdr = Vec::new();
    image::codecs::hdr::HdrEncoder::new(&mut hdr)
        .encode(&[image::Rgb([1.0f32, 0.5, 0.25])], 1, 1)
        .unwrap();
    std::fs::write(dir.join("studio.hdr"), hdr).unwrap();

    let mut session = ViewerSession::new();
    session
        .load_product_from(dir.join("shed.json").to_str().unwrap())
        .unwrap();
    pump_until_idle(&mut session);

    assert!(session.environment().has_env_map());
    let env = session.environment().env_map();

    let scene = session.scene();
    for &pivot in scene.pivots() {
        let handle = scene.node(pivot).unwrap().material.unwrap();
        let material = session.assets().materials.get(handle).unwrap();
        assert_eq!(
            material.read().env_map,
            env,
            "Every pivot material is tagged with the environment"
        );
    }
}

// ============================================================================
// Direct Descriptions
// ============================================================================

#[test]
fn session_accepts_a_parsed_description() {
    let dir = fixture_dir("direct");
    write(&dir, "chair.gltf", &gltf_with_meshes(&["Seat"]));

    let model_path = dir.join("chair.gltf").to_str().unwrap().to_string();
    let product = serde_json::from_str(&format!(
        r#"{{"id": "chair", "model": "{model_path}",
            "nodes": [{{"id": "seat", "candidateMeshes": [{{"id": "Seat"}}], "defaultMesh": "Seat"}}]}}"#,
    ))
    .unwrap();

    let mut session = ViewerSession::new();
    session.load_product(product).unwrap();
    pump_until_idle(&mut session);

    assert_eq!(session.product().unwrap().id, "chair");
    assert_eq!(visible_children(&session, "seat"), vec!["Seat"]);
}
