//! Product Description Tests
//!
//! Tests for:
//! - Description deserialization: camelCase schema, optional sections
//! - Model source forms: single path vs. quality map
//! - Quality resolution order: requested tier, "default", first entry
//! - Selection record wire format

use vitrine::binding::SelectionRecord;
use vitrine::product::{MaterialRef, ModelSource, ProductDescription};
use vitrine::ViewerError;

const SHED: &str = r#"{
    "id": "garden-shed",
    "model": {
        "high": "shed_high.glb",
        "low": "shed_low.glb"
    },
    "envMap": "studio.hdr",
    "orientationFix": {"rotationX": -1.5707964, "positionY": -1.0},
    "nodes": [
        {
            "id": "door",
            "candidateMeshes": [{"id": "Door_A"}, {"id": "Door_B"}],
            "defaultMesh": "Door_B",
            "defaultMaterial": {"name": "Oak", "path": "materials/oak.json"}
        },
        {
            "id": "roof",
            "candidateMeshes": [{"id": "Roof"}],
            "defaultMesh": "Roof"
        }
    ]
}"#;

// ============================================================================
// Description Parsing
// ============================================================================

#[test]
fn product_parses_full_description() {
    let product: ProductDescription = serde_json::from_str(SHED).unwrap();

    assert_eq!(product.id, "garden-shed");
    assert_eq!(product.env_map.as_deref(), Some("studio.hdr"));
    assert_eq!(product.nodes.len(), 2);

    let door = &product.nodes[0];
    assert_eq!(door.id, "door");
    assert_eq!(door.candidate_meshes.len(), 2);
    assert_eq!(door.candidate_meshes[1].id, "Door_B");
    assert_eq!(door.default_mesh, "Door_B");
    let material = door.default_material.as_ref().unwrap();
    assert_eq!(material.name, "Oak");
    assert_eq!(material.path, "materials/oak.json");

    let roof = &product.nodes[1];
    assert!(roof.default_material.is_none());

    let fix = product.orientation_fix.unwrap();
    assert!((fix.rotation_x - (-std::f32::consts::FRAC_PI_2)).abs() < 1e-5);
    assert!((fix.position_y - (-1.0)).abs() < 1e-5);
}

#[test]
fn product_minimal_description_fills_defaults() {
    let product: ProductDescription =
        serde_json::from_str(r#"{"model": "chair.glb"}"#).unwrap();

    assert_eq!(product.id, "");
    assert_eq!(product.model, ModelSource::Single("chair.glb".to_string()));
    assert!(product.env_map.is_none());
    assert!(product.nodes.is_empty());
    assert!(product.orientation_fix.is_none());
}

#[test]
fn product_material_ref_fields_default_to_empty() {
    let material: MaterialRef = serde_json::from_str("{}").unwrap();
    assert_eq!(material.name, "");
    assert_eq!(material.path, "");
}

#[test]
fn product_round_trips_through_json() {
    let product: ProductDescription = serde_json::from_str(SHED).unwrap();
    let json = serde_json::to_string(&product).unwrap();
    let reparsed: ProductDescription = serde_json::from_str(&json).unwrap();
    assert_eq!(product, reparsed);
}

// ============================================================================
// Model Source Resolution
// ============================================================================

#[test]
fn model_single_path_ignores_quality() {
    let product: ProductDescription =
        serde_json::from_str(r#"{"model": "chair.glb"}"#).unwrap();

    assert_eq!(product.model_path(None).unwrap(), "chair.glb");
    assert_eq!(product.model_path(Some("low")).unwrap(), "chair.glb");
}

#[test]
fn model_quality_map_prefers_requested_tier() {
    let product: ProductDescription = serde_json::from_str(SHED).unwrap();
    assert_eq!(product.model_path(Some("low")).unwrap(), "shed_low.glb");
    assert_eq!(product.model_path(Some("high")).unwrap(), "shed_high.glb");
}

#[test]
fn model_quality_map_falls_back_to_default_entry() {
    let json = r#"{"model": {"default": "d.glb", "low": "l.glb"}}"#;
    let product: ProductDescription = serde_json::from_str(json).unwrap();

    assert_eq!(product.model_path(None).unwrap(), "d.glb");
    assert_eq!(
        product.model_path(Some("ultra")).unwrap(),
        "d.glb",
        "Unknown tier falls back to the default entry"
    );
}

#[test]
fn model_quality_map_falls_back_to_first_entry() {
    let json = r#"{"model": {"high": "h.glb", "low": "l.glb"}}"#;
    let product: ProductDescription = serde_json::from_str(json).unwrap();

    // BTreeMap keys are ordered, so "high" is the first entry.
    assert_eq!(product.model_path(Some("ultra")).unwrap(), "h.glb");
}

#[test]
fn model_empty_sources_are_an_error() {
    let empty_map: ProductDescription = serde_json::from_str(r#"{"model": {}}"#).unwrap();
    assert!(matches!(
        empty_map.model_path(None),
        Err(ViewerError::NoModelSource(_))
    ));

    let empty_path: ProductDescription = serde_json::from_str(r#"{"model": ""}"#).unwrap();
    assert!(matches!(
        empty_path.model_path(None),
        Err(ViewerError::NoModelSource(_))
    ));
}

// ============================================================================
// Selection Record Wire Format
// ============================================================================

#[test]
fn selection_record_uses_camel_case_keys() {
    let record = SelectionRecord {
        node_id: "door".to_string(),
        mesh_id: "Door_B".to_string(),
    };

    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(json, r#"{"nodeId":"door","meshId":"Door_B"}"#);

    let reparsed: SelectionRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(reparsed, record);
}
