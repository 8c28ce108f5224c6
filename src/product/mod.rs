//! Declarative product description.
//!
//! This is the externally supplied JSON contract: which model file to load,
//! which environment map to light it with, and per configurable slot the
//! candidate meshes, the default mesh and the default material record path.
//! The description is immutable once loaded; everything mutable lives in the
//! scene graph built from it.

pub mod material;

pub use material::{MaterialRecord, NormalScale, UvScale};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{Result, ViewerError};

/// Top-level product description, as fetched from the product catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDescription {
    #[serde(default)]
    pub id: String,
    pub model: ModelSource,
    /// Equirectangular HDR environment map path, if the product ships one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_map: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    /// Per-asset orientation correction applied at load time (glTF only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation_fix: Option<OrientationFix>,
}

impl ProductDescription {
    /// Resolves the model path for the requested quality tier.
    ///
    /// A plain path ignores the quality argument. A quality map prefers the
    /// requested tier, then a `"default"` entry, then the first entry in key
    /// order; an empty map or an empty path is an error.
    pub fn model_path(&self, quality: Option<&str>) -> Result<&str> {
        self.model
            .resolve(quality)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                ViewerError::NoModelSource(format!("Product '{}' has no model path", self.id))
            })
    }
}

/// Either a single model path or one path per quality tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelSource {
    Single(String),
    ByQuality(BTreeMap<String, String>),
}

impl ModelSource {
    fn resolve(&self, quality: Option<&str>) -> Option<&str> {
        match self {
            Self::Single(path) => Some(path.as_str()),
            Self::ByQuality(map) => {
                if let Some(quality) = quality {
                    if let Some(path) = map.get(quality) {
                        return Some(path.as_str());
                    }
                    log::warn!("No model registered for quality '{quality}', falling back");
                }
                map.get("default")
                    .or_else(|| map.values().next())
                    .map(String::as_str)
            }
        }
    }
}

/// One configurable slot: a pivot with mutually exclusive mesh variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub candidate_meshes: Vec<MeshRef>,
    #[serde(default)]
    pub default_mesh: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_material: Option<MaterialRef>,
}

/// Reference to a mesh expected to exist in the loaded asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRef {
    pub id: String,
}

/// Reference to a material record fetched separately as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRef {
    #[serde(default)]
    pub name: String,
    /// Path of the JSON [`MaterialRecord`]; empty means nothing to fetch.
    #[serde(default)]
    pub path: String,
}

/// Data-driven replacement for per-asset orientation hacks: a rotation
/// around X plus a vertical offset, applied to the whole asset at load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationFix {
    /// Rotation around the X axis, in radians.
    #[serde(default)]
    pub rotation_x: f32,
    /// Vertical offset applied after the rotation.
    #[serde(default)]
    pub position_y: f32,
}
