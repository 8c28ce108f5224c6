//! Material record schema.
//!
//! A record is a flat JSON document describing one surface: a color, up to
//! nine texture channels and their scalar factors, plus a handful of render
//! toggles. Absent map fields deserialize to the empty string, which the
//! applicator treats as "clear this channel".

use serde::{Deserialize, Serialize};

/// Per-axis normal map strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalScale {
    pub x: f32,
    pub y: f32,
}

impl Default for NormalScale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// Texture repeat factors shared by every channel of one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvScale {
    pub u: f32,
    pub v: f32,
}

/// One fetched material definition.
///
/// Scalar defaults match what a freshly constructed PBR material carries,
/// so a sparse record reads back as "leave that factor at its default".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaterialRecord {
    pub name: String,

    /// Base color as a hex string; empty resets to white.
    pub color: String,

    pub map: String,

    pub normal_map: String,
    pub normal_scale: NormalScale,

    pub bump_map: String,
    pub bump_scale: f32,

    pub displacement_map: String,
    pub displacement_scale: f32,
    pub displacement_bias: f32,

    pub roughness_map: String,
    pub roughness: f32,

    pub metalness_map: String,
    pub metalness: f32,

    pub alpha_map: String,
    pub opacity: f32,

    pub ao_map: String,
    pub ao_map_intensity: f32,

    pub emissive_map: String,
    pub emissive_intensity: f32,
    /// Emissive color as a hex string; empty resets to black.
    pub emissive: String,

    pub env_map_intensity: f32,
    pub wireframe: bool,
    pub transparent: bool,

    /// Applied as texture repeat (with mirrored wrapping) on every channel
    /// this record binds; absent leaves samplers at their defaults.
    pub uv_scale: Option<UvScale>,
}

impl Default for MaterialRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: String::new(),
            map: String::new(),
            normal_map: String::new(),
            normal_scale: NormalScale::default(),
            bump_map: String::new(),
            bump_scale: 1.0,
            displacement_map: String::new(),
            displacement_scale: 1.0,
            displacement_bias: 0.0,
            roughness_map: String::new(),
            roughness: 1.0,
            metalness_map: String::new(),
            metalness: 0.0,
            alpha_map: String::new(),
            opacity: 1.0,
            ao_map: String::new(),
            ao_map_intensity: 1.0,
            emissive_map: String::new(),
            emissive_intensity: 1.0,
            emissive: String::new(),
            env_map_intensity: 1.0,
            wireframe: false,
            transparent: false,
            uv_scale: None,
        }
    }
}

impl MaterialRecord {
    /// Paths of every texture the record references, in channel order.
    /// Used to warm the texture cache before application.
    #[must_use]
    pub fn texture_paths(&self) -> Vec<&str> {
        [
            &self.map,
            &self.normal_map,
            &self.bump_map,
            &self.displacement_map,
            &self.roughness_map,
            &self.metalness_map,
            &self.alpha_map,
            &self.ao_map,
            &self.emissive_map,
        ]
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect()
    }
}
