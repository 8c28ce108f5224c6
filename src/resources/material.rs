use bitflags::bitflags;
use glam::{Vec2, Vec3, Vec4};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::assets::TextureHandle;
use crate::resources::texture::TextureTransform;

// Shader feature flags, derived from which channels are bound
bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFeatures: u32 {
        const USE_MAP              = 1 << 0;
        const USE_NORMAL_MAP       = 1 << 1;
        const USE_BUMP_MAP         = 1 << 2;
        const USE_DISPLACEMENT_MAP = 1 << 3;
        const USE_ROUGHNESS_MAP    = 1 << 4;
        const USE_METALNESS_MAP    = 1 << 5;
        const USE_ALPHA_MAP        = 1 << 6;
        const USE_AO_MAP           = 1 << 7;
        const USE_EMISSIVE_MAP     = 1 << 8;
        const USE_IBL              = 1 << 9;
    }
}

/// Base color every freshly bound variant gets before its material record
/// arrives: a dark neutral grey that reads well under an environment map.
pub const DEFAULT_BASE_COLOR: Vec4 = Vec4::new(
    54.0 / 255.0,
    54.0 / 255.0,
    54.0 / 255.0,
    1.0,
);

// ============================================================================
// Texture slots
// ============================================================================

/// One bindable texture channel on a material.
///
/// `transform.repeat` carries the UV tiling requested by the material
/// record; the slot is `None` when the channel is cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureSlot {
    pub texture: Option<TextureHandle>,
    pub transform: TextureTransform,
}

impl TextureSlot {
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.texture.is_some()
    }

    pub fn bind(&mut self, texture: TextureHandle, repeat: Vec2) {
        self.texture = Some(texture);
        self.transform = TextureTransform {
            repeat,
            ..TextureTransform::default()
        };
    }

    pub fn clear(&mut self) {
        self.texture = None;
        self.transform = TextureTransform::default();
    }
}

// ============================================================================
// Standard material
// ============================================================================

/// The one material kind the viewer applies: a metallic-roughness surface
/// with the full channel set product material records can address.
///
/// A single instance is shared by a pivot and all its variant meshes, so
/// editing it restyles every variant at once.
#[derive(Debug)]
pub struct StandardMaterial {
    pub uuid: Uuid,
    /// Display name from the material record, shown by the embedding UI.
    pub name: String,

    pub color: Vec4,
    pub emissive: Vec3,

    pub map: TextureSlot,
    pub normal_map: TextureSlot,
    pub bump_map: TextureSlot,
    pub displacement_map: TextureSlot,
    pub roughness_map: TextureSlot,
    pub metalness_map: TextureSlot,
    pub alpha_map: TextureSlot,
    pub ao_map: TextureSlot,
    pub emissive_map: TextureSlot,

    pub roughness: f32,
    pub metalness: f32,
    pub opacity: f32,
    pub normal_scale: Vec2,
    pub bump_scale: f32,
    pub displacement_scale: f32,
    pub displacement_bias: f32,
    pub ao_map_intensity: f32,
    pub emissive_intensity: f32,

    pub env_map: Option<TextureHandle>,
    pub env_map_intensity: f32,

    pub wireframe: bool,
    pub transparent: bool,

    version: AtomicU64,
}

impl StandardMaterial {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            color: Vec4::ONE,
            emissive: Vec3::ZERO,
            map: TextureSlot::default(),
            normal_map: TextureSlot::default(),
            bump_map: TextureSlot::default(),
            displacement_map: TextureSlot::default(),
            roughness_map: TextureSlot::default(),
            metalness_map: TextureSlot::default(),
            alpha_map: TextureSlot::default(),
            ao_map: TextureSlot::default(),
            emissive_map: TextureSlot::default(),
            roughness: 1.0,
            metalness: 0.0,
            opacity: 1.0,
            normal_scale: Vec2::ONE,
            bump_scale: 1.0,
            displacement_scale: 1.0,
            displacement_bias: 0.0,
            ao_map_intensity: 1.0,
            emissive_intensity: 1.0,
            env_map: None,
            env_map_intensity: 1.0,
            wireframe: false,
            transparent: false,
            version: AtomicU64::new(0),
        }
    }

    /// The neutral material bound variants start out with.
    #[must_use]
    pub fn neutral() -> Self {
        let mut material = Self::new("");
        material.color = DEFAULT_BASE_COLOR;
        material
    }

    #[must_use]
    pub fn features(&self) -> MaterialFeatures {
        let mut features = MaterialFeatures::empty();
        if self.map.is_bound() {
            features |= MaterialFeatures::USE_MAP;
        }
        if self.normal_map.is_bound() {
            features |= MaterialFeatures::USE_NORMAL_MAP;
        }
        if self.bump_map.is_bound() {
            features |= MaterialFeatures::USE_BUMP_MAP;
        }
        if self.displacement_map.is_bound() {
            features |= MaterialFeatures::USE_DISPLACEMENT_MAP;
        }
        if self.roughness_map.is_bound() {
            features |= MaterialFeatures::USE_ROUGHNESS_MAP;
        }
        if self.metalness_map.is_bound() {
            features |= MaterialFeatures::USE_METALNESS_MAP;
        }
        if self.alpha_map.is_bound() {
            features |= MaterialFeatures::USE_ALPHA_MAP;
        }
        if self.ao_map.is_bound() {
            features |= MaterialFeatures::USE_AO_MAP;
        }
        if self.emissive_map.is_bound() {
            features |= MaterialFeatures::USE_EMISSIVE_MAP;
        }
        if self.env_map.is_some() {
            features |= MaterialFeatures::USE_IBL;
        }
        features
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    /// Marks the material dirty so the embedding renderer re-uploads it.
    pub fn needs_update(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of everything that affects shading, for change detection
    /// and serialization. Texture identity is captured by handle, so two
    /// snapshots are equal iff re-applying a record was a true no-op.
    #[must_use]
    pub fn state(&self) -> MaterialState {
        MaterialState {
            name: self.name.clone(),
            color: self.color.to_array(),
            emissive: self.emissive.to_array(),
            map: ChannelState::of(&self.map),
            normal_map: ChannelState::of(&self.normal_map),
            bump_map: ChannelState::of(&self.bump_map),
            displacement_map: ChannelState::of(&self.displacement_map),
            roughness_map: ChannelState::of(&self.roughness_map),
            metalness_map: ChannelState::of(&self.metalness_map),
            alpha_map: ChannelState::of(&self.alpha_map),
            ao_map: ChannelState::of(&self.ao_map),
            emissive_map: ChannelState::of(&self.emissive_map),
            roughness: self.roughness,
            metalness: self.metalness,
            opacity: self.opacity,
            normal_scale: self.normal_scale.to_array(),
            bump_scale: self.bump_scale,
            displacement_scale: self.displacement_scale,
            displacement_bias: self.displacement_bias,
            ao_map_intensity: self.ao_map_intensity,
            emissive_intensity: self.emissive_intensity,
            env_map: self.env_map.map(|h| format!("{h:?}")),
            env_map_intensity: self.env_map_intensity,
            wireframe: self.wireframe,
            transparent: self.transparent,
        }
    }
}

// ============================================================================
// Serializable state snapshot
// ============================================================================

/// One channel in a [`MaterialState`] snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelState {
    /// Bound texture identity, `None` when the channel is cleared.
    pub texture: Option<String>,
    pub repeat: [f32; 2],
}

impl ChannelState {
    fn of(slot: &TextureSlot) -> Self {
        Self {
            texture: slot.texture.map(|h| format!("{h:?}")),
            repeat: slot.transform.repeat.to_array(),
        }
    }
}

/// Full serializable shading state of a [`StandardMaterial`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialState {
    pub name: String,
    pub color: [f32; 4],
    pub emissive: [f32; 3],
    pub map: ChannelState,
    pub normal_map: ChannelState,
    pub bump_map: ChannelState,
    pub displacement_map: ChannelState,
    pub roughness_map: ChannelState,
    pub metalness_map: ChannelState,
    pub alpha_map: ChannelState,
    pub ao_map: ChannelState,
    pub emissive_map: ChannelState,
    pub roughness: f32,
    pub metalness: f32,
    pub opacity: f32,
    pub normal_scale: [f32; 2],
    pub bump_scale: f32,
    pub displacement_scale: f32,
    pub displacement_bias: f32,
    pub ao_map_intensity: f32,
    pub emissive_intensity: f32,
    pub env_map: Option<String>,
    pub env_map_intensity: f32,
    pub wireframe: bool,
    pub transparent: bool,
}

// ============================================================================
// Color parsing
// ============================================================================

/// Parses `#rgb` / `#rrggbb` hex colors (leading `#` optional) into linear
/// RGBA. Returns `None` on malformed input.
#[must_use]
pub fn parse_hex_color(value: &str) -> Option<Vec4> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if !hex.is_ascii() {
        return None;
    }

    let (r, g, b) = match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            (r * 17, g * 17, b * 17)
        }
        6 => (
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        ),
        _ => return None,
    };

    Some(Vec4::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        1.0,
    ))
}
