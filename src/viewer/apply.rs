//! Material record application.
//!
//! Overwrites a live material from a fetched [`MaterialRecord`], channel by
//! channel, under the material's write lock so readers never observe a half
//! applied record. The material instance itself is kept: variant meshes
//! share it by handle, so restyling one pivot restyles all its variants.

use glam::{Vec2, Vec3, Vec4};

use crate::assets::{Assets, ColorSpace, MaterialHandle, TextureCache};
use crate::product::MaterialRecord;
use crate::resources::{parse_hex_color, TextureSlot};
use crate::scene::Environment;

/// Applies `record` onto the material behind `handle`.
///
/// Every property the record schema covers is written: map fields bind a
/// cached texture, empty map fields clear the channel, scalars are copied
/// verbatim, and an empty color string resets to the neutral default
/// (white base, black emissive). The material is retagged with the current
/// environment map. Returns `false` when the handle no longer resolves,
/// which happens when a product was torn down mid-fetch.
pub fn apply_record(
    assets: &Assets,
    textures: &mut TextureCache,
    handle: MaterialHandle,
    record: &MaterialRecord,
    environment: &Environment,
) -> bool {
    let Some(material) = assets.materials.get(handle) else {
        log::warn!("Material '{}' arrived after its scene was released", record.name);
        return false;
    };

    let repeat = record
        .uv_scale
        .map_or(Vec2::ONE, |s| Vec2::new(s.u, s.v));

    let mut material = material.write();

    material.name = record.name.clone();
    material.color = parse_color(&record.color, Vec4::ONE);
    material.emissive = parse_color(&record.emissive, Vec4::ZERO).truncate();

    bind_channel(
        &mut material.map,
        &record.map,
        repeat,
        ColorSpace::Srgb,
        assets,
        textures,
    );
    bind_channel(
        &mut material.normal_map,
        &record.normal_map,
        repeat,
        ColorSpace::Linear,
        assets,
        textures,
    );
    bind_channel(
        &mut material.bump_map,
        &record.bump_map,
        repeat,
        ColorSpace::Linear,
        assets,
        textures,
    );
    bind_channel(
        &mut material.displacement_map,
        &record.displacement_map,
        repeat,
        ColorSpace::Linear,
        assets,
        textures,
    );
    bind_channel(
        &mut material.roughness_map,
        &record.roughness_map,
        repeat,
        ColorSpace::Linear,
        assets,
        textures,
    );
    bind_channel(
        &mut material.metalness_map,
        &record.metalness_map,
        repeat,
        ColorSpace::Linear,
        assets,
        textures,
    );
    bind_channel(
        &mut material.alpha_map,
        &record.alpha_map,
        repeat,
        ColorSpace::Linear,
        assets,
        textures,
    );
    bind_channel(
        &mut material.ao_map,
        &record.ao_map,
        repeat,
        ColorSpace::Linear,
        assets,
        textures,
    );
    bind_channel(
        &mut material.emissive_map,
        &record.emissive_map,
        repeat,
        ColorSpace::Srgb,
        assets,
        textures,
    );

    material.normal_scale = Vec2::new(record.normal_scale.x, record.normal_scale.y);
    material.bump_scale = record.bump_scale;
    material.displacement_scale = record.displacement_scale;
    material.displacement_bias = record.displacement_bias;
    material.roughness = record.roughness;
    material.metalness = record.metalness;
    material.opacity = record.opacity;
    material.ao_map_intensity = record.ao_map_intensity;
    material.emissive_intensity = record.emissive_intensity;

    material.env_map = environment.env_map();
    material.env_map_intensity = record.env_map_intensity;

    material.wireframe = record.wireframe;
    material.transparent = record.transparent;

    material.needs_update();
    true
}

/// Binds or clears one texture channel. An empty path means "clear"; every
/// non-empty path goes through the cache, so the slot is valid immediately
/// and the pixels stream in later.
fn bind_channel(
    slot: &mut TextureSlot,
    path: &str,
    repeat: Vec2,
    color_space: ColorSpace,
    assets: &Assets,
    textures: &mut TextureCache,
) {
    if path.is_empty() {
        slot.clear();
    } else {
        let texture = textures.load(assets, path, color_space);
        slot.bind(texture, repeat);
    }
}

/// Hex color with a reset fallback: empty resets, malformed warns and
/// resets too rather than keeping stale channel state.
fn parse_color(value: &str, reset: Vec4) -> Vec4 {
    if value.is_empty() {
        return reset;
    }
    parse_hex_color(value).unwrap_or_else(|| {
        log::warn!("Ignoring malformed color '{value}'");
        reset
    })
}
