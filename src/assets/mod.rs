//! Asset loading and storage.
//!
//! Loaded resources live in handle-keyed storages inside [`Assets`]; the
//! loaders ([`gltf`], [`fbx`]) produce a normalized [`graph::AssetGraph`]
//! that the binding pass consumes, and [`textures::TextureCache`] serves
//! material textures with placeholder-first semantics.

pub mod graph;
pub mod io;
pub mod storage;
pub mod textures;

#[cfg(feature = "fbx")]
pub mod fbx;
#[cfg(feature = "gltf")]
pub mod gltf;

use parking_lot::RwLock;
use slotmap::new_key_type;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

use crate::errors::{Result, ViewerError};
use crate::resources::geometry::Geometry;
use crate::resources::image::{Image, TextureFormat};
use crate::resources::material::StandardMaterial;
use crate::resources::texture::Texture;

pub use graph::{AssetFormat, AssetGraph, AssetNode};
pub use io::{AssetReader, AssetReaderVariant, FileAssetReader};
pub use storage::AssetStorage;
pub use textures::TextureCache;

#[cfg(feature = "http")]
pub use io::HttpAssetReader;

/// The shared runtime background loads run on.
pub(crate) fn loader_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create asset loader runtime"))
}

// Strongly-typed handles
new_key_type! {
    pub struct GeometryHandle;
    pub struct MaterialHandle;
    pub struct TextureHandle;
}

/// All loaded resources of the current product, keyed by typed handles.
///
/// Materials sit behind a lock because a single instance is shared by a
/// pivot and all its variant meshes and is edited in place when a material
/// record is applied.
#[derive(Default)]
pub struct Assets {
    pub geometries: AssetStorage<GeometryHandle, Geometry>,
    pub materials: AssetStorage<MaterialHandle, RwLock<StandardMaterial>>,
    pub textures: AssetStorage<TextureHandle, Texture>,
}

impl Assets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Product teardown: drops everything. Handles held by a previous scene
    /// go stale and read as `None`.
    pub fn clear_all(&self) {
        self.geometries.clear();
        self.materials.clear();
        self.textures.clear();
    }
}

/// How decoded pixels should be interpreted by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

// ============================================================================
// Image decoding
// ============================================================================

/// CPU image decoding logic.
pub fn decode_image(bytes: &[u8], color_space: ColorSpace, label: &str) -> Result<Image> {
    use image::GenericImageView;

    let img = image::load_from_memory(bytes).map_err(|e| {
        ViewerError::ImageDecodeError(format!("Failed to decode image {label}: {e}"))
    })?;

    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();

    Ok(Image::new(
        Some(label),
        width,
        height,
        match color_space {
            ColorSpace::Srgb => TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => TextureFormat::Rgba8Unorm,
        },
        Some(rgba.into_vec()),
    ))
}

/// CPU HDR decoding logic (converts to `Rgba16Float`).
pub fn decode_hdr(bytes: &[u8], label: &str) -> Result<Image> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ViewerError::ImageDecodeError(format!("Failed to decode HDR {label}: {e}")))?;

    let width = img.width();
    let height = img.height();
    let rgb32f = img.into_rgb32f();

    // Convert RGB32F to RGBA16F (half float) for the renderer
    let mut rgba_f16_data = Vec::with_capacity((width * height * 4) as usize * 2);

    for pixel in rgb32f.pixels() {
        let r = half::f16::from_f32(pixel[0]);
        let g = half::f16::from_f32(pixel[1]);
        let b = half::f16::from_f32(pixel[2]);
        let a = half::f16::from_f32(1.0);

        rgba_f16_data.extend_from_slice(&r.to_le_bytes());
        rgba_f16_data.extend_from_slice(&g.to_le_bytes());
        rgba_f16_data.extend_from_slice(&b.to_le_bytes());
        rgba_f16_data.extend_from_slice(&a.to_le_bytes());
    }

    Ok(Image::new(
        Some(label),
        width,
        height,
        TextureFormat::Rgba16Float,
        Some(rgba_f16_data),
    ))
}

/// Decodes on the blocking thread pool so large textures never stall the
/// loader tasks.
pub async fn decode_image_async(
    bytes: Vec<u8>,
    color_space: ColorSpace,
    label: String,
) -> Result<Image> {
    tokio::task::spawn_blocking(move || decode_image(&bytes, color_space, &label)).await?
}

pub async fn decode_hdr_async(bytes: Vec<u8>, label: String) -> Result<Image> {
    tokio::task::spawn_blocking(move || decode_hdr(&bytes, &label)).await?
}
