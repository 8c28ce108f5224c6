use glam::{Mat3, Vec2};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::resources::image::{Image, TextureFormat};

// ============================================================================
// Sampling state
// ============================================================================

/// Texture coordinate wrapping outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSampler {
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
}

impl Default for TextureSampler {
    fn default() -> Self {
        Self {
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
        }
    }
}

impl TextureSampler {
    /// Mirrored-repeat on both axes, the sampling every product texture
    /// channel uses so tiled material scans do not seam.
    #[must_use]
    pub fn mirrored() -> Self {
        Self {
            wrap_u: WrapMode::MirroredRepeat,
            wrap_v: WrapMode::MirroredRepeat,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureTransform {
    pub offset: Vec2,
    pub repeat: Vec2,
    pub rotation: f32,
    pub center: Vec2,
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            repeat: Vec2::ONE,
            rotation: 0.0,
            center: Vec2::new(0.5, 0.5),
        }
    }
}

impl TextureTransform {
    /// The 3x3 UV transform matrix for this offset/repeat/rotation.
    #[must_use]
    pub fn get_matrix(&self) -> Mat3 {
        let c = self.rotation.cos();
        let s = self.rotation.sin();
        let ox = self.offset.x;
        let oy = self.offset.y;
        let rx = self.repeat.x;
        let ry = self.repeat.y;
        let cx = self.center.x;
        let cy = self.center.y;

        Mat3::from_cols_array(&[
            c * rx,
            s * rx,
            0.0,
            -s * ry,
            c * ry,
            0.0,
            (c * -cx + s * -cy + cx) * rx + ox,
            (-s * -cx + c * -cy + cy) * ry + oy,
            1.0,
        ])
    }
}

// ============================================================================
// Texture Asset
// ============================================================================

#[derive(Debug)]
pub struct Texture {
    pub uuid: Uuid,
    pub name: String,

    pub image: Image,

    pub sampler: TextureSampler,

    pub version: AtomicU64,
}

impl Texture {
    /// Basic constructor: wraps an existing [`Image`].
    pub fn new(name: &str, image: Image) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            image,
            sampler: TextureSampler::default(),
            version: AtomicU64::new(0),
        }
    }

    /// Convenience constructor: creates the backing [`Image`] too.
    pub fn new_2d(
        name: &str,
        width: u32,
        height: u32,
        data: Option<Vec<u8>>,
        format: TextureFormat,
    ) -> Self {
        let image = Image::new(Some(name), width, height, format, data);
        Self::new(name, image)
    }

    /// A 1x1 solid color texture, used as the placeholder while the real
    /// pixels are still in flight.
    pub fn create_solid_color(name: &str, color: [u8; 4]) -> Texture {
        Self::new_2d(name, 1, 1, Some(color.to_vec()), TextureFormat::Rgba8UnormSrgb)
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    pub fn needs_update(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
    }
}
