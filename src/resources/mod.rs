//! Core resource definitions.
//!
//! CPU-side data structures shared across the viewer, with no GPU
//! dependency:
//! - Material: the shared per-pivot surface definition
//! - Texture: texture + sampling configuration
//! - Image: pixel data with in-place update support
//! - Geometry: triangle mesh data and bounds

pub mod geometry;
pub mod image;
pub mod material;
pub mod texture;

// Re-export the common types
pub use geometry::{BoundingBox, Geometry};
pub use image::{Image, ImageDescriptor, TextureFormat};
pub use material::{
    parse_hex_color, ChannelState, MaterialFeatures, MaterialState, StandardMaterial, TextureSlot,
    DEFAULT_BASE_COLOR,
};
pub use texture::{FilterMode, Texture, TextureSampler, TextureTransform, WrapMode};
