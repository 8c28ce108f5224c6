//! IBL environment state shared by every material in the product.

use crate::assets::TextureHandle;

/// Environment map configuration.
///
/// Holds the equirectangular HDR texture the product description points
/// at. Materials reference the same texture handle, so swapping the
/// environment retags every material in one place; per-material intensity
/// comes from the applied material record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Environment {
    env_map: Option<TextureHandle>,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_env_map(&mut self, texture: Option<TextureHandle>) {
        self.env_map = texture;
    }

    #[inline]
    #[must_use]
    pub fn env_map(&self) -> Option<TextureHandle> {
        self.env_map
    }

    #[inline]
    #[must_use]
    pub fn has_env_map(&self) -> bool {
        self.env_map.is_some()
    }
}
