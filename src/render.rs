//! Render and camera-fit requests.
//!
//! The session never renders; it raises flags the embedding render loop
//! polls once per frame. Multiple requests between polls coalesce into one.

use glam::Vec3;

use crate::resources::BoundingBox;

/// Padding factor applied on top of the exact fit distance.
const FIT_PADDING: f32 = 1.2;

/// Coalescing one-shot render flag.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    requested: bool,
}

impl RenderScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a redraw. Requests between two polls collapse into one.
    #[inline]
    pub fn request(&mut self) {
        self.requested = true;
    }

    /// True if a redraw is pending, without consuming the request.
    #[inline]
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Consumes the pending request, if any.
    #[inline]
    pub fn take_request(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}

/// Camera framing computed from the model bounds after a load completes.
///
/// The embedder owns projection parameters, so the distance math takes its
/// vertical field of view (radians) and aspect ratio as inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFit {
    pub center: Vec3,
    pub size: Vec3,
}

impl CameraFit {
    /// Builds a fit from model bounds; empty bounds produce nothing.
    #[must_use]
    pub fn from_bounds(bounds: &BoundingBox) -> Option<Self> {
        if bounds.is_empty() {
            return None;
        }
        Some(Self {
            center: bounds.center(),
            size: bounds.size(),
        })
    }

    /// Distance from [`center`](Self::center) along the view axis at which
    /// the whole box fits the frustum, with a fixed padding margin.
    #[must_use]
    pub fn distance(&self, fov_y: f32, aspect: f32) -> f32 {
        let max_size = self.size.max_element();
        let fit_height = max_size / (2.0 * (fov_y * 0.5).tan());
        let fit_width = fit_height / aspect;
        FIT_PADDING * fit_height.max(fit_width)
    }
}
