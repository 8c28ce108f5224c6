use glam::{Affine3A, Quat, Vec3};

use crate::errors::{Result, ViewerError};
use crate::product::OrientationFix;
use crate::resources::geometry::{BoundingBox, Geometry};

/// Model file format, decided by the URL suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Fbx,
    Gltf,
}

/// FBX files come in at centimeter scale; the scene works in meters.
const FBX_UNIT_SCALE: f32 = 0.01;

impl AssetFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let lower = path.to_ascii_lowercase();
        let stripped = lower.split(['?', '#']).next().unwrap_or(&lower);
        if stripped.ends_with(".fbx") {
            Ok(Self::Fbx)
        } else if stripped.ends_with(".glb") || stripped.ends_with(".gltf") {
            Ok(Self::Gltf)
        } else {
            Err(ViewerError::UnsupportedFormat(path.to_string()))
        }
    }
}

/// One node of a loaded asset, flattened: `transform` is the world
/// transform with all ancestors folded in.
///
/// `geometry` is moved out (`Option::take`) when the node is first
/// instantiated into asset storage; `is_mesh` stays truthful afterwards so
/// name matching keeps working.
#[derive(Debug)]
pub struct AssetNode {
    pub name: String,
    pub transform: Affine3A,
    pub geometry: Option<Geometry>,
    pub is_mesh: bool,
}

impl AssetNode {
    #[must_use]
    pub fn new(name: String, transform: Affine3A, geometry: Option<Geometry>) -> Self {
        let is_mesh = geometry.is_some();
        Self {
            name,
            transform,
            geometry,
            is_mesh,
        }
    }
}

/// The traversable node set of one loaded model file, after normalization.
#[derive(Debug)]
pub struct AssetGraph {
    pub format: AssetFormat,
    pub nodes: Vec<AssetNode>,
}

impl AssetGraph {
    #[must_use]
    pub fn new(format: AssetFormat) -> Self {
        Self {
            format,
            nodes: Vec::new(),
        }
    }

    /// Indices of all mesh-bearing nodes, in file order.
    pub fn mesh_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_mesh)
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_mesh).count()
    }

    /// Exact (case-sensitive) mesh name lookup.
    #[must_use]
    pub fn find_exact(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, n)| n.is_mesh && n.name == name)
            .map(|(i, _)| i)
    }

    /// Loose mesh name lookup: case-insensitive containment over names
    /// with separators stripped, so exporter decorations like `doorA_mesh`
    /// still match a declared `Door_A`.
    #[must_use]
    pub fn find_fuzzy(&self, name: &str) -> Option<usize> {
        let needle = normalize_name(name);
        if needle.is_empty() {
            return None;
        }
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, n)| n.is_mesh && normalize_name(&n.name).contains(&needle))
            .map(|(i, _)| i)
    }

    /// Combined bounds of every mesh node still carrying geometry, in
    /// normalized world space.
    #[must_use]
    pub fn combined_bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::EMPTY;
        for node in &self.nodes {
            if let Some(geometry) = &node.geometry {
                let local = geometry.compute_bounding_box();
                bounds = bounds.union(&local.transform(&node.transform));
            }
        }
        bounds
    }

    /// Applies the format's unit/orientation normalization by folding a
    /// root correction into every node transform.
    ///
    /// FBX: uniform downscale, then re-center the combined bounds at the
    /// origin. glTF: geometry is used as-is unless the product description
    /// supplies an [`OrientationFix`].
    pub fn normalize(&mut self, fix: Option<&OrientationFix>) {
        let root = match self.format {
            AssetFormat::Fbx => {
                let scale = Affine3A::from_scale(Vec3::splat(FBX_UNIT_SCALE));
                for node in &mut self.nodes {
                    node.transform = scale * node.transform;
                }
                let center = self.combined_bounds().center();
                let center = if center.is_finite() { center } else { Vec3::ZERO };
                Affine3A::from_translation(-center)
            }
            AssetFormat::Gltf => match fix {
                Some(fix) => {
                    Affine3A::from_translation(Vec3::new(0.0, fix.position_y, 0.0))
                        * Affine3A::from_quat(Quat::from_rotation_x(fix.rotation_x))
                }
                None => return,
            },
        };

        for node in &mut self.nodes {
            node.transform = root * node.transform;
        }
    }
}

/// Lowercases and strips everything non-alphanumeric, the shared
/// normalization both sides of a fuzzy match go through.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
