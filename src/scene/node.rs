use glam::Affine3A;

use crate::assets::{GeometryHandle, MaterialHandle};
use crate::scene::NodeHandle;

/// A node in the product scene graph.
///
/// Only keeps the data the configurator actually drives: hierarchy,
/// a baked world transform, the visibility flag and the geometry/material
/// component handles. Pivot nodes carry no geometry; variant mesh nodes
/// carry both a geometry and a material.
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node handle (None for the root)
    pub(crate) parent: Option<NodeHandle>,
    /// Child node handles
    pub(crate) children: Vec<NodeHandle>,

    /// Node name, compared verbatim by selection and binding
    pub name: String,
    /// World transform baked in during asset import
    pub transform: Affine3A,
    /// Visibility flag, the one switch variant selection flips
    pub visible: bool,

    pub geometry: Option<GeometryHandle>,
    pub material: Option<MaterialHandle>,

    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Node {
    /// Creates an empty, visible node with an identity transform.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            name: name.into(),
            transform: Affine3A::IDENTITY,
            visible: true,
            geometry: None,
            material: None,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Whether this node renders geometry (i.e. is a variant mesh).
    #[inline]
    #[must_use]
    pub fn is_mesh(&self) -> bool {
        self.geometry.is_some()
    }
}
