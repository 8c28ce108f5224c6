#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod assets;
pub mod binding;
pub mod errors;
pub mod product;
pub mod render;
pub mod resources;
pub mod scene;
pub mod viewer;

pub use assets::{AssetFormat, AssetGraph, AssetReaderVariant, Assets, ColorSpace, TextureCache};
pub use binding::{ResolveOutcome, SelectionRecord};
pub use errors::{Result, ViewerError};
pub use product::{MaterialRecord, MeshRef, ModelSource, NodeSpec, ProductDescription};
pub use render::{CameraFit, RenderScheduler};
pub use resources::{Geometry, Image, MaterialState, StandardMaterial, Texture};
pub use scene::{Environment, Node, NodeHandle, SceneGraph};
pub use viewer::{SessionEvent, ViewerSession};
