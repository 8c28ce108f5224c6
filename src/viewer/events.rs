//! Events completed background work posts back to the session.
//!
//! Every event carries the generation it was spawned under; the pump drops
//! anything from a previous generation before it can touch state or the
//! loading accounting.

use crate::assets::graph::AssetGraph;
use crate::errors::ViewerError;
use crate::product::{MaterialRecord, ProductDescription};
use crate::resources::Image;

pub enum SessionEvent {
    ProductLoaded {
        generation: u64,
        product: ProductDescription,
    },
    ProductFailed {
        generation: u64,
        error: ViewerError,
    },
    ModelLoaded {
        generation: u64,
        graph: AssetGraph,
    },
    ModelFailed {
        generation: u64,
        error: ViewerError,
    },
    EnvironmentLoaded {
        generation: u64,
        image: Image,
    },
    EnvironmentFailed {
        generation: u64,
        error: ViewerError,
    },
    MaterialRecordLoaded {
        generation: u64,
        node_id: String,
        record: Box<MaterialRecord>,
    },
    MaterialRecordFailed {
        generation: u64,
        node_id: String,
        error: ViewerError,
    },
    TextureDecoded {
        generation: u64,
        url: String,
        image: Image,
    },
    TextureFailed {
        generation: u64,
        url: String,
        error: ViewerError,
    },
}

impl SessionEvent {
    /// The session generation this event belongs to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            Self::ProductLoaded { generation, .. }
            | Self::ProductFailed { generation, .. }
            | Self::ModelLoaded { generation, .. }
            | Self::ModelFailed { generation, .. }
            | Self::EnvironmentLoaded { generation, .. }
            | Self::EnvironmentFailed { generation, .. }
            | Self::MaterialRecordLoaded { generation, .. }
            | Self::MaterialRecordFailed { generation, .. }
            | Self::TextureDecoded { generation, .. }
            | Self::TextureFailed { generation, .. } => *generation,
        }
    }

    /// Short human-readable tag for logging dropped events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProductLoaded { .. } => "product",
            Self::ProductFailed { .. } => "product failure",
            Self::ModelLoaded { .. } => "model",
            Self::ModelFailed { .. } => "model failure",
            Self::EnvironmentLoaded { .. } => "environment",
            Self::EnvironmentFailed { .. } => "environment failure",
            Self::MaterialRecordLoaded { .. } => "material record",
            Self::MaterialRecordFailed { .. } => "material record failure",
            Self::TextureDecoded { .. } => "texture",
            Self::TextureFailed { .. } => "texture failure",
        }
    }
}
