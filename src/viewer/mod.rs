//! Viewer session: single-threaded coordinator of the whole pipeline.
//!
//! All scene mutation happens on the caller's thread inside [`ViewerSession`]
//! methods; background tasks only fetch and decode, then post a
//! [`SessionEvent`] back through a channel. The embedder drives the session
//! by calling [`ViewerSession::pump`] once per frame and honoring the render
//! and camera-fit requests it raises.
//!
//! Every load belongs to a generation. Tearing a product down bumps the
//! generation, so events from earlier loads are recognized as stale and
//! dropped before they can touch state.

pub mod apply;
pub mod events;
pub mod selection;
pub mod visibility;

pub use events::SessionEvent;
pub use selection::CurrentTracker;

use flume::{Receiver, Sender};

use crate::assets::graph::{AssetFormat, AssetGraph};
use crate::assets::io::AssetReaderVariant;
use crate::assets::{
    decode_hdr_async, loader_runtime, Assets, MaterialHandle, TextureCache,
};
use crate::binding::{self, SelectionRecord};
use crate::errors::Result;
use crate::product::{MaterialRecord, ProductDescription};
use crate::render::{CameraFit, RenderScheduler};
use crate::resources::{Image, StandardMaterial, Texture};
use crate::scene::{Environment, NodeHandle, SceneGraph};

/// One product-viewing session.
///
/// Owns the scene graph, the asset storages and the texture cache for the
/// currently loaded product, plus the bookkeeping that survives a product
/// switch (quality preference, event channel, generation counter).
pub struct ViewerSession {
    assets: Assets,
    scene: SceneGraph,
    textures: TextureCache,
    scheduler: RenderScheduler,
    tracker: CurrentTracker,
    environment: Environment,

    sender: Sender<SessionEvent>,
    receiver: Receiver<SessionEvent>,

    product: Option<ProductDescription>,
    quality: Option<String>,
    selection: Vec<SelectionRecord>,
    used_fallback: bool,

    reader: Option<AssetReaderVariant>,
    generation: u64,
    /// Outstanding product/model/environment/record fetches. Texture loads
    /// are not counted: they resolve against a live placeholder and never
    /// hold the loading indicator.
    pending: usize,
    pending_fit: Option<CameraFit>,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerSession {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        let textures = TextureCache::new(sender.clone());
        Self {
            assets: Assets::new(),
            scene: SceneGraph::new(),
            textures,
            scheduler: RenderScheduler::new(),
            tracker: CurrentTracker::new(),
            environment: Environment::new(),
            sender,
            receiver,
            product: None,
            quality: None,
            selection: Vec::new(),
            used_fallback: false,
            reader: None,
            generation: 0,
            pending: 0,
            pending_fit: None,
        }
    }

    // ===== Product lifecycle =====

    /// Fetches a product description from `url` (file path or HTTP URL) and
    /// loads it. Relative asset paths inside the description resolve
    /// against the description's own directory.
    pub fn load_product_from(&mut self, url: &str) -> Result<()> {
        let reader = AssetReaderVariant::from_source(url)?;
        self.begin_generation(reader.clone());

        let filename = AssetReaderVariant::source_filename(url).to_string();
        let generation = self.generation;
        let sender = self.sender.clone();
        self.pending += 1;
        loader_runtime().spawn(async move {
            let event = match reader.read_json::<ProductDescription>(&filename).await {
                Ok(product) => SessionEvent::ProductLoaded {
                    generation,
                    product,
                },
                Err(error) => SessionEvent::ProductFailed { generation, error },
            };
            let _ = sender.send(event);
        });
        Ok(())
    }

    /// Loads an already parsed product description. Relative asset paths
    /// resolve against the current working directory; use
    /// [`load_product_from`](Self::load_product_from) to anchor them at the
    /// description's location instead.
    pub fn load_product(&mut self, product: ProductDescription) -> Result<()> {
        let reader = AssetReaderVariant::from_source(".")?;
        self.begin_generation(reader);
        self.start_product(product);
        Ok(())
    }

    /// Switches the preferred quality tier and reloads the current product
    /// when its model path actually depends on the tier.
    pub fn set_quality(&mut self, quality: Option<&str>) {
        if self.quality.as_deref() == quality {
            return;
        }
        self.quality = quality.map(str::to_string);

        let (Some(product), Some(reader)) = (self.product.clone(), self.reader.clone()) else {
            return;
        };
        self.begin_generation(reader);
        self.start_product(product);
    }

    /// Tears the current product down and opens the next generation.
    /// In-flight work from the old generation keeps running but its events
    /// will be dropped on arrival.
    fn begin_generation(&mut self, reader: AssetReaderVariant) {
        self.generation += 1;
        self.product = None;
        self.selection.clear();
        self.used_fallback = false;
        self.tracker.clear();
        self.scene.clear();
        self.assets.clear_all();
        self.environment = Environment::new();
        self.textures.reset(reader.clone(), self.generation);
        self.reader = Some(reader);
        self.pending = 0;
        self.pending_fit = None;
        self.scheduler.request();
    }

    /// Kicks off the model and environment loads for `product`.
    fn start_product(&mut self, product: ProductDescription) {
        match product.model_path(self.quality.as_deref()) {
            Ok(path) => {
                let path = path.to_string();
                self.spawn_model_load(&path);
            }
            Err(error) => log::warn!("{error}"),
        }
        if let Some(env_path) = product.env_map.clone() {
            self.spawn_environment_load(&env_path);
        }
        self.product = Some(product);
    }

    fn spawn_model_load(&mut self, path: &str) {
        let Some(reader) = self.reader.clone() else {
            return;
        };
        let generation = self.generation;
        let sender = self.sender.clone();
        let path = path.to_string();
        self.pending += 1;
        loader_runtime().spawn(async move {
            let event = match load_model(&reader, &path).await {
                Ok(graph) => SessionEvent::ModelLoaded { generation, graph },
                Err(error) => SessionEvent::ModelFailed { generation, error },
            };
            let _ = sender.send(event);
        });
    }

    fn spawn_environment_load(&mut self, path: &str) {
        let Some(reader) = self.reader.clone() else {
            return;
        };
        let generation = self.generation;
        let sender = self.sender.clone();
        let path = path.to_string();
        self.pending += 1;
        loader_runtime().spawn(async move {
            let result = async {
                let bytes = reader.read_bytes(&path).await?;
                decode_hdr_async(bytes, path.clone()).await
            }
            .await;
            let event = match result {
                Ok(image) => SessionEvent::EnvironmentLoaded { generation, image },
                Err(error) => SessionEvent::EnvironmentFailed { generation, error },
            };
            let _ = sender.send(event);
        });
    }

    fn spawn_record_fetch(&mut self, node_id: String, path: String) {
        let Some(reader) = self.reader.clone() else {
            return;
        };
        let generation = self.generation;
        let sender = self.sender.clone();
        self.pending += 1;
        loader_runtime().spawn(async move {
            let event = match reader.read_json::<MaterialRecord>(&path).await {
                Ok(record) => SessionEvent::MaterialRecordLoaded {
                    generation,
                    node_id,
                    record: Box::new(record),
                },
                Err(error) => SessionEvent::MaterialRecordFailed {
                    generation,
                    node_id,
                    error,
                },
            };
            let _ = sender.send(event);
        });
    }

    // ===== Event pump =====

    /// Drains completed background work. Call once per frame from the
    /// thread that owns the session; all scene mutation happens here.
    pub fn pump(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            if event.generation() != self.generation {
                log::debug!("Dropping stale {} event", event.kind());
                continue;
            }
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ProductLoaded { product, .. } => {
                self.pending = self.pending.saturating_sub(1);
                self.start_product(product);
            }
            SessionEvent::ProductFailed { error, .. } => {
                self.pending = self.pending.saturating_sub(1);
                log::warn!("Product description failed to load: {error}");
            }
            SessionEvent::ModelLoaded { graph, .. } => {
                self.pending = self.pending.saturating_sub(1);
                self.on_model_loaded(graph);
            }
            SessionEvent::ModelFailed { error, .. } => {
                self.pending = self.pending.saturating_sub(1);
                log::warn!("Model failed to load: {error}");
            }
            SessionEvent::EnvironmentLoaded { image, .. } => {
                self.pending = self.pending.saturating_sub(1);
                self.on_environment_loaded(image);
            }
            SessionEvent::EnvironmentFailed { error, .. } => {
                self.pending = self.pending.saturating_sub(1);
                log::warn!("Environment map failed to load: {error}");
            }
            SessionEvent::MaterialRecordLoaded {
                node_id, record, ..
            } => {
                self.pending = self.pending.saturating_sub(1);
                match self.scene.find_pivot(&node_id) {
                    Some(pivot) => self.apply_to_pivot(pivot, &record),
                    None => log::warn!("Material record for unknown node '{node_id}'"),
                }
            }
            SessionEvent::MaterialRecordFailed { node_id, error, .. } => {
                self.pending = self.pending.saturating_sub(1);
                log::warn!("Material record for '{node_id}' failed: {error}");
            }
            SessionEvent::TextureDecoded { url, image, .. } => {
                if self.textures.commit(&self.assets, &url, &image) {
                    self.scheduler.request();
                }
            }
            SessionEvent::TextureFailed { url, error, .. } => {
                log::warn!("Texture '{url}' failed to load: {error}");
            }
        }
    }

    /// Structural resolution: normalize the asset, bind it against the
    /// product, hand every pivot its placeholder material, then fire the
    /// initial render request and queue the per-node record fetches.
    fn on_model_loaded(&mut self, mut graph: AssetGraph) {
        let Some(product) = self.product.clone() else {
            log::warn!("Model arrived without a product description");
            return;
        };

        graph.normalize(product.orientation_fix.as_ref());
        let outcome = binding::resolve(&mut self.scene, &self.assets, &mut graph, &product);
        self.selection = outcome.selection;
        self.used_fallback = outcome.used_fallback;

        let pivots = self.scene.pivots().to_vec();
        for pivot in &pivots {
            let mut material = StandardMaterial::neutral();
            material.env_map = self.environment.env_map();
            let handle = self.assets.materials.add(material);
            self.assign_material(*pivot, handle);
        }

        let bounds = self.scene.compute_bounds(&self.assets);
        self.pending_fit = CameraFit::from_bounds(&bounds);
        self.scheduler.request();

        // Declared materials stream in afterwards, one fetch per node.
        for pivot in pivots {
            let Some(name) = self.scene.node(pivot).map(|n| n.name.clone()) else {
                continue;
            };
            let record_path = product
                .nodes
                .iter()
                .find(|spec| spec.id == name)
                .and_then(|spec| spec.default_material.as_ref())
                .map(|m| m.path.clone())
                .filter(|p| !p.is_empty());
            if let Some(path) = record_path {
                self.spawn_record_fetch(name, path);
            }
        }
    }

    /// Stores the decoded environment image and retags every live material
    /// with it, whether or not their records were already applied.
    fn on_environment_loaded(&mut self, image: Image) {
        let texture = Texture::new("environment", image);
        let handle = self.assets.textures.add(texture);
        self.environment.set_env_map(Some(handle));

        {
            let storage = self.assets.materials.read_lock();
            for material in storage.map.values() {
                let mut material = material.write();
                material.env_map = Some(handle);
                material.needs_update();
            }
        }
        self.scheduler.request();
    }

    /// Shares one material handle between a pivot and all its variants.
    fn assign_material(&mut self, pivot: NodeHandle, handle: MaterialHandle) {
        if let Some(node) = self.scene.node_mut(pivot) {
            node.material = Some(handle);
        }
        for child in self.scene.children_of(pivot).to_vec() {
            if let Some(node) = self.scene.node_mut(child) {
                node.material = Some(handle);
            }
        }
    }

    fn apply_to_pivot(&mut self, pivot: NodeHandle, record: &MaterialRecord) {
        let Some(handle) = self.scene.node(pivot).and_then(|n| n.material) else {
            log::warn!("Pivot has no material to apply a record onto");
            return;
        };
        if apply::apply_record(
            &self.assets,
            &mut self.textures,
            handle,
            record,
            &self.environment,
        ) {
            self.assign_material(pivot, handle);
            self.scheduler.request();
        }
    }

    // ===== Selection and current node =====

    /// Replaces the whole selection map and re-evaluates visibility under
    /// every named pivot.
    pub fn set_selection(&mut self, selection: Vec<SelectionRecord>) {
        visibility::apply_selection(&mut self.scene, &selection);
        self.selection = selection;
        self.scheduler.request();
    }

    /// Marks the pivot named `node_id` as current and returns its active
    /// material name; `None` clears the current node.
    pub fn set_current(&mut self, node_id: Option<&str>) -> Option<String> {
        let name = self.tracker.set_current(&self.scene, &self.assets, node_id);
        self.scheduler.request();
        name
    }

    /// Applies an edited material record to the current pivot. A missing
    /// record or missing current node is a no-op.
    pub fn apply_current_material(&mut self, record: Option<&MaterialRecord>) {
        let Some(record) = record else {
            return;
        };
        let Some(pivot) = self.tracker.current(&self.scene) else {
            return;
        };
        self.apply_to_pivot(pivot, record);
    }

    /// Applies a material record to the pivot named `node_id` directly.
    pub fn apply_node_material(&mut self, node_id: &str, record: &MaterialRecord) {
        match self.scene.find_pivot(node_id) {
            Some(pivot) => self.apply_to_pivot(pivot, record),
            None => log::warn!("No node named '{node_id}' to apply a material onto"),
        }
    }

    // ===== Embedder-facing state =====

    /// True while any product/model/environment/record fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    /// Consumes the coalesced render request, if one is pending.
    pub fn take_render_request(&mut self) -> bool {
        self.scheduler.take_request()
    }

    /// Consumes the camera-fit request raised by the last completed load.
    pub fn take_camera_fit(&mut self) -> Option<CameraFit> {
        self.pending_fit.take()
    }

    #[must_use]
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    #[must_use]
    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    #[must_use]
    pub fn product(&self) -> Option<&ProductDescription> {
        self.product.as_ref()
    }

    /// Current selection records, as last resolved or set.
    #[must_use]
    pub fn selection(&self) -> &[SelectionRecord] {
        &self.selection
    }

    /// Whether the last resolution fell back to the single all-mesh pivot.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// Handle of the current pivot, if any.
    #[must_use]
    pub fn current_node(&self) -> Option<NodeHandle> {
        self.tracker.current(&self.scene)
    }
}

/// Format dispatch for model loading.
async fn load_model(reader: &AssetReaderVariant, path: &str) -> Result<AssetGraph> {
    match AssetFormat::from_path(path)? {
        AssetFormat::Gltf => {
            #[cfg(feature = "gltf")]
            {
                crate::assets::gltf::load(reader, path).await
            }
            #[cfg(not(feature = "gltf"))]
            {
                Err(crate::errors::ViewerError::FeatureNotEnabled(
                    "glTF support was disabled at build time".into(),
                ))
            }
        }
        AssetFormat::Fbx => {
            #[cfg(feature = "fbx")]
            {
                crate::assets::fbx::load(reader, path).await
            }
            #[cfg(not(feature = "fbx"))]
            {
                Err(crate::errors::ViewerError::FeatureNotEnabled(
                    "FBX support was disabled at build time".into(),
                ))
            }
        }
    }
}
