use rustc_hash::FxHashMap;

use crate::assets::io::AssetReaderVariant;
use crate::assets::{decode_image_async, loader_runtime, Assets, ColorSpace, TextureHandle};
use crate::resources::image::Image;
use crate::resources::texture::{Texture, TextureSampler};
use crate::viewer::events::SessionEvent;

/// URL-keyed texture loader for material channels.
///
/// `load` never blocks and never fails from the caller's point of view: it
/// hands back a handle to a 1x1 white placeholder immediately and spawns
/// the fetch + decode in the background. When the pixels arrive the
/// placeholder's image is updated in place, so every material already
/// holding the handle picks up the real texture without being touched.
pub struct TextureCache {
    sender: flume::Sender<SessionEvent>,
    reader: Option<AssetReaderVariant>,
    lookup: FxHashMap<String, TextureHandle>,
    generation: u64,
}

impl TextureCache {
    #[must_use]
    pub fn new(sender: flume::Sender<SessionEvent>) -> Self {
        Self {
            sender,
            reader: None,
            lookup: FxHashMap::default(),
            generation: 0,
        }
    }

    /// Product teardown: forgets every cached URL and rebinds the cache to
    /// the new product's reader and generation. Old handles have already
    /// been invalidated by the asset purge.
    pub fn reset(&mut self, reader: AssetReaderVariant, generation: u64) {
        self.lookup.clear();
        self.reader = Some(reader);
        self.generation = generation;
    }

    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.lookup.len()
    }

    /// Returns the handle for `url`, starting a background load on first
    /// sight. Identical URLs share one handle, which is what makes
    /// re-applying a record a no-op.
    pub fn load(&mut self, assets: &Assets, url: &str, color_space: ColorSpace) -> TextureHandle {
        if let Some(&handle) = self.lookup.get(url) {
            return handle;
        }

        let mut texture = Texture::create_solid_color(url, [255, 255, 255, 255]);
        texture.sampler = TextureSampler::mirrored();
        let handle = assets.textures.add(texture);
        self.lookup.insert(url.to_string(), handle);

        if let Some(reader) = self.reader.clone() {
            let sender = self.sender.clone();
            let generation = self.generation;
            let url = url.to_string();
            loader_runtime().spawn(async move {
                let result = async {
                    let bytes = reader.read_bytes(&url).await?;
                    decode_image_async(bytes, color_space, url.clone()).await
                }
                .await;

                let event = match result {
                    Ok(image) => SessionEvent::TextureDecoded {
                        generation,
                        url,
                        image,
                    },
                    Err(error) => SessionEvent::TextureFailed {
                        generation,
                        url,
                        error,
                    },
                };
                let _ = sender.send(event);
            });
        } else {
            log::warn!("Texture requested before any product was loaded: {url}");
        }

        handle
    }

    /// Swaps decoded pixels into the placeholder for `url`. Returns false
    /// when the URL is unknown (cache was reset while the fetch was in
    /// flight).
    pub fn commit(&self, assets: &Assets, url: &str, decoded: &Image) -> bool {
        let Some(&handle) = self.lookup.get(url) else {
            return false;
        };
        let Some(texture) = assets.textures.get(handle) else {
            return false;
        };

        texture.image.resize(decoded.width(), decoded.height());
        texture.image.set_format(decoded.format());
        decoded.with_data(|data| {
            if let Some(data) = data {
                texture.image.update_data(data.to_vec());
            }
        });
        texture.needs_update();
        true
    }
}
