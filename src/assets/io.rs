use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{Result, ViewerError};

/// Asynchronous byte source for product assets.
///
/// Implementations resolve relative URIs against their own root, so the
/// same product description works from disk and over HTTP.
pub trait AssetReader: Send + Sync {
    /// Reads the full byte stream of `uri`.
    fn read_bytes(&self, uri: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Local file reader.
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ViewerError::AssetNotFound(path.display().to_string())
            } else {
                ViewerError::IoError(e)
            }
        })?;
        Ok(data)
    }
}

/// HTTP reader (conditionally compiled).
#[cfg(feature = "http")]
pub struct HttpAssetReader {
    root_url: url::Url,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    pub fn new(url_str: &str) -> Result<Self> {
        let url = url::Url::parse(url_str)?;
        // Relative joins resolve against the last path segment, so a root
        // pointing at a file must be cut back to its directory.
        let root_url = if url.path().ends_with('/') {
            url
        } else {
            let mut u = url.clone();
            if let Ok(mut segments) = u.path_segments_mut() {
                segments.pop();
                segments.push("");
            }
            u
        };

        Ok(Self { root_url })
    }

    #[inline]
    pub fn root_url(&self) -> &url::Url {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let url = self.root_url.join(uri)?;
        let request = ehttp::Request::get(url.as_str());
        let resp = ehttp::fetch_async(request)
            .await
            .map_err(ViewerError::HttpError)?;

        if resp.status == 404 {
            return Err(ViewerError::AssetNotFound(url.to_string()));
        }
        if !resp.ok {
            return Err(ViewerError::HttpResponseError {
                status: resp.status,
            });
        }
        Ok(resp.bytes)
    }
}

/// Reader variant enum.
/// Avoids trait-object overhead on the hot loading paths.
#[derive(Clone)]
pub enum AssetReaderVariant {
    File(Arc<FileAssetReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpAssetReader>),
}

impl AssetReaderVariant {
    /// Picks the right reader for a path or URL.
    pub fn from_source(source: &str) -> Result<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpAssetReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(ViewerError::FeatureNotEnabled(
                    "HTTP feature is not enabled. Enable it with `features = [\"http\"]`".into(),
                ))
            }
        } else {
            Ok(Self::File(Arc::new(FileAssetReader::new(source))))
        }
    }

    /// Reads the full byte stream of `uri`.
    pub async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        match self {
            Self::File(r) => r.read_bytes(uri).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri).await,
        }
    }

    /// Reads and deserializes a JSON document (product descriptions,
    /// material records).
    pub async fn read_json<T: serde::de::DeserializeOwned>(&self, uri: &str) -> Result<T> {
        let bytes = self.read_bytes(uri).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The filename component of a source path or URL.
    pub fn source_filename(source: &str) -> &str {
        if source.starts_with("http://") || source.starts_with("https://") {
            source.rsplit('/').next().unwrap_or(source)
        } else {
            std::path::Path::new(source)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(source)
        }
    }
}
