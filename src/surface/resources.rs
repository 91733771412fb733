//! Embedded image resources (letterhead logos).
//!
//! Images are loaded from disk or fetched over HTTP, decoded once and
//! cached for the life of the loader. Every page of an export reuses the
//! same decoded logo.

use async_trait::async_trait;
use image::DynamicImage;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::LabelError;

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
}

impl ImageSource {
    /// `http://` and `https://` strings are URLs; anything else is a path.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ImageSource::Url(trimmed.to_string())
        } else {
            ImageSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(p) => write!(f, "{}", p.display()),
            ImageSource::Url(u) => f.write_str(u),
        }
    }
}

/// Loads and decodes images for the render surface.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, source: &ImageSource) -> Result<DynamicImage, LabelError>;
}

/// Default loader: local files via tokio, remote images via reqwest.
pub struct ResourceLoader {
    http_client: reqwest::Client,
    cache: Arc<RwLock<HashMap<ImageSource, DynamicImage>>>,
}

impl ResourceLoader {
    pub fn new() -> Result<Self, LabelError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("regalia-labels/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LabelError::Image(format!("HTTP client error: {}", e)))?;
        Ok(Self::with_client(http_client))
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LabelError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| LabelError::Image(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(LabelError::Image(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LabelError::Image(format!("Failed to read image data: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageLoader for ResourceLoader {
    async fn load(&self, source: &ImageSource) -> Result<DynamicImage, LabelError> {
        if let Some(image) = self.cache.read().await.get(source) {
            return Ok(image.clone());
        }

        let bytes = match source {
            ImageSource::Path(path) => tokio::fs::read(path).await?,
            ImageSource::Url(url) => self.fetch(url).await?,
        };

        let image = image::load_from_memory(&bytes)
            .map_err(|e| LabelError::Image(format!("Failed to decode {}: {}", source, e)))?;
        debug!(%source, width = image.width(), height = image.height(), "loaded image");

        self.cache.write().await.insert(source.clone(), image.clone());
        Ok(image)
    }
}
