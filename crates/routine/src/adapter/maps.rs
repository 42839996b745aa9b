//! Base-map loading from HTTP URLs or local files.
//!
//! Map references starting with `http://` or `https://` are downloaded;
//! anything else is read as a file path. Either way the bytes are decoded
//! into a fresh RGBA image owned by the caller.

use async_trait::async_trait;
use deforest_core::MapImage;

use super::http::get_bytes;
use super::{AdapterError, BaseMapProvider};

/// [`BaseMapProvider`] for URL and file references.
#[derive(Debug, Default, Clone)]
pub struct MapLoader;

impl MapLoader {
    pub fn new() -> Self {
        MapLoader
    }

    fn is_remote(map_ref: &str) -> bool {
        map_ref.starts_with("http://") || map_ref.starts_with("https://")
    }
}

/// Decode an encoded image (PNG) into RGBA pixels.
pub fn decode_map(map_ref: &str, bytes: &[u8]) -> Result<MapImage, AdapterError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| AdapterError::InvalidResponse {
            source_id: "maps".to_string(),
            message: format!("could not decode '{}': {}", map_ref, e),
        })
}

#[async_trait]
impl BaseMapProvider for MapLoader {
    async fn fetch_image(&self, map_image_ref: &str) -> Result<MapImage, AdapterError> {
        let bytes = if Self::is_remote(map_image_ref) {
            get_bytes("maps", map_image_ref.to_string()).await?
        } else {
            tokio::fs::read(map_image_ref)
                .await
                .map_err(|e| AdapterError::FetchFailed {
                    source_id: "maps".to_string(),
                    message: format!("could not read '{}': {}", map_image_ref, e),
                })?
        };

        let image = decode_map(map_image_ref, &bytes)?;
        tracing::debug!(
            map = map_image_ref,
            width = image.width(),
            height = image.height(),
            "loaded base map"
        );
        Ok(image)
    }
}
