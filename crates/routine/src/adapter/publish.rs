//! Publishers for the rendered map and its message.
//!
//! - [`DirPublisher`] writes `<stamp>.png` and `<stamp>.txt` into a directory,
//!   suffixing the stamp with `-N` when it is already taken
//! - [`WebhookPublisher`] POSTs `{"status", "media", "media_type"}` JSON with
//!   the PNG base64-encoded
//! - [`DisabledPublisher`] refuses every publish, so nothing is committed

use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use deforest_core::MapImage;
use time::OffsetDateTime;

use super::http::post_json;
use super::{AdapterError, Publisher};
use crate::render::encode_png;

fn encode(image: &MapImage, adapter: &str) -> Result<Vec<u8>, AdapterError> {
    encode_png(image).map_err(|e| AdapterError::InvalidResponse {
        source_id: adapter.to_string(),
        message: format!("could not encode map as PNG: {}", e),
    })
}

// ──────────────────────────────────────────────
// DirPublisher
// ──────────────────────────────────────────────

/// Writes each publication into a directory.
pub struct DirPublisher {
    dir: PathBuf,
}

impl DirPublisher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirPublisher { dir: dir.into() }
    }

    /// File stem for a publication made at `at`: `20261017T093000123`.
    fn stamp(at: OffsetDateTime) -> String {
        format!(
            "{:04}{:02}{:02}T{:02}{:02}{:02}{:03}",
            at.year(),
            u8::from(at.month()),
            at.day(),
            at.hour(),
            at.minute(),
            at.second(),
            at.millisecond()
        )
    }

    /// First of `stamp`, `stamp-1`, `stamp-2`, ... with no image written yet.
    async fn free_stem(&self, stamp: &str) -> std::io::Result<String> {
        let mut stem = stamp.to_string();
        let mut n = 1;
        while tokio::fs::try_exists(self.dir.join(format!("{stem}.png"))).await? {
            stem = format!("{stamp}-{n}");
            n += 1;
        }
        Ok(stem)
    }
}

#[async_trait]
impl Publisher for DirPublisher {
    async fn publish(&self, image: &MapImage, message: &str) -> Result<(), AdapterError> {
        let png = encode(image, "dir")?;
        let write_err = |e: std::io::Error| AdapterError::FetchFailed {
            source_id: "dir".to_string(),
            message: format!("could not write to '{}': {}", self.dir.display(), e),
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;
        let stem = self
            .free_stem(&Self::stamp(OffsetDateTime::now_utc()))
            .await
            .map_err(write_err)?;
        tokio::fs::write(self.dir.join(format!("{stem}.png")), png)
            .await
            .map_err(write_err)?;
        tokio::fs::write(self.dir.join(format!("{stem}.txt")), message)
            .await
            .map_err(write_err)?;

        tracing::info!(dir = %self.dir.display(), stem = %stem, "published to directory");
        Ok(())
    }

    fn adapter_id(&self) -> &str {
        "dir"
    }
}

// ──────────────────────────────────────────────
// WebhookPublisher
// ──────────────────────────────────────────────

/// POSTs each publication to an HTTP endpoint.
pub struct WebhookPublisher {
    url: String,
    auth_token: Option<String>,
}

impl WebhookPublisher {
    pub fn new(url: &str, auth_token: Option<String>) -> Self {
        WebhookPublisher {
            url: url.to_string(),
            auth_token,
        }
    }

    /// Request body for one publication.
    pub fn payload(png: &[u8], message: &str) -> serde_json::Value {
        serde_json::json!({
            "status": message,
            "media": base64::engine::general_purpose::STANDARD.encode(png),
            "media_type": "image/png",
        })
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    async fn publish(&self, image: &MapImage, message: &str) -> Result<(), AdapterError> {
        let png = encode(image, "webhook")?;
        post_json(
            "webhook",
            self.url.clone(),
            self.auth_token.clone(),
            Self::payload(&png, message),
        )
        .await
    }

    fn adapter_id(&self) -> &str {
        "webhook"
    }
}

// ──────────────────────────────────────────────
// DisabledPublisher
// ──────────────────────────────────────────────

/// Publisher used when publishing is switched off.
pub struct DisabledPublisher;

#[async_trait]
impl Publisher for DisabledPublisher {
    async fn publish(&self, _image: &MapImage, _message: &str) -> Result<(), AdapterError> {
        Err(AdapterError::NotConfigured {
            adapter: "publisher".to_string(),
        })
    }

    fn adapter_id(&self) -> &str {
        "disabled"
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use time::macros::datetime;

    #[test]
    fn stamp_is_sortable() {
        assert_eq!(
            DirPublisher::stamp(datetime!(2026-03-07 04:05:06.789 UTC)),
            "20260307T040506789"
        );
    }

    #[tokio::test]
    async fn publications_in_quick_succession_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = DirPublisher::new(dir.path());
        let image = MapImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));

        for message in ["first", "second", "third"] {
            publisher.publish(&image, message).await.unwrap();
        }

        let mut texts = Vec::new();
        let mut pngs = 0;
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let path = entry.unwrap().path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("txt") => texts.push(std::fs::read_to_string(&path).unwrap()),
                Some("png") => pngs += 1,
                other => panic!("unexpected file extension {other:?}"),
            }
        }
        texts.sort();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(pngs, 3);
    }

    #[tokio::test]
    async fn dir_publisher_writes_png_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let image = MapImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));

        DirPublisher::new(&out)
            .publish(&image, "30km² deforestated")
            .await
            .unwrap();

        let mut names: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with(".png"));
        assert!(names[1].ends_with(".txt"));
        let text = std::fs::read_to_string(out.join(&names[1])).unwrap();
        assert_eq!(text, "30km² deforestated");
    }

    #[test]
    fn webhook_payload_carries_base64_png() {
        let payload = WebhookPublisher::payload(&[0x89, b'P', b'N', b'G'], "hello");
        assert_eq!(payload["status"], "hello");
        assert_eq!(payload["media"], "iVBORw==");
        assert_eq!(payload["media_type"], "image/png");
    }

    #[tokio::test]
    async fn disabled_publisher_always_fails() {
        let image = MapImage::new(1, 1);
        let result = DisabledPublisher.publish(&image, "x").await;
        assert!(matches!(result, Err(AdapterError::NotConfigured { .. })));
    }
}
