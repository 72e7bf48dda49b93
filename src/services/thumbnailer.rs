//! ThumbnailEngine — derives a bounded-size preview raster from image bytes.
//!
//! Output dimensions preserve the source aspect ratio so the larger side
//! fits the configured bounding box. Encoding is always PNG, resampling is
//! Lanczos3, so identical input bytes yield identical previews.

use crate::services::{
    blob_store::BlobStore,
    error::{MediaError, MediaResult},
};
use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};
use std::{io::Cursor, path::Path};
use uuid::Uuid;

pub const DEFAULT_BOUNDING_BOX: u32 = 300;
const THUMB_PREFIX: &str = "thumb_";

#[derive(Clone, Debug)]
pub struct Thumbnailer {
    /// Store rooted at the preview directory.
    store: BlobStore,
    max_width: u32,
    max_height: u32,
}

impl Thumbnailer {
    pub fn new(store: BlobStore, max_width: u32, max_height: u32) -> Self {
        Self {
            store,
            max_width,
            max_height,
        }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Decode `bytes`, resize to fit the bounding box, and write the preview
    /// next to the original's naming convention: `{owner}/thumb_{stem}.png`.
    ///
    /// Fails with `UnsupportedFormat` when the bytes do not decode as a
    /// raster image and with an I/O error when the write fails.
    pub async fn derive(
        &self,
        owner_id: Uuid,
        source_filename: &str,
        bytes: &[u8],
    ) -> MediaResult<String> {
        let source = image::load_from_memory(bytes).map_err(|_| MediaError::UnsupportedFormat)?;

        let (src_w, src_h) = source.dimensions();
        let (width, height) = fit_within(src_w, src_h, self.max_width, self.max_height);
        let preview = source.resize_exact(width, height, FilterType::Lanczos3);

        let mut encoded = Vec::new();
        preview
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|_| MediaError::UnsupportedFormat)?;

        let stem = Path::new(source_filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(source_filename);
        let locator = format!("{}/{}{}.png", owner_id, THUMB_PREFIX, stem);
        self.store.write(&locator, &encoded).await?;
        Ok(locator)
    }
}

/// Compute dimensions that fit `(width, height)` inside the bounding box
/// while preserving aspect ratio. Never returns a zero dimension.
fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (1, 1);
    }
    let ratio = width as f64 / height as f64;
    let (w, h) = if ratio > 1.0 {
        (max_width, (max_width as f64 / ratio).round() as u32)
    } else {
        ((max_height as f64 * ratio).round() as u32, max_height)
    };
    (w.max(1), h.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn thumbnailer() -> (tempfile::TempDir, Thumbnailer) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        (dir, Thumbnailer::new(store, 300, 300))
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        assert_eq!(fit_within(600, 300, 300, 300), (300, 150));
        assert_eq!(fit_within(300, 600, 300, 300), (150, 300));
        assert_eq!(fit_within(100, 100, 300, 300), (300, 300));
        assert_eq!(fit_within(10000, 1, 300, 300), (300, 1));
    }

    #[tokio::test]
    async fn derive_writes_bounded_preview() {
        let (_dir, thumbs) = thumbnailer();
        let owner = Uuid::new_v4();

        let locator = thumbs
            .derive(owner, "wide.png", &png_bytes(600, 300))
            .await
            .unwrap();

        assert_eq!(locator, format!("{}/thumb_wide.png", owner));
        let written = tokio::fs::read(thumbs.store().resolve(&locator))
            .await
            .unwrap();
        let preview = image::load_from_memory(&written).unwrap();
        assert_eq!(preview.dimensions(), (300, 150));
    }

    #[tokio::test]
    async fn derive_is_deterministic() {
        let (_dir, thumbs) = thumbnailer();
        let owner = Uuid::new_v4();
        let bytes = png_bytes(400, 200);

        let first = thumbs.derive(owner, "a.png", &bytes).await.unwrap();
        let first_bytes = tokio::fs::read(thumbs.store().resolve(&first)).await.unwrap();
        let second = thumbs.derive(owner, "a.png", &bytes).await.unwrap();
        let second_bytes = tokio::fs::read(thumbs.store().resolve(&second)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }

    #[tokio::test]
    async fn derive_rejects_non_image_bytes() {
        let (_dir, thumbs) = thumbnailer();
        let result = thumbs
            .derive(Uuid::new_v4(), "not.png", b"definitely not an image")
            .await;
        assert!(matches!(result, Err(MediaError::UnsupportedFormat)));
    }
}
