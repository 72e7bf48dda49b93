//! UploadCoordinator — orchestrates BlobStore, ThumbnailEngine, and
//! MediaCatalog into one all-or-nothing ingestion.
//!
//! The filesystem and the database are separate resources, so there is no
//! shared transaction. Instead every failure after a blob write triggers
//! compensating deletes of whatever this attempt already wrote. Compensation
//! itself is tolerant: a file that is already gone counts as removed.

use crate::models::media_item::{MediaItem, MediaKind};
use crate::services::{
    blob_store::BlobStore,
    error::{MediaError, MediaResult},
    media_catalog::{MediaCatalog, NewMediaItem},
    thumbnailer::Thumbnailer,
};
use chrono::Utc;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

pub const DEFAULT_MAX_UPLOAD_BYTES: i64 = 32 << 20;

const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
const ALLOWED_VIDEO_TYPES: [&str; 4] = ["video/mp4", "video/webm", "video/avi", "video/mpeg"];

/// Classify a declared MIME type against the allow-lists.
pub fn classify_mime(content_type: &str) -> Option<MediaKind> {
    if ALLOWED_IMAGE_TYPES.contains(&content_type) {
        Some(MediaKind::Image)
    } else if ALLOWED_VIDEO_TYPES.contains(&content_type) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

#[derive(Clone)]
pub struct UploadCoordinator {
    blobs: BlobStore,
    thumbs: Thumbnailer,
    catalog: MediaCatalog,
    max_upload_bytes: i64,
}

impl UploadCoordinator {
    pub fn new(
        blobs: BlobStore,
        thumbs: Thumbnailer,
        catalog: MediaCatalog,
        max_upload_bytes: i64,
    ) -> Self {
        Self {
            blobs,
            thumbs,
            catalog,
            max_upload_bytes,
        }
    }

    /// Ingest one upload: validate, store, derive a preview for images,
    /// record. On any failure nothing persists — already-written files are
    /// compensated away before the error propagates.
    pub async fn ingest(
        &self,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
        owner_id: Uuid,
    ) -> MediaResult<MediaItem> {
        let size = bytes.len() as i64;
        if size > self.max_upload_bytes {
            return Err(MediaError::PayloadTooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }

        let kind = classify_mime(content_type)
            .ok_or_else(|| MediaError::UnsupportedMediaType(content_type.to_string()))?;

        let path = self.blobs.put(owner_id, file_name, bytes).await?;

        let thumbnail_path = if kind == MediaKind::Image {
            match self.thumbs.derive(owner_id, &path, bytes).await {
                Ok(locator) => Some(locator),
                Err(err) => {
                    self.compensate(&path, None).await;
                    return Err(err);
                }
            }
        } else {
            None
        };

        let metadata = json!({
            "originalName": file_name,
            "uploadTime": Utc::now().to_rfc3339(),
            "fileType": kind.as_str(),
        })
        .to_string();

        let filename = path.rsplit('/').next().unwrap_or(&path).to_string();
        let spec = NewMediaItem {
            owner_id,
            filename,
            path: path.clone(),
            thumbnail_path: thumbnail_path.clone(),
            size_bytes: size,
            content_type: content_type.to_string(),
            kind,
            metadata,
        };

        match self.catalog.create(spec).await {
            Ok(item) => Ok(item),
            Err(err) => {
                self.compensate(&path, thumbnail_path.as_deref()).await;
                Err(err)
            }
        }
    }

    /// Remove whatever this attempt wrote. Missing files count as removed;
    /// anything else is logged and skipped so the original error wins.
    async fn compensate(&self, path: &str, thumbnail_path: Option<&str>) {
        if let Err(err) = self.blobs.delete(path).await {
            warn!("compensation failed for payload {}: {}", path, err);
        }
        if let Some(thumb) = thumbnail_path {
            if let Err(err) = self.thumbs.store().delete(thumb).await {
                warn!("compensation failed for thumbnail {}: {}", thumb, err);
            }
        }
    }
}
