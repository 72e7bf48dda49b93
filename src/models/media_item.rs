//! Represents a single media item (photo or video) owned by one user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Coarse classification of a media item, derived from its declared
/// content type at ingestion time.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// A media item record.
///
/// The record stores locators (path-like strings relative to the configured
/// storage roots) for the original payload and, for images, a derived
/// thumbnail. The payload bytes themselves live on disk.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct MediaItem {
    /// Unique identifier for this item.
    pub id: Uuid,

    /// ID of the owning user. Immutable after creation.
    pub owner_id: Uuid,

    /// Generated on-disk filename (unique per item).
    pub filename: String,

    /// Locator of the original payload beneath the media root.
    pub path: String,

    /// Locator of the derived thumbnail beneath the thumbnail root.
    /// `None` for media kinds without previews (videos).
    pub thumbnail_path: Option<String>,

    /// Size of the original payload in bytes.
    pub size_bytes: i64,

    /// Declared MIME type of the upload.
    pub content_type: String,

    /// Coarse image/video classification.
    pub kind: MediaKind,

    /// Free-form metadata as a JSON object string. Holds the original
    /// filename, upload time, and the ordered de-duplicated tag list.
    pub metadata: String,

    /// When this item was created.
    pub created_at: DateTime<Utc>,

    /// When this item was last modified.
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker.
    pub is_deleted: bool,
}
