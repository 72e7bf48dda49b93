//! Represents an album — a named, ordered collection of media items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An album owned by one user.
///
/// Membership lives in the `album_media_items` junction; `media_count` is
/// recomputed from it at read time rather than stored, so it cannot drift.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Album {
    /// Unique identifier for this album.
    pub id: Uuid,

    /// ID of the owning user.
    pub owner_id: Uuid,

    /// Album name (required, non-empty).
    pub name: String,

    /// Optional free-text description.
    pub description: String,

    /// Cover locator, copied from a member item's thumbnail when the cover
    /// was set. A weak reference: deleting that item does not clear it.
    pub cover_path: Option<String>,

    /// When this album was created.
    pub created_at: DateTime<Utc>,

    /// When this album was last modified.
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker.
    pub is_deleted: bool,

    /// Number of member items, computed per query.
    #[sqlx(default)]
    pub media_count: i64,
}
