//! Represents the album/media junction with an explicit display order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One membership row linking an album to a media item.
///
/// The `(album_id, media_item_id)` pair is unique. `display_order` is a
/// positive integer that is not required to stay contiguous after removals;
/// new members are appended after the current maximum.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct AlbumMediaItem {
    /// Parent album ID.
    pub album_id: Uuid,

    /// Member media item ID.
    pub media_item_id: Uuid,

    /// Position within the album, ascending.
    pub display_order: i64,

    /// When the item was added to the album.
    pub added_at: DateTime<Utc>,
}
