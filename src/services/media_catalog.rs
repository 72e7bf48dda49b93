//! MediaCatalog — media item lifecycle, tag mutation, and per-owner listing
//! backed by SQLite for records and `BlobStore` for payloads.

use crate::models::media_item::{MediaItem, MediaKind};
use crate::services::{
    blob_store::BlobStore,
    error::{MediaError, MediaResult},
};
use chrono::Utc;
use serde_json::{Map, Value, json};
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use tokio::fs::File;
use tracing::warn;
use uuid::Uuid;

const MEDIA_COLUMNS: &str = "id, owner_id, filename, path, thumbnail_path, size_bytes, \
     content_type, kind, metadata, created_at, updated_at, is_deleted";

/// Everything needed to record a freshly ingested media item.
#[derive(Clone, Debug)]
pub struct NewMediaItem {
    pub owner_id: Uuid,
    pub filename: String,
    pub path: String,
    pub thumbnail_path: Option<String>,
    pub size_bytes: i64,
    pub content_type: String,
    pub kind: MediaKind,
    pub metadata: String,
}

#[derive(Clone)]
pub struct MediaCatalog {
    db: Arc<SqlitePool>,
    originals: BlobStore,
    previews: BlobStore,
}

impl MediaCatalog {
    pub fn new(db: Arc<SqlitePool>, originals: BlobStore, previews: BlobStore) -> Self {
        Self {
            db,
            originals,
            previews,
        }
    }

    /// Persist one media item record. Locator uniqueness is enforced by the
    /// schema; no other constraint applies.
    pub async fn create(&self, spec: NewMediaItem) -> MediaResult<MediaItem> {
        let now = Utc::now();
        let item = MediaItem {
            id: Uuid::new_v4(),
            owner_id: spec.owner_id,
            filename: spec.filename,
            path: spec.path,
            thumbnail_path: spec.thumbnail_path,
            size_bytes: spec.size_bytes,
            content_type: spec.content_type,
            kind: spec.kind,
            metadata: spec.metadata,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };

        sqlx::query(
            "INSERT INTO media_items (id, owner_id, filename, path, thumbnail_path, size_bytes, \
             content_type, kind, metadata, created_at, updated_at, is_deleted) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(item.id)
        .bind(item.owner_id)
        .bind(&item.filename)
        .bind(&item.path)
        .bind(&item.thumbnail_path)
        .bind(item.size_bytes)
        .bind(&item.content_type)
        .bind(item.kind)
        .bind(&item.metadata)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&*self.db)
        .await?;

        Ok(item)
    }

    /// Fetch one item scoped to its owner.
    ///
    /// Absent rows and ownership mismatches are indistinguishable to the
    /// caller; both map to `NotFoundOrDenied`.
    pub async fn get(&self, id: Uuid, owner_id: Uuid) -> MediaResult<MediaItem> {
        sqlx::query_as::<_, MediaItem>(&format!(
            "SELECT {} FROM media_items WHERE id = ? AND owner_id = ? AND is_deleted = 0",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_one(&*self.db)
        .await
        .map_err(not_found_or_denied)
    }

    /// Delete an item: its membership rows and record go in one transaction,
    /// then the payload and preview files are removed best-effort. A file
    /// that fails to delete is logged and skipped so a filesystem hiccup
    /// cannot leave the database half-updated.
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> MediaResult<()> {
        let item = self.get(id, owner_id).await?;

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM album_media_items WHERE media_item_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM media_items WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MediaError::NotFoundOrDenied);
        }
        tx.commit().await?;

        if let Err(err) = self.originals.delete(&item.path).await {
            warn!("failed to remove payload {}: {}", item.path, err);
        }
        if let Some(thumb) = &item.thumbnail_path {
            if let Err(err) = self.previews.delete(thumb).await {
                warn!("failed to remove thumbnail {}: {}", thumb, err);
            }
        }
        Ok(())
    }

    /// List an owner's items, newest first.
    ///
    /// The returned total always reflects the kind filter, independent of
    /// the pagination window.
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        kind: Option<MediaKind>,
        offset: i64,
        limit: i64,
    ) -> MediaResult<(Vec<MediaItem>, i64)> {
        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM media_items WHERE owner_id = ",
        );
        count.push_bind(owner_id);
        count.push(" AND is_deleted = 0");
        if let Some(kind) = kind {
            count.push(" AND kind = ");
            count.push_bind(kind);
        }
        let total: i64 = count.build_query_scalar().fetch_one(&*self.db).await?;

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM media_items WHERE owner_id = ",
            MEDIA_COLUMNS
        ));
        builder.push_bind(owner_id);
        builder.push(" AND is_deleted = 0");
        if let Some(kind) = kind {
            builder.push(" AND kind = ");
            builder.push_bind(kind);
        }
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit.max(0));
        builder.push(" OFFSET ");
        builder.push_bind(offset.max(0));

        let items = builder.build_query_as().fetch_all(&*self.db).await?;
        Ok((items, total))
    }

    /// Add tags to an item's metadata blob, case-sensitive, de-duplicated,
    /// preserving insertion order. Returns the resulting tag list.
    ///
    /// The read-modify-write is not isolated against concurrent tag edits
    /// on the same item; the last writer wins.
    pub async fn merge_tags(
        &self,
        id: Uuid,
        owner_id: Uuid,
        tags_to_add: &[String],
    ) -> MediaResult<Vec<String>> {
        let item = self.get(id, owner_id).await?;
        let mut metadata = parse_metadata(&item.metadata);
        let mut tags = metadata_tags(&metadata);

        for tag in tags_to_add {
            if !tags.iter().any(|existing| existing == tag) {
                tags.push(tag.clone());
            }
        }

        metadata.insert("tags".into(), json!(tags));
        self.write_metadata(id, owner_id, &metadata).await?;
        Ok(tags)
    }

    /// Remove tags from an item's metadata blob. Unknown tags are ignored.
    pub async fn remove_tags(
        &self,
        id: Uuid,
        owner_id: Uuid,
        tags_to_remove: &[String],
    ) -> MediaResult<Vec<String>> {
        let item = self.get(id, owner_id).await?;
        let mut metadata = parse_metadata(&item.metadata);
        let tags: Vec<String> = metadata_tags(&metadata)
            .into_iter()
            .filter(|tag| !tags_to_remove.contains(tag))
            .collect();

        metadata.insert("tags".into(), json!(tags));
        self.write_metadata(id, owner_id, &metadata).await?;
        Ok(tags)
    }

    async fn write_metadata(
        &self,
        id: Uuid,
        owner_id: Uuid,
        metadata: &Map<String, Value>,
    ) -> MediaResult<()> {
        let blob = serde_json::to_string(metadata)?;
        let result = sqlx::query(
            "UPDATE media_items SET metadata = ?, updated_at = ? \
             WHERE id = ? AND owner_id = ? AND is_deleted = 0",
        )
        .bind(blob)
        .bind(Utc::now())
        .bind(id)
        .bind(owner_id)
        .execute(&*self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(MediaError::NotFoundOrDenied);
        }
        Ok(())
    }

    /// Open the original payload of an item for streaming out.
    pub async fn open_original(&self, item: &MediaItem) -> MediaResult<File> {
        self.originals.open(&item.path).await
    }

    /// Open the derived thumbnail of an item, if it has one.
    pub async fn open_thumbnail(&self, item: &MediaItem) -> MediaResult<File> {
        let locator = item
            .thumbnail_path
            .as_deref()
            .ok_or(MediaError::NotFoundOrDenied)?;
        self.previews.open(locator).await
    }
}

/// Map a row miss onto the collapsed existence/ownership error.
pub(crate) fn not_found_or_denied(err: sqlx::Error) -> MediaError {
    match err {
        sqlx::Error::RowNotFound => MediaError::NotFoundOrDenied,
        other => MediaError::Sqlx(other),
    }
}

/// Parse a metadata blob into a JSON object, falling back to an empty one
/// when the stored text is not an object.
fn parse_metadata(blob: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(blob) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Extract the tag list from a metadata object, skipping non-string entries.
fn metadata_tags(metadata: &Map<String, Value>) -> Vec<String> {
    metadata
        .get("tags")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::{media_catalog, new_item_spec};

    #[tokio::test]
    async fn get_denies_foreign_owner() {
        let (_dir, catalog) = media_catalog().await;
        let owner = Uuid::new_v4();
        let item = catalog.create(new_item_spec(owner, "a.jpg")).await.unwrap();

        let err = catalog.get(item.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, MediaError::NotFoundOrDenied));
        assert!(catalog.get(item.id, owner).await.is_ok());
    }

    #[tokio::test]
    async fn list_total_reflects_filter_not_page() {
        let (_dir, catalog) = media_catalog().await;
        let owner = Uuid::new_v4();
        for i in 0..3 {
            catalog
                .create(new_item_spec(owner, &format!("img{}.jpg", i)))
                .await
                .unwrap();
        }
        let mut video = new_item_spec(owner, "clip.mp4");
        video.kind = MediaKind::Video;
        video.content_type = "video/mp4".into();
        catalog.create(video).await.unwrap();

        let (page, total) = catalog
            .list_by_owner(owner, Some(MediaKind::Image), 0, 2)
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(total, 3);

        let (all, total_all) = catalog.list_by_owner(owner, None, 0, 50).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(total_all, 4);

        let (other, other_total) = catalog
            .list_by_owner(Uuid::new_v4(), None, 0, 50)
            .await
            .unwrap();
        assert!(other.is_empty());
        assert_eq!(other_total, 0);
    }

    #[tokio::test]
    async fn merge_tags_dedupes_and_preserves_order() {
        let (_dir, catalog) = media_catalog().await;
        let owner = Uuid::new_v4();
        let item = catalog.create(new_item_spec(owner, "a.jpg")).await.unwrap();

        let tags = catalog
            .merge_tags(item.id, owner, &["cat".into(), "pet".into()])
            .await
            .unwrap();
        assert_eq!(tags, vec!["cat", "pet"]);

        let tags = catalog
            .merge_tags(item.id, owner, &["pet".into(), "Cat".into()])
            .await
            .unwrap();
        assert_eq!(tags, vec!["cat", "pet", "Cat"]);

        let tags = catalog
            .remove_tags(item.id, owner, &["pet".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(tags, vec!["cat", "Cat"]);
    }

    #[tokio::test]
    async fn delete_removes_record_and_files() {
        let (_dir, catalog) = media_catalog().await;
        let owner = Uuid::new_v4();
        let item = catalog.create(new_item_spec(owner, "a.jpg")).await.unwrap();

        catalog.delete(item.id, owner).await.unwrap();

        let err = catalog.get(item.id, owner).await.unwrap_err();
        assert!(matches!(err, MediaError::NotFoundOrDenied));
        // Repeat delete reports the collapsed error too.
        let err = catalog.delete(item.id, owner).await.unwrap_err();
        assert!(matches!(err, MediaError::NotFoundOrDenied));
    }
}
