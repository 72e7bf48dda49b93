//! AlbumCatalog — album lifecycle, ordered membership, and cover selection.
//!
//! Every multi-step mutation (cascade delete, batch add, reorder, cover)
//! runs inside one SQLite transaction so concurrent readers never observe a
//! membership row pointing at a half-deleted album or a half-applied batch.

use crate::models::{album::Album, media_item::MediaItem, membership::AlbumMediaItem};
use crate::services::error::{MediaError, MediaResult, is_unique_violation};
use crate::services::media_catalog::not_found_or_denied;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

const ALBUM_COLUMNS: &str = "id, owner_id, name, description, cover_path, created_at, \
     updated_at, is_deleted, \
     (SELECT COUNT(*) FROM album_media_items ami WHERE ami.album_id = albums.id) AS media_count";

#[derive(Clone)]
pub struct AlbumCatalog {
    db: Arc<SqlitePool>,
}

impl AlbumCatalog {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: &str, description: &str, owner_id: Uuid) -> MediaResult<Album> {
        if name.trim().is_empty() {
            return Err(MediaError::InvalidInput("album name must not be empty".into()));
        }

        let now = Utc::now();
        let album = Album {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            description: description.to_string(),
            cover_path: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            media_count: 0,
        };

        sqlx::query(
            "INSERT INTO albums (id, owner_id, name, description, cover_path, created_at, \
             updated_at, is_deleted) VALUES (?, ?, ?, ?, NULL, ?, ?, 0)",
        )
        .bind(album.id)
        .bind(album.owner_id)
        .bind(&album.name)
        .bind(&album.description)
        .bind(album.created_at)
        .bind(album.updated_at)
        .execute(&*self.db)
        .await?;

        Ok(album)
    }

    /// Fetch one album with its media count recomputed from the junction.
    pub async fn get(&self, id: Uuid, owner_id: Uuid) -> MediaResult<Album> {
        sqlx::query_as::<_, Album>(&format!(
            "SELECT {} FROM albums WHERE id = ? AND owner_id = ? AND is_deleted = 0",
            ALBUM_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_one(&*self.db)
        .await
        .map_err(not_found_or_denied)
    }

    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        description: &str,
    ) -> MediaResult<()> {
        if name.trim().is_empty() {
            return Err(MediaError::InvalidInput("album name must not be empty".into()));
        }

        let result = sqlx::query(
            "UPDATE albums SET name = ?, description = ?, updated_at = ? \
             WHERE id = ? AND owner_id = ? AND is_deleted = 0",
        )
        .bind(name)
        .bind(description)
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

    /// Delete an album and its membership rows atomically. Member media
    /// items survive; only the junction is cascaded.
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> MediaResult<()> {
        let mut tx = self.db.begin().await?;
        ensure_album_owned(&mut tx, id, owner_id).await?;

        sqlx::query("DELETE FROM album_media_items WHERE album_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM albums WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> MediaResult<Vec<Album>> {
        let albums = sqlx::query_as::<_, Album>(&format!(
            "SELECT {} FROM albums WHERE owner_id = ? AND is_deleted = 0 \
             ORDER BY created_at DESC",
            ALBUM_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(albums)
    }

    /// Add media items to an album, atomic over the whole batch.
    ///
    /// Each item must be owned by the album's owner; the first mismatch
    /// aborts the batch with no partial insert. Display orders append after
    /// the current maximum, preserving the input order.
    pub async fn add_media(
        &self,
        album_id: Uuid,
        media_ids: &[Uuid],
        owner_id: Uuid,
    ) -> MediaResult<()> {
        let mut tx = self.db.begin().await?;
        ensure_album_owned(&mut tx, album_id, owner_id).await?;

        let max_order: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(display_order), 0) FROM album_media_items WHERE album_id = ?",
        )
        .bind(album_id)
        .fetch_one(&mut *tx)
        .await?;

        let added_at = Utc::now();
        for (i, media_id) in media_ids.iter().enumerate() {
            let owned: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM media_items \
                 WHERE id = ? AND owner_id = ? AND is_deleted = 0",
            )
            .bind(media_id)
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;
            if owned == 0 {
                return Err(MediaError::NotFoundOrDenied);
            }

            let membership = AlbumMediaItem {
                album_id,
                media_item_id: *media_id,
                display_order: max_order + 1 + i as i64,
                added_at,
            };
            let insert = sqlx::query(
                "INSERT INTO album_media_items (album_id, media_item_id, display_order, added_at) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(membership.album_id)
            .bind(membership.media_item_id)
            .bind(membership.display_order)
            .bind(membership.added_at)
            .execute(&mut *tx)
            .await;

            match insert {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => {
                    return Err(MediaError::AlreadyInAlbum);
                }
                Err(err) => return Err(MediaError::Sqlx(err)),
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Remove one membership row. Other rows keep their order values.
    pub async fn remove_media(
        &self,
        album_id: Uuid,
        media_id: Uuid,
        owner_id: Uuid,
    ) -> MediaResult<()> {
        let mut tx = self.db.begin().await?;
        ensure_album_owned(&mut tx, album_id, owner_id).await?;

        let result = sqlx::query(
            "DELETE FROM album_media_items WHERE album_id = ? AND media_item_id = ?",
        )
        .bind(album_id)
        .bind(media_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MediaError::NotInAlbum);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Return an album's media items sorted by display order ascending.
    pub async fn get_media_ordered(
        &self,
        album_id: Uuid,
        owner_id: Uuid,
    ) -> MediaResult<Vec<MediaItem>> {
        let mut conn = self.db.acquire().await?;
        ensure_album_owned(&mut conn, album_id, owner_id).await?;

        let items = sqlx::query_as::<_, MediaItem>(
            "SELECT m.id, m.owner_id, m.filename, m.path, m.thumbnail_path, m.size_bytes, \
                    m.content_type, m.kind, m.metadata, m.created_at, m.updated_at, m.is_deleted \
             FROM media_items m \
             INNER JOIN album_media_items ami ON m.id = ami.media_item_id \
             WHERE ami.album_id = ? \
             ORDER BY ami.display_order ASC, ami.added_at ASC",
        )
        .bind(album_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(items)
    }

    /// Copy a member item's preview locator into the album's cover.
    ///
    /// The item must be owned by the same user and currently a member of
    /// the album. Items without a preview (videos) contribute their primary
    /// locator instead. The copy is a weak reference by design: it is never
    /// cleared when the item later leaves the album or is deleted.
    pub async fn set_cover(
        &self,
        album_id: Uuid,
        media_id: Uuid,
        owner_id: Uuid,
    ) -> MediaResult<()> {
        let mut tx = self.db.begin().await?;
        ensure_album_owned(&mut tx, album_id, owner_id).await?;

        let locators: (Option<String>, String) = sqlx::query_as(
            "SELECT thumbnail_path, path FROM media_items \
             WHERE id = ? AND owner_id = ? AND is_deleted = 0",
        )
        .bind(media_id)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(not_found_or_denied)?;

        let member: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM album_media_items WHERE album_id = ? AND media_item_id = ?",
        )
        .bind(album_id)
        .bind(media_id)
        .fetch_one(&mut *tx)
        .await?;
        if member == 0 {
            return Err(MediaError::NotInAlbum);
        }

        let cover = locators.0.unwrap_or(locators.1);
        sqlx::query("UPDATE albums SET cover_path = ?, updated_at = ? WHERE id = ?")
            .bind(cover)
            .bind(Utc::now())
            .bind(album_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Set each listed item's display order to its 1-based position, atomic
    /// over the whole sequence. An id with no membership row aborts the
    /// operation and rolls back any positions already applied. Items not in
    /// the list keep their previous order values.
    pub async fn reorder(
        &self,
        album_id: Uuid,
        ordered_media_ids: &[Uuid],
        owner_id: Uuid,
    ) -> MediaResult<()> {
        let mut tx = self.db.begin().await?;
        ensure_album_owned(&mut tx, album_id, owner_id).await?;

        for (i, media_id) in ordered_media_ids.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE album_media_items SET display_order = ? \
                 WHERE album_id = ? AND media_item_id = ?",
            )
            .bind(i as i64 + 1)
            .bind(album_id)
            .bind(media_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(MediaError::NotInAlbum);
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Ownership gate shared by every album operation: absent album and foreign
/// album are indistinguishable.
async fn ensure_album_owned(
    conn: &mut SqliteConnection,
    album_id: Uuid,
    owner_id: Uuid,
) -> MediaResult<()> {
    let found: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM albums WHERE id = ? AND owner_id = ? AND is_deleted = 0",
    )
    .bind(album_id)
    .bind(owner_id)
    .fetch_one(conn)
    .await?;
    if found == 0 {
        return Err(MediaError::NotFoundOrDenied);
    }
    Ok(())
}
