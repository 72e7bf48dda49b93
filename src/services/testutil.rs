//! Shared fixtures for service tests: in-memory SQLite pools with the
//! schema applied, tempdir-backed blob stores, and synthetic uploads.

use crate::db;
use crate::models::media_item::MediaKind;
use crate::services::{
    album_catalog::AlbumCatalog,
    blob_store::BlobStore,
    media_catalog::{MediaCatalog, NewMediaItem},
    thumbnailer::Thumbnailer,
    upload::UploadCoordinator,
};
use image::{ImageFormat, Rgba, RgbaImage};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::{io::Cursor, sync::Arc};
use tempfile::TempDir;
use uuid::Uuid;

pub async fn test_pool() -> Arc<SqlitePool> {
    // A single permanent connection: each in-memory SQLite connection is
    // its own database, and the pool must never recycle it mid-test.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<std::time::Duration>)
        .max_lifetime(None::<std::time::Duration>)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    Arc::new(pool)
}

pub struct StoreDirs {
    pub media: TempDir,
    pub thumbs: TempDir,
}

pub fn store_dirs() -> (StoreDirs, BlobStore, BlobStore) {
    let media = tempfile::tempdir().unwrap();
    let thumbs = tempfile::tempdir().unwrap();
    let originals = BlobStore::new(media.path());
    let previews = BlobStore::new(thumbs.path());
    (StoreDirs { media, thumbs }, originals, previews)
}

pub async fn media_catalog() -> (StoreDirs, MediaCatalog) {
    let pool = test_pool().await;
    let (dirs, originals, previews) = store_dirs();
    (dirs, MediaCatalog::new(pool, originals, previews))
}

pub async fn catalogs() -> (StoreDirs, MediaCatalog, AlbumCatalog) {
    let pool = test_pool().await;
    let (dirs, originals, previews) = store_dirs();
    let media = MediaCatalog::new(pool.clone(), originals, previews);
    let albums = AlbumCatalog::new(pool);
    (dirs, media, albums)
}

pub async fn coordinator(max_upload_bytes: i64) -> (StoreDirs, UploadCoordinator, MediaCatalog) {
    let (dirs, uploads, media, _albums) = full_stack(max_upload_bytes).await;
    (dirs, uploads, media)
}

pub async fn full_stack(
    max_upload_bytes: i64,
) -> (StoreDirs, UploadCoordinator, MediaCatalog, AlbumCatalog) {
    let pool = test_pool().await;
    let (dirs, originals, previews) = store_dirs();
    let media = MediaCatalog::new(pool.clone(), originals.clone(), previews.clone());
    let albums = AlbumCatalog::new(pool);
    let thumbs = Thumbnailer::new(previews, 300, 300);
    let uploads = UploadCoordinator::new(originals, thumbs, media.clone(), max_upload_bytes);
    (dirs, uploads, media, albums)
}

pub fn new_item_spec(owner_id: Uuid, filename: &str) -> NewMediaItem {
    NewMediaItem {
        owner_id,
        filename: filename.to_string(),
        path: BlobStore::generate_locator(owner_id, filename),
        thumbnail_path: None,
        size_bytes: 4,
        content_type: "image/jpeg".to_string(),
        kind: MediaKind::Image,
        metadata: "{}".to_string(),
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// Count regular files beneath a directory, recursively.
pub fn file_count(root: &std::path::Path) -> usize {
    let mut count = 0;
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                count += 1;
            }
        }
    }
    count
}
