//! Shared application state handed to every handler.

use crate::auth::Authenticator;
use crate::services::{
    album_catalog::AlbumCatalog, media_catalog::MediaCatalog, upload::UploadCoordinator,
};
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};

#[derive(Clone)]
pub struct AppState {
    pub media: MediaCatalog,
    pub albums: AlbumCatalog,
    pub uploads: UploadCoordinator,
    pub auth: Arc<dyn Authenticator>,
    /// Pool handle for the readiness probe.
    pub db: Arc<SqlitePool>,
    /// Media root for the readiness disk check.
    pub media_root: PathBuf,
}
