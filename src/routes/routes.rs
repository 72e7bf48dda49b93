//! Defines routes for all media and album operations.
//!
//! ## Structure
//! - **Media endpoints**
//!   - `POST   /media` — multipart upload (field `file`)
//!   - `GET    /media` — list (supports kind, offset, limit)
//!   - `GET    /media/{id}` — metadata record
//!   - `GET    /media/{id}/file` — stream the original payload
//!   - `GET    /media/{id}/thumbnail` — stream the derived preview
//!   - `DELETE /media/{id}` — delete item, cascade out of albums
//!   - `POST   /media/{id}/tags` / `DELETE /media/{id}/tags` — tag mutation
//!
//! - **Album endpoints**
//!   - `POST /albums`, `GET /albums`
//!   - `GET/PUT/DELETE /albums/{id}`
//!   - `GET/POST /albums/{id}/media`, `DELETE /albums/{id}/media/{media_id}`
//!   - `PUT /albums/{id}/order`, `PUT /albums/{id}/cover`
//!
//! Every request carries an `Authorization: Bearer <token>` header that the
//! Authenticator resolves to an owner id.

use crate::{
    handlers::{
        album_handlers::{
            add_album_media, create_album, delete_album, get_album, get_album_media, list_albums,
            remove_album_media, reorder_album_media, set_album_cover, update_album,
        },
        health_handlers::{healthz, readyz},
        media_handlers::{
            add_tags, delete_media, download_media, download_thumbnail, get_media, list_media,
            remove_tags, upload_media,
        },
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

/// Build and return the router for all media library routes.
///
/// The body limit sits above the coordinator's own payload cap so oversize
/// uploads are rejected by `ingest` with a clean `PayloadTooLarge`, not cut
/// off mid-body by the extractor.
pub fn routes(max_upload_bytes: i64) -> Router<AppState> {
    let body_limit = (max_upload_bytes as usize).saturating_add(1 << 20);

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // media
        .route("/media", post(upload_media).get(list_media))
        .route("/media/{id}", get(get_media).delete(delete_media))
        .route("/media/{id}/file", get(download_media))
        .route("/media/{id}/thumbnail", get(download_thumbnail))
        .route("/media/{id}/tags", post(add_tags).delete(remove_tags))
        // albums
        .route("/albums", post(create_album).get(list_albums))
        .route(
            "/albums/{id}",
            get(get_album).put(update_album).delete(delete_album),
        )
        .route(
            "/albums/{id}/media",
            get(get_album_media).post(add_album_media),
        )
        .route("/albums/{id}/media/{media_id}", delete(remove_album_media))
        .route("/albums/{id}/order", put(reorder_album_media))
        .route("/albums/{id}/cover", put(set_album_cover))
        .layer(DefaultBodyLimit::max(body_limit))
}
