//! HTTP handlers for album lifecycle, membership, ordering, and covers.

use crate::{auth::bearer_owner, errors::AppError, state::AppState};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AlbumRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaIdsRequest {
    pub media_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CoverRequest {
    pub media_id: Uuid,
}

/// `POST /albums`
pub async fn create_album(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AlbumRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let album = state.albums.create(&req.name, &req.description, owner).await?;
    Ok((StatusCode::CREATED, Json(album)))
}

/// `GET /albums`
pub async fn list_albums(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let albums = state.albums.list_by_owner(owner).await?;
    Ok(Json(albums))
}

/// `GET /albums/{id}`
pub async fn get_album(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let album = state.albums.get(id, owner).await?;
    Ok(Json(album))
}

/// `PUT /albums/{id}`
pub async fn update_album(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<AlbumRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    state
        .albums
        .update(id, owner, &req.name, &req.description)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /albums/{id}` — cascades to membership rows only.
pub async fn delete_album(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    state.albums.delete(id, owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /albums/{id}/media` — members by display order ascending.
pub async fn get_album_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let items = state.albums.get_media_ordered(id, owner).await?;
    Ok(Json(items))
}

/// `POST /albums/{id}/media` — append a batch of items, atomic.
pub async fn add_album_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<MediaIdsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    state.albums.add_media(id, &req.media_ids, owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /albums/{id}/media/{media_id}`
pub async fn remove_album_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, media_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    state.albums.remove_media(id, media_id, owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /albums/{id}/order` — 1-based positions from the given list.
pub async fn reorder_album_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<MediaIdsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    state.albums.reorder(id, &req.media_ids, owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /albums/{id}/cover` — copy a member item's preview locator.
pub async fn set_album_cover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<CoverRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    state.albums.set_cover(id, req.media_id, owner).await?;
    Ok(StatusCode::NO_CONTENT)
}
