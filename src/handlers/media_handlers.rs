//! HTTP handlers for media ingestion, retrieval, and tag mutation.
//! Payload downloads stream from disk; all logic lives in the services.

use crate::{auth::bearer_owner, errors::AppError, models::media_item::MediaKind, state::AppState};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Query params accepted by the media listing.
#[derive(Debug, Deserialize)]
pub struct ListMediaQuery {
    pub kind: Option<MediaKind>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListMediaResponse {
    pub items: Vec<crate::models::media_item::MediaItem>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<String>,
}

/// `POST /media` — multipart upload with a single `file` field.
pub async fn upload_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(err.to_string()))?;

        let item = state
            .uploads
            .ingest(&file_name, &bytes, &content_type, owner)
            .await?;
        return Ok((StatusCode::CREATED, Json(item)));
    }

    Err(AppError::bad_request("no file provided"))
}

/// `GET /media` — list the caller's items, newest first.
pub async fn list_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<ListMediaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let offset = q.offset.unwrap_or(0).max(0);
    let limit = q.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let (items, total) = state.media.list_by_owner(owner, q.kind, offset, limit).await?;
    Ok(Json(ListMediaResponse {
        items,
        total,
        offset,
        limit,
    }))
}

/// `GET /media/{id}` — metadata record only.
pub async fn get_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let item = state.media.get(id, owner).await?;
    Ok(Json(item))
}

/// `GET /media/{id}/file` — stream the original payload.
pub async fn download_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let item = state.media.get(id, owner).await?;
    let file = state.media.open_original(&item).await?;

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    let resp_headers = response.headers_mut();
    resp_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&item.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    resp_headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&item.size_bytes.max(0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    Ok(response)
}

/// `GET /media/{id}/thumbnail` — stream the derived preview (PNG).
pub async fn download_thumbnail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let item = state.media.get(id, owner).await?;
    let file = state.media.open_thumbnail(&item).await?;

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    Ok(response)
}

/// `DELETE /media/{id}` — cascade out of albums and remove files.
pub async fn delete_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    state.media.delete(id, owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /media/{id}/tags` — merge tags into the item's metadata.
pub async fn add_tags(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<TagsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let tags = state.media.merge_tags(id, owner, &req.tags).await?;
    Ok(Json(json!({ "tags": tags })))
}

/// `DELETE /media/{id}/tags` — remove tags from the item's metadata.
pub async fn remove_tags(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<TagsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = bearer_owner(state.auth.as_ref(), &headers)?;
    let tags = state.media.remove_tags(id, owner, &req.tags).await?;
    Ok(Json(json!({ "tags": tags })))
}
