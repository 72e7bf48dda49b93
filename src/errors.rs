use crate::services::error::MediaError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for a 401 Unauthorized
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// Map the service error taxonomy onto HTTP statuses. Internal storage and
/// database failures keep a generic message; the detail stays in the logs.
impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        let status = match &err {
            MediaError::NotFoundOrDenied => StatusCode::NOT_FOUND,
            MediaError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MediaError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            MediaError::UnsupportedMediaType(_) | MediaError::UnsupportedFormat => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            MediaError::NotInAlbum | MediaError::AlreadyInAlbum => StatusCode::CONFLICT,
            MediaError::Sqlx(_) | MediaError::Io(_) | MediaError::Json(_) => {
                tracing::error!("internal error: {}", err);
                return AppError::internal("internal error");
            }
        };
        AppError::new(status, err.to_string())
    }
}
