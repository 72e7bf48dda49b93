//! Error taxonomy shared by the catalog and storage services.

use std::io;
use thiserror::Error;

/// Failures surfaced by the media library services.
///
/// Existence and ownership failures are deliberately collapsed into the
/// single `NotFoundOrDenied` variant so callers cannot probe for ids they
/// do not own.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("not found or access denied")]
    NotFoundOrDenied,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: i64, max: i64 },
    #[error("unsupported media type `{0}`")]
    UnsupportedMediaType(String),
    #[error("could not decode image data")]
    UnsupportedFormat,
    #[error("media item is not in the album")]
    NotInAlbum,
    #[error("media item is already in the album")]
    AlreadyInAlbum,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type MediaResult<T> = Result<T, MediaError>;

/// Return true if a SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
