//! Authenticator capability consumed by the HTTP layer.
//!
//! Token issuance, sessions, and password handling live outside this
//! service; all it needs is `identify`: credential token in, owner id out.
//! Every handler resolves the owner first and stamps it on each catalog
//! call, which is the only place ownership enters the system.

use crate::errors::AppError;
use axum::http::{HeaderMap, header};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credential token")]
    InvalidToken,
}

pub trait Authenticator: Send + Sync {
    fn identify(&self, token: &str) -> Result<Uuid, AuthError>;
}

/// Development authenticator: the bearer token is the owner id itself.
///
/// Stands in for a real token service in local setups and tests; anything
/// that is not a well-formed UUID is rejected.
#[derive(Clone, Debug, Default)]
pub struct LocalTokenAuthenticator;

impl Authenticator for LocalTokenAuthenticator {
    fn identify(&self, token: &str) -> Result<Uuid, AuthError> {
        Uuid::parse_str(token).map_err(|_| AuthError::InvalidToken)
    }
}

/// Resolve the owner id from an `Authorization: Bearer <token>` header.
pub fn bearer_owner(auth: &dyn Authenticator, headers: &HeaderMap) -> Result<Uuid, AppError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
    auth.identify(token)
        .map_err(|err| AppError::unauthorized(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_owner_parses_token() {
        let owner = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", owner)).unwrap(),
        );
        let resolved = bearer_owner(&LocalTokenAuthenticator, &headers).unwrap();
        assert_eq!(resolved, owner);
    }

    #[test]
    fn missing_or_bad_tokens_are_unauthorized() {
        let headers = HeaderMap::new();
        assert!(bearer_owner(&LocalTokenAuthenticator, &headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not-a-uuid"),
        );
        assert!(bearer_owner(&LocalTokenAuthenticator, &headers).is_err());
    }
}
