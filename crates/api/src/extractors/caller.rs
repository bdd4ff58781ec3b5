//! Opaque caller identity extractor.
//!
//! Staff authentication is an external collaborator; the engine only needs
//! an opaque identity for audit trails. Callers pass it in the
//! `X-Caller-Id` header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Header carrying the opaque staff identity.
pub const CALLER_ID_HEADER: &str = "X-Caller-Id";

/// Opaque identity of the staff member performing the request.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(CALLER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("Missing {} header", CALLER_ID_HEADER))
            })?;

        Ok(Self { id: id.to_string() })
    }
}
