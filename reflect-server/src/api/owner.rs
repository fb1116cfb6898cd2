//! Owner identity extraction
//!
//! The upstream auth proxy injects `x-owner-id` after authenticating the
//! request. The server trusts the header and scopes every query by it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::ApiError;

/// The authenticated owner of the request
#[derive(Debug, Clone)]
pub struct OwnerId(pub String);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get("x-owner-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("missing x-owner-id header".to_string()))?;

        Ok(OwnerId(owner.to_string()))
    }
}
