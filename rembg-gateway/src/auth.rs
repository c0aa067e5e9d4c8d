//! Shared-secret API key authentication.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::{Error, Result};
use crate::state::AppState;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Check a provided key against the configured one.
///
/// No configured key allows everything. Comparison is exact and
/// case-sensitive.
pub fn authorize(expected: Option<&str>, provided: Option<&HeaderValue>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match provided {
        None => Err(Error::Unauthorized("X-API-Key header is required".to_string())),
        Some(value) if value.is_empty() => {
            Err(Error::Unauthorized("X-API-Key header is required".to_string()))
        }
        Some(value) if value.as_bytes() == expected.as_bytes() => Ok(()),
        Some(_) => Err(Error::Unauthorized("Invalid API key".to_string())),
    }
}

/// Middleware rejecting requests without a valid `X-API-Key` header.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    authorize(
        state.config.auth.api_key(),
        request.headers().get(API_KEY_HEADER),
    )?;
    Ok(next.run(request).await)
}
