//! Error types for the gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rembg_common::ErrorResponse;

/// Error types for gateway operations.
///
/// Every variant is terminal for the request that produced it; nothing is
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Unauthorized(String),

    /// The request is well-formed but its payload is unacceptable.
    #[error("{0}")]
    InvalidInput(String),

    /// A required field is missing or a field could not be parsed.
    #[error("{0}")]
    Validation(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Background removal engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("Error processing image: {0}")]
    InferenceFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::EngineNotAvailable(_) | Error::InferenceFailed(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), "{}", detail);
        } else {
            tracing::warn!(status = %status.as_u16(), "{}", detail);
        }

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
