//! JSON bodies returned by the gateway.

use serde::{Deserialize, Serialize};

use crate::ModelDescriptor;

/// Service identifier reported by `/health`.
pub const SERVICE_NAME: &str = "remove-bg-provider";

/// Greeting returned by `/`.
pub const ROOT_MESSAGE: &str = "Remove Background Provider";

/// GET / response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}

impl RootResponse {
    pub fn running() -> Self {
        Self {
            message: ROOT_MESSAGE.to_string(),
            status: "running".to_string(),
        }
    }
}

/// GET /health response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    /// Why the service is degraded, if it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            detail: None,
        }
    }

    pub fn degraded(detail: impl Into<String>) -> Self {
        Self {
            status: "degraded".to_string(),
            service: SERVICE_NAME.to_string(),
            detail: Some(detail.into()),
        }
    }
}

/// GET /models response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelDescriptor>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
