//! Helpers shared by unit and integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rembg_common::RemovalOptions;

use crate::config::{AuthConfig, Config};
use crate::engine::{EngineStatus, RemovalEngine};
use crate::error::{Error, Result};
use crate::state::AppState;

/// A 1x1 transparent PNG.
pub const TRANSPARENT_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

pub const TEST_API_KEY: &str = "test-api-key-12345";

pub fn test_config(api_key: Option<&str>) -> Config {
    Config {
        auth: AuthConfig {
            api_key: api_key.map(String::from),
        },
        ..Config::default()
    }
}

/// A removal call captured by `MockEngine`.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub image: Vec<u8>,
    pub options: RemovalOptions,
}

#[derive(Debug, Clone)]
enum Behavior {
    Succeed,
    Fail(String),
    Unavailable(String),
}

/// In-memory engine that records every call and answers `TRANSPARENT_PNG`.
pub struct MockEngine {
    behavior: Behavior,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::with_behavior(Behavior::Succeed)
    }

    /// Removal calls fail with `InferenceFailed(message)`.
    pub fn failing(message: &str) -> Self {
        Self::with_behavior(Behavior::Fail(message.to_string()))
    }

    /// Health check and removal calls report the engine as missing.
    pub fn unavailable() -> Self {
        Self::with_behavior(Behavior::Unavailable("rembg not installed".to_string()))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last_options(&self) -> Option<RemovalOptions> {
        self.calls().pop().map(|call| call.options)
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemovalEngine for MockEngine {
    fn engine_type(&self) -> &'static str {
        "mock"
    }

    async fn health_check(&self) -> Result<()> {
        match &self.behavior {
            Behavior::Unavailable(reason) => Err(Error::EngineNotAvailable(reason.clone())),
            _ => Ok(()),
        }
    }

    async fn remove_background(
        &self,
        image: Vec<u8>,
        options: &RemovalOptions,
    ) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                image,
                options: options.clone(),
            });

        match &self.behavior {
            Behavior::Succeed => Ok(TRANSPARENT_PNG.to_vec()),
            Behavior::Fail(message) => Err(Error::InferenceFailed(message.clone())),
            Behavior::Unavailable(reason) => Err(Error::EngineNotAvailable(reason.clone())),
        }
    }
}

/// State with an available engine.
pub fn test_state(config: Config, engine: Arc<MockEngine>) -> Arc<AppState> {
    Arc::new(AppState::new(config, engine, EngineStatus::Available))
}

/// Hand-built `multipart/form-data` request body.
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "rembg-test-boundary-7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    /// Add a file part. `content_type` of `None` omits the header.
    pub fn file(
        mut self,
        name: &str,
        filename: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Self {
        self.push_boundary();
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        if let Some(content_type) = content_type {
            self.body
                .extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.push_boundary();
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }

    fn push_boundary(&mut self) {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
    }
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}
