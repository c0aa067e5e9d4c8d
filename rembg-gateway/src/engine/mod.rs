//! Background removal engine abstraction layer.
//!
//! This module defines the `RemovalEngine` trait that hides how the rembg
//! collaborator is reached (command line, HTTP server) behind a common
//! interface. The engine is chosen once at startup and injected into the
//! application state.

mod cli;
mod http;

pub use cli::RembgCliEngine;
pub use http::RembgHttpEngine;

use std::sync::Arc;

use async_trait::async_trait;
use rembg_common::RemovalOptions;

use crate::config::{EngineConfig, EngineKind};
use crate::error::Result;

/// Outcome of the startup capability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Available,
    /// The engine failed its check; the reason is reported by `/health`.
    Unavailable(String),
}

/// Primary trait for background removal engines.
///
/// Implementations must be safe to call concurrently: every request makes
/// exactly one independent call, with no retry and no gateway-side timeout.
#[async_trait]
pub trait RemovalEngine: Send + Sync {
    /// Unique identifier for this engine type (e.g., "cli", "http").
    fn engine_type(&self) -> &'static str;

    /// Check that the collaborator can be reached.
    ///
    /// Returns `Error::EngineNotAvailable` when it cannot.
    async fn health_check(&self) -> Result<()>;

    /// Remove the background from `image`, returning PNG bytes.
    ///
    /// Fails with `Error::EngineNotAvailable` when the collaborator cannot be
    /// reached and `Error::InferenceFailed` for anything it reports.
    async fn remove_background(&self, image: Vec<u8>, options: &RemovalOptions)
        -> Result<Vec<u8>>;
}

/// Build the engine selected by configuration.
pub fn build_engine(config: &EngineConfig) -> Arc<dyn RemovalEngine> {
    match config.kind {
        EngineKind::Cli => Arc::new(RembgCliEngine::new(config.clone())),
        EngineKind::Http => Arc::new(RembgHttpEngine::new(&config.base_url)),
    }
}
