//! Shared application state.

use std::sync::Arc;

use crate::config::Config;
use crate::engine::{EngineStatus, RemovalEngine};
use crate::error::Result;

/// Shared application state passed to all handlers. Immutable after startup.
pub struct AppState {
    pub config: Config,
    pub engine: Arc<dyn RemovalEngine>,
    /// Result of the capability check run at startup.
    pub engine_status: EngineStatus,
}

impl AppState {
    pub fn new(
        config: Config,
        engine: Arc<dyn RemovalEngine>,
        engine_status: EngineStatus,
    ) -> Self {
        Self {
            config,
            engine,
            engine_status,
        }
    }

    /// Run the engine capability check and build the state.
    ///
    /// A failed check is fatal only when `engine.require_available` is set.
    pub async fn initialize(config: Config, engine: Arc<dyn RemovalEngine>) -> Result<Self> {
        let engine_status = match engine.health_check().await {
            Ok(_) => {
                tracing::info!("{} engine is available", engine.engine_type());
                EngineStatus::Available
            }
            Err(e) if config.engine.require_available => return Err(e),
            Err(e) => {
                tracing::warn!(
                    "{} engine failed its capability check, starting degraded: {}",
                    engine.engine_type(),
                    e
                );
                EngineStatus::Unavailable(e.to_string())
            }
        };

        Ok(Self::new(config, engine, engine_status))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.engine_status {
            EngineStatus::Available => None,
            EngineStatus::Unavailable(reason) => Some(reason),
        }
    }
}
