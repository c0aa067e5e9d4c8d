//! Background Removal Gateway
//!
//! Authenticated HTTP API that validates uploads, binds removal parameters
//! and delegates the actual work to a rembg engine.

pub mod api;
pub mod auth;
pub mod binding;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod state;
pub mod test_util;

pub use config::Config;
pub use engine::{build_engine, RemovalEngine};
pub use error::{Error, Result};
pub use state::AppState;
