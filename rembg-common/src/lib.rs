//! Background Removal Gateway Common Types
//!
//! Shared types used by the gateway and by clients talking to it.

pub mod model;
pub mod removal;
pub mod response;

pub use model::{ModelDescriptor, ModelName};
pub use removal::RemovalOptions;
pub use response::{ErrorResponse, HealthResponse, ModelsResponse, RootResponse};
