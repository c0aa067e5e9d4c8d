//! Models endpoint.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use rembg_common::{ModelDescriptor, ModelsResponse};

use crate::state::AppState;

/// Build the models router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/models", get(list_models))
}

/// GET /models - List the known models.
///
/// The list is fixed; the engine is not consulted.
async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: ModelDescriptor::registry(),
    })
}
