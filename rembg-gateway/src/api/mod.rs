//! HTTP API of the gateway.

pub mod health;
pub mod models;
pub mod remove;

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue};
use axum::{middleware, Router};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::config::CorsConfig;
use crate::logging;
use crate::state::AppState;

/// Build the full application router.
///
/// `/` and `/health` are open; every other route requires the API key.
pub fn app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(models::router())
        .merge(remove::router(state.config.server.max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .merge(health::router())
        .merge(protected)
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS with credentials. A `*` origin mirrors the caller's origin, since
/// a literal wildcard cannot be combined with credentials.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .origins()
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers([
            header::CONTENT_DISPOSITION,
            HeaderName::from_static(remove::ORIGINAL_FILENAME_HEADER),
            HeaderName::from_static(remove::MODEL_USED_HEADER),
        ])
}
