//! Integration tests for the rembg-gateway HTTP API.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use rembg_common::ModelName;
use rembg_gateway::engine::EngineStatus;
use rembg_gateway::test_util::{
    test_config, test_state, MockEngine, MultipartBody, TEST_API_KEY, TRANSPARENT_PNG,
};
use rembg_gateway::{api, AppState};
use serde_json::Value;
use tower::ServiceExt;

fn secured_app(engine: Arc<MockEngine>) -> Router {
    api::app(test_state(test_config(Some(TEST_API_KEY)), engine))
}

fn png_upload() -> MultipartBody {
    MultipartBody::new().file("file", "test.png", Some("image/png"), TRANSPARENT_PNG)
}

fn upload_request(uri: &str, body: MultipartBody, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, body.content_type());
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(Body::from(body.finish())).unwrap()
}

fn get_request(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn detail(response: Response) -> String {
    json_body(response).await["detail"]
        .as_str()
        .unwrap()
        .to_string()
}

// ============================================================================
// Open endpoints
// ============================================================================

#[tokio::test]
async fn test_root_endpoint_is_open() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let response = app.oneshot(get_request("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Remove Background Provider");
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn test_health_endpoint_is_open() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let response = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "remove-bg-provider");
    assert!(body.get("detail").is_none());
}

#[tokio::test]
async fn test_health_reports_degraded_engine() {
    let state = Arc::new(AppState::new(
        test_config(Some(TEST_API_KEY)),
        Arc::new(MockEngine::unavailable()),
        EngineStatus::Unavailable("rembg not installed".to_string()),
    ));
    let app = api::app(state);

    let response = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["detail"], "rembg not installed");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_models_requires_api_key() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let response = app.oneshot(get_request("/models", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(response).await, "X-API-Key header is required");
}

#[tokio::test]
async fn test_remove_with_wrong_api_key() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    let response = app
        .oneshot(upload_request("/bg/remove", png_upload(), Some("wrong-key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(response).await, "Invalid API key");
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_remove_without_api_key() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let response = app
        .oneshot(upload_request("/bg/remove-advanced", png_upload(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(response).await, "X-API-Key header is required");
}

#[tokio::test]
async fn test_header_name_is_case_insensitive() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let request = Request::builder()
        .uri("/models")
        .header("x-api-key", TEST_API_KEY)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_api_key_configured_allows_requests() {
    let engine = Arc::new(MockEngine::new());
    let app = api::app(test_state(test_config(None), engine.clone()));

    let response = app
        .clone()
        .oneshot(get_request("/models", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(upload_request("/bg/remove", png_upload(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(engine.calls().len(), 1);
}

// ============================================================================
// Models
// ============================================================================

#[tokio::test]
async fn test_models_lists_registry() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let response = app
        .oneshot(get_request("/models", Some(TEST_API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 4);

    let names: Vec<&str> = models.iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["u2net", "u2net_human_seg", "silueta", "isnet-general-use"]);
    assert_eq!(models[1]["description"], "Optimized for human subjects");
}

// ============================================================================
// Background removal
// ============================================================================

#[tokio::test]
async fn test_remove_success() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    let body = png_upload().text("model", "u2net");
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=bg_removed_test.png"
    );
    assert_eq!(headers["X-Original-Filename"], "test.png");
    assert_eq!(headers["X-Model-Used"], "u2net");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], TRANSPARENT_PNG);

    let calls = engine.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].image, TRANSPARENT_PNG);
}

#[tokio::test]
async fn test_remove_defaults_to_u2net() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    let response = app
        .oneshot(upload_request("/bg/remove", png_upload(), Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["X-Model-Used"], "u2net");

    let options = engine.last_options().unwrap();
    assert_eq!(options.model, ModelName::U2Net);
    assert!(!options.alpha_matting);
    assert_eq!(options.alpha_matting_foreground_threshold, 240);
    assert_eq!(options.alpha_matting_background_threshold, 10);
    assert_eq!(options.alpha_matting_erode_size, 10);
}

#[tokio::test]
async fn test_remove_with_each_model() {
    for model in ModelName::ALL {
        let engine = Arc::new(MockEngine::new());
        let app = secured_app(engine.clone());

        let body = png_upload().text("model", model.as_str());
        let response = app
            .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{}", model);
        assert_eq!(response.headers()["X-Model-Used"], model.as_str());
        assert_eq!(engine.last_options().unwrap().model, model);
    }
}

#[tokio::test]
async fn test_remove_advanced_binds_alpha_matting_fields() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    let body = png_upload()
        .text("model", "isnet-general-use")
        .text("alpha_matting", "true")
        .text("alpha_matting_foreground_threshold", "250")
        .text("alpha_matting_background_threshold", "5")
        .text("alpha_matting_erode_size", "15");
    let response = app
        .oneshot(upload_request("/bg/remove-advanced", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["X-Model-Used"], "isnet-general-use");

    let options = engine.last_options().unwrap();
    assert_eq!(options.model, ModelName::IsNetGeneralUse);
    assert!(options.alpha_matting);
    assert_eq!(options.alpha_matting_foreground_threshold, 250);
    assert_eq!(options.alpha_matting_background_threshold, 5);
    assert_eq!(options.alpha_matting_erode_size, 15);
}

#[tokio::test]
async fn test_query_parameters_bind_and_form_overrides() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    let body = png_upload().text("model", "silueta");
    let response = app
        .oneshot(upload_request(
            "/bg/remove?model=u2net_human_seg&alpha_matting=1&alpha_matting_erode_size=-3",
            body,
            Some(TEST_API_KEY),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["X-Model-Used"], "silueta");

    let options = engine.last_options().unwrap();
    assert_eq!(options.model, ModelName::Silueta);
    assert!(options.alpha_matting);
    assert_eq!(options.alpha_matting_erode_size, -3);
}

#[tokio::test]
async fn test_repeated_query_key_uses_last_value() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    let response = app
        .oneshot(upload_request(
            "/bg/remove?model=u2net&model=silueta",
            png_upload(),
            Some(TEST_API_KEY),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["X-Model-Used"], "silueta");
    assert_eq!(engine.last_options().unwrap().model, ModelName::Silueta);
}

#[tokio::test]
async fn test_invalid_query_value_answers_json_detail() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let response = app
        .oneshot(upload_request(
            "/bg/remove?alpha_matting=yes&alpha_matting=maybe",
            png_upload(),
            Some(TEST_API_KEY),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(detail(response).await, "Invalid value for alpha_matting: maybe");
}

#[tokio::test]
async fn test_unknown_model_is_forwarded() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    let body = png_upload().text("model", "u2netp");
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["X-Model-Used"], "u2netp");
    assert_eq!(engine.last_options().unwrap().model.as_str(), "u2netp");
}

#[tokio::test]
async fn test_jpeg_input_answers_png() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let body =
        MultipartBody::new().file("file", "photo.jpg", Some("image/jpeg"), b"\xFF\xD8\xFFjpeg");
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()["X-Original-Filename"], "photo.jpg");
}

#[tokio::test]
async fn test_non_image_content_type_is_rejected() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    // PNG bytes do not matter; only the declared type is checked.
    let body =
        MultipartBody::new().file("file", "test.txt", Some("text/plain"), TRANSPARENT_PNG);
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "File must be an image");
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_missing_content_type_is_rejected() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let body = MultipartBody::new().file("file", "test.png", None, TRANSPARENT_PNG);
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "File must be an image");
}

#[tokio::test]
async fn test_empty_file_is_rejected() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let body = MultipartBody::new().file("file", "test.png", Some("image/png"), b"");
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(response).await, "Uploaded file is empty");
}

#[tokio::test]
async fn test_missing_file_is_unprocessable() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    let body = MultipartBody::new().text("model", "u2net");
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_text_part_named_file_is_not_an_upload() {
    let engine = Arc::new(MockEngine::new());
    let app = secured_app(engine.clone());

    let body = MultipartBody::new().text("file", "not really an image");
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail(response).await, "Field required: file");
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_non_multipart_body_is_unprocessable() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let request = Request::builder()
        .method("POST")
        .uri("/bg/remove")
        .header("X-API-Key", TEST_API_KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invalid_boolean_is_unprocessable() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let body = png_upload().text("alpha_matting", "maybe");
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail(response).await, "Invalid value for alpha_matting: maybe");
}

#[tokio::test]
async fn test_engine_failure_is_internal_error() {
    let app = secured_app(Arc::new(MockEngine::failing("Model loading failed")));

    let response = app
        .oneshot(upload_request("/bg/remove", png_upload(), Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = detail(response).await;
    assert!(detail.starts_with("Error processing image"));
    assert!(detail.contains("Model loading failed"));
}

#[tokio::test]
async fn test_engine_unavailable_is_internal_error() {
    let app = secured_app(Arc::new(MockEngine::unavailable()));

    let response = app
        .oneshot(upload_request("/bg/remove", png_upload(), Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(detail(response)
        .await
        .starts_with("Background removal engine not available"));
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let engine = Arc::new(MockEngine::new());
    let mut config = test_config(Some(TEST_API_KEY));
    config.server.max_upload_bytes = 1024;
    let app = api::app(test_state(config, engine.clone()));

    let big = vec![b'x'; 4096];
    let body = MultipartBody::new().file("file", "big.png", Some("image/png"), &big);
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_filename_fallback() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let body = MultipartBody::new().file("file", "", Some("image/png"), TRANSPARENT_PNG);
    let response = app
        .oneshot(upload_request("/bg/remove", body, Some(TEST_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["X-Original-Filename"], "image");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=bg_removed_image"
    );
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn test_cors_mirrors_origin_with_credentials() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_preflight_needs_no_api_key() {
    let app = secured_app(Arc::new(MockEngine::new()));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/bg/remove")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-api-key")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
}

#[tokio::test]
async fn test_cors_restricted_origins() {
    let mut config = test_config(None);
    config.cors.allowed_origins = "http://allowed.example".to_string();
    let app = api::app(test_state(config, Arc::new(MockEngine::new())));

    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "http://other.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
