//! Background removal endpoints.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::Router;

use crate::binding::RawRemovalParams;
use crate::error::{Error, Result};
use crate::state::AppState;

pub const ORIGINAL_FILENAME_HEADER: &str = "x-original-filename";
pub const MODEL_USED_HEADER: &str = "x-model-used";

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";
const FALLBACK_FILENAME: &str = "image";

/// Build the removal router. `max_upload_bytes` bounds the request body.
pub fn router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/bg/remove", post(remove_background))
        .route("/bg/remove-advanced", post(remove_background))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// The uploaded image part.
struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

/// POST /bg/remove - Remove the background of the uploaded image.
///
/// Removal parameters are read from the query string and from multipart
/// text fields; form fields win.
async fn remove_background(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let Query(pairs) = query.map_err(|e| Error::Validation(e.body_text()))?;
    let mut multipart = multipart.map_err(|e| Error::Validation(e.body_text()))?;

    // Repeated keys are allowed; the last occurrence wins.
    let mut params = RawRemovalParams::default();
    for (name, value) in pairs {
        params.set(&name, value);
    }
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == FILE_FIELD {
            // A plain text part named `file` is not an upload.
            if field.file_name().is_none() {
                tracing::debug!("Ignoring non-file part named {}", FILE_FIELD);
                continue;
            }
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;
            upload = Some(Upload {
                filename,
                content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            if !params.set(&name, value) {
                tracing::debug!("Ignoring unknown form field: {}", name);
            }
        }
    }

    let upload = upload.ok_or_else(|| Error::Validation("Field required: file".to_string()))?;
    let options = params.bind()?;

    let is_image = upload
        .content_type
        .as_deref()
        .is_some_and(|content_type| content_type.starts_with("image/"));
    if !is_image {
        return Err(Error::InvalidInput("File must be an image".to_string()));
    }
    if upload.data.is_empty() {
        return Err(Error::InvalidInput("Uploaded file is empty".to_string()));
    }

    let filename = upload
        .filename
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

    if !options.model.is_known() {
        tracing::warn!(
            "Unknown model {:?}, forwarding it to the engine as is",
            options.model.as_str()
        );
    }

    tracing::info!(
        model = %options.model,
        alpha_matting = options.alpha_matting,
        filename = %filename,
        bytes = upload.data.len(),
        "Processing image with model"
    );

    let output = state
        .engine
        .remove_background(upload.data.to_vec(), &options)
        .await?;

    png_response(output, &filename, options.model.as_str())
}

fn multipart_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(err.body_text())
    } else {
        Error::Validation(err.body_text())
    }
}

/// Wrap processed bytes in the fixed PNG response.
fn png_response(image: Vec<u8>, filename: &str, model: &str) -> Result<Response> {
    let filename = header_safe(filename);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=bg_removed_{}", filename),
        )
        .header(ORIGINAL_FILENAME_HEADER, filename)
        .header(MODEL_USED_HEADER, header_safe(model))
        .body(Body::from(image))
        .map_err(|e| Error::Internal(e.to_string()))
}

/// Replace what a header value cannot carry with `_`.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\t' || (' '..='~').contains(&c) { c } else { '_' })
        .collect()
}
