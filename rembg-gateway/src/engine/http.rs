//! rembg server engine implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use rembg_common::RemovalOptions;

use super::RemovalEngine;
use crate::error::{Error, Result};

/// Engine backed by a running `rembg s` server.
///
/// Every request is forwarded to `POST {base_url}/api/remove`.
pub struct RembgHttpEngine {
    http_client: Client,
    base_url: String,
}

impl RembgHttpEngine {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn removal_form(image: Vec<u8>, options: &RemovalOptions) -> Form {
        Form::new()
            .part("file", Part::bytes(image).file_name("image"))
            .text("model", options.model.as_str().to_string())
            .text("a", options.alpha_matting.to_string())
            .text("af", options.alpha_matting_foreground_threshold.to_string())
            .text("ab", options.alpha_matting_background_threshold.to_string())
            .text("ae", options.alpha_matting_erode_size.to_string())
    }

    fn request_error(&self, err: reqwest::Error) -> Error {
        if err.is_connect() {
            Error::EngineNotAvailable(format!("cannot reach {}: {}", self.base_url, err))
        } else {
            Error::InferenceFailed(err.to_string())
        }
    }
}

#[async_trait]
impl RemovalEngine for RembgHttpEngine {
    fn engine_type(&self) -> &'static str {
        "http"
    }

    async fn health_check(&self) -> Result<()> {
        // Any answer at all means the server is up.
        let response = self
            .http_client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| {
                Error::EngineNotAvailable(format!("cannot reach {}: {}", self.base_url, e))
            })?;

        tracing::debug!("rembg server answered health check with {}", response.status());

        Ok(())
    }

    async fn remove_background(
        &self,
        image: Vec<u8>,
        options: &RemovalOptions,
    ) -> Result<Vec<u8>> {
        let url = format!("{}/api/remove", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .multipart(Self::removal_form(image, options))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::InferenceFailed(format!(
                "rembg server returned {}: {}",
                status, text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::InferenceFailed(e.to_string()))?;

        if bytes.is_empty() {
            return Err(Error::InferenceFailed(
                "rembg server returned an empty body".to_string(),
            ));
        }

        Ok(bytes.to_vec())
    }
}
