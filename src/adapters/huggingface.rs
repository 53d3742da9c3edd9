//! Hugging Face Inference API image classifier
//!
//! Posts raw image bytes to a hosted classification model and returns the JSON label
//! list verbatim. A cold model answers 503 with `{"error": "... is currently loading",
//! "estimated_time": 20.0}`; that is surfaced as [`ServiceError::ModelLoading`].

use super::error::{is_retryable_status, truncate_body, ServiceError};
use super::service::{ImageInput, VisionBackend};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MODEL: &str = "linkanjarad/mobilenet_v2_1.0_224-plant-disease-identification";

/// Hosted plant-disease image classifier
#[derive(Clone)]
pub struct HuggingFaceClassifier {
    client: Client,
    token: Option<String>,
    model: String,
    base_url: String,
}

impl HuggingFaceClassifier {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: None,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Bearer token; anonymous requests work but are heavily rate limited
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl VisionBackend for HuggingFaceClassifier {
    fn name(&self) -> &str {
        &self.model
    }

    async fn analyze(&self, image: &ImageInput) -> Result<String, ServiceError> {
        let url = format!("{}/{}", self.base_url, self.model);

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, image.mime_type.as_str())
            .body(image.bytes.clone());
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|err| ServiceError::from_reqwest("Hugging Face", err))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| ServiceError::from_reqwest("Hugging Face", err))?;

        if !(200..300).contains(&status) {
            return Err(map_http_error(status, &body));
        }
        if body.trim().is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(body)
    }
}

#[derive(Deserialize)]
struct HfErrorBody {
    error: Option<String>,
    estimated_time: Option<f64>,
}

fn map_http_error(status: u16, body: &str) -> ServiceError {
    let parsed = serde_json::from_str::<HfErrorBody>(body).ok();

    if status == 503 {
        if let Some(HfErrorBody { error: Some(message), estimated_time }) = &parsed {
            if message.to_lowercase().contains("loading") {
                return ServiceError::ModelLoading {
                    estimated_time: estimated_time.and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
                };
            }
        }
    }

    let message = parsed
        .and_then(|p| p.error)
        .unwrap_or_else(|| truncate_body(body));
    ServiceError::Http {
        status,
        message,
        retryable: is_retryable_status(status),
    }
}
