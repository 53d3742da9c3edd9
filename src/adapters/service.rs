//! Service seams for the external model calls
//!
//! The engine only ever talks to these traits; HTTP clients implement them in
//! production and tests substitute scripted mocks.

use super::error::ServiceError;
use async_trait::async_trait;

/// MIME types accepted for disease photos
pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Largest accepted photo (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// A photo to diagnose
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Reject unsupported types, empty files and oversized files before any network call
    pub fn validate(&self) -> Result<(), ServiceError> {
        let mime = self.mime_type.trim().to_lowercase();
        if !ACCEPTED_IMAGE_TYPES.contains(&mime.as_str()) {
            return Err(ServiceError::InvalidImage(
                "please upload a JPEG, PNG, or WebP image".to_string(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(ServiceError::InvalidImage("image is empty".to_string()));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ServiceError::InvalidImage("image must be smaller than 10MB".to_string()));
        }
        Ok(())
    }
}

/// Text (optionally multimodal) generative model
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Send one prompt (plus an optional image) and return the model's raw text
    async fn generate(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String, ServiceError>;
}

/// Image diagnosis service returning its raw JSON reply
///
/// Replies are either a classifier label list (`[{label, score}]`) or a vision-LLM
/// diagnosis object (`{crop, disease, confidence, treatment}`), possibly fenced.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(&self, image: &ImageInput) -> Result<String, ServiceError>;
}
