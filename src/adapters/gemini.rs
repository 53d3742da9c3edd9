//! Gemini REST client
//!
//! Calls `models/{model}:generateContent` directly. Images travel as base64 inline data
//! parts next to the prompt text.

use super::error::{is_retryable_status, truncate_body, ServiceError};
use super::service::{GenerativeModel, ImageInput};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different endpoint (proxies, local stubs)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(prompt: &str, image: Option<&ImageInput>) -> GenerateContentRequest {
        let mut parts = vec![Part::Text {
            text: prompt.to_string(),
        }];
        if let Some(image) = image {
            parts.push(Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: image.mime_type.clone(),
                    data: BASE64_STANDARD.encode(&image.bytes),
                },
            });
        }
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String, ServiceError> {
        if self.api_key.trim().is_empty() {
            return Err(ServiceError::Unconfigured("GEMINI_API_KEY is empty".to_string()));
        }

        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = self.model,
            api_key = self.api_key
        );
        let body = Self::build_request(prompt, image);

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| ServiceError::from_reqwest("Gemini", err))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|err| ServiceError::from_reqwest("Gemini", err))?;

        if !status.is_success() {
            return Err(map_http_error(status.as_u16(), &body_text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body_text).map_err(|err| {
            ServiceError::MalformedResponse(format!(
                "failed to parse Gemini response: {err}; body: {}",
                truncate_body(&body_text)
            ))
        })?;

        extract_text_response(parsed)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, ServiceError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.trim().is_empty())
        .ok_or(ServiceError::EmptyResponse)
}

fn map_http_error(status: u16, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| truncate_body(body));
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| truncate_body(body));

    ServiceError::Http {
        status,
        message,
        retryable: is_retryable_status(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_text_only() {
        let request = GeminiClient::build_request("Hello", None);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(json["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_request_serialization_with_image() {
        let image = ImageInput::new(vec![0xff, 0xd8, 0xff], "image/jpeg");
        let request = GeminiClient::build_request("Diagnose", Some(&image));
        let json = serde_json::to_value(&request).unwrap();

        let inline = &json["contents"][0]["parts"][1]["inlineData"];
        assert_eq!(inline["mimeType"], "image/jpeg");
        assert_eq!(inline["data"], "/9j/");
    }

    #[test]
    fn test_extract_text_response() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"ok\": true}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text_response(parsed).unwrap(), "{\"ok\": true}");
    }

    #[test]
    fn test_missing_candidates_is_empty_response() {
        let parsed: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(extract_text_response(parsed), Err(ServiceError::EmptyResponse));
    }

    #[test]
    fn test_map_http_error_reads_google_envelope() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        match map_http_error(429, body) {
            ServiceError::Http { status, message, retryable } => {
                assert_eq!(status, 429);
                assert_eq!(message, "RESOURCE_EXHAUSTED: Quota exceeded");
                assert!(retryable);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_http_error_plain_body() {
        let err = map_http_error(400, "bad request");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("bad request"));
    }

    #[tokio::test]
    async fn test_empty_api_key_is_unconfigured() {
        let client = GeminiClient::new("  ", DEFAULT_MODEL);
        let err = client.generate("hi", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unconfigured(_)));
    }
}
