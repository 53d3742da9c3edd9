//! Transport-level failures shared by the AI and vision clients

use std::time::Duration;
use thiserror::Error;

/// Failure talking to an external model service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// No credentials or endpoint configured for this service
    #[error("service not configured: {0}")]
    Unconfigured(String),

    /// Connection, DNS or body-read failure
    #[error("request failed: {message}")]
    Network { message: String, retryable: bool },

    /// The bounded call did not finish in time
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        retryable: bool,
    },

    /// Hosted model is still being loaded; retry after `estimated_time`
    #[error("model is loading")]
    ModelLoading { estimated_time: Option<Duration> },

    /// Success status but no usable content
    #[error("service returned no content")]
    EmptyResponse,

    /// Success status but the envelope could not be decoded
    #[error("malformed service response: {0}")]
    MalformedResponse(String),

    /// Rejected before any network call
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl ServiceError {
    /// Whether the same request may succeed if retried later
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network { retryable, .. } => *retryable,
            ServiceError::Http { retryable, .. } => *retryable,
            ServiceError::Timeout(_) | ServiceError::ModelLoading { .. } => true,
            ServiceError::Unconfigured(_)
            | ServiceError::EmptyResponse
            | ServiceError::MalformedResponse(_)
            | ServiceError::InvalidImage(_) => false,
        }
    }

    pub fn from_reqwest(service: &str, err: reqwest::Error) -> Self {
        ServiceError::Network {
            message: format!("{service} request failed: {err}"),
            retryable: err.is_connect() || err.is_timeout(),
        }
    }
}

/// Statuses worth retrying later
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Shorten an error body for logs and messages
pub(crate) fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 500;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, total {} bytes)", &body[..end], body.len())
}
