//! External model adapters
//!
//! Everything that talks to a network service lives here: the service traits, the
//! Gemini and Hugging Face clients, and the two adapters that turn raw replies into
//! validated recommendation results.

pub mod crop_advisor;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod huggingface;
pub mod service;
pub mod vision;

pub use crop_advisor::{AIRecommendationAdapter, AiRecommendationError};
pub use error::ServiceError;
pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClassifier;
pub use service::{GenerativeModel, ImageInput, VisionBackend, ACCEPTED_IMAGE_TYPES, MAX_IMAGE_BYTES};
pub use vision::{reconcile, LlmVisionBackend, VisionDiagnosisAdapter, VisionError, VisionPrediction};
