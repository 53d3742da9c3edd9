//! Vision Diagnosis Adapter
//!
//! Sends a crop photo to a vision backend and reconciles what comes back with the
//! disease catalog. Two reply shapes are understood:
//!
//! - image classifier: `[{"label": "Tomato___Late_blight", "score": 0.93}, ...]`
//! - vision LLM: `{"crop": "Tomato", "disease": "Late blight", "confidence": 0.9, "treatment": "..."}`
//!
//! Matched labels are enriched with catalog treatments and severity (source `ai`).
//! Labels the catalog does not know become a minimal placeholder record (source
//! `ai-unverified`) so callers always get a well-formed item.

use super::error::ServiceError;
use super::extract::extract_json_payload;
use super::service::{GenerativeModel, ImageInput, VisionBackend};
use crate::data::{Disease, KnowledgeBase, Treatments};
use crate::explanation::disease_detail;
use crate::result::{DiseaseDetail, ItemDetail, RecommendationItem, RecommendationResult, Source};
use crate::tiers::Severity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Classifier labels kept per photo
pub const MAX_PREDICTIONS: usize = 3;

/// Confidence above which an unmatched label is treated as high severity
pub const UNMATCHED_HIGH_SEVERITY_CONFIDENCE: u8 = 70;

const UNKNOWN: &str = "Unknown";

pub const VISION_PROMPT: &str = r#"Act as an expert Plant Pathologist. Analyze this image of a crop.
1. Identify the crop.
2. Identify any visible disease, pest, or deficiency. If none, state "Healthy".
3. Provide a brief treatment or recommendation suitable for Kerala context.

Return ONLY a valid JSON object in this format (no markdown):
{
    "crop": "Crop name",
    "disease": "Disease Name or Healthy",
    "confidence": 0.95,
    "treatment": "Brief treatment advice..."
}"#;

/// Why a photo could not be diagnosed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VisionError {
    /// Hosted model is loading; the same request should succeed later
    #[error("vision model is warming up, retry in a few seconds")]
    WarmingUp { retry_after: Option<Duration> },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Service(ServiceError),

    #[error("vision reply could not be parsed: {0}")]
    Malformed(String),

    #[error("vision service returned no predictions")]
    NoPredictions,
}

impl VisionError {
    /// Only warming-up is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, VisionError::WarmingUp { .. })
    }
}

impl From<ServiceError> for VisionError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ModelLoading { estimated_time } => VisionError::WarmingUp {
                retry_after: estimated_time,
            },
            ServiceError::InvalidImage(reason) => VisionError::InvalidImage(reason),
            other => VisionError::Service(other),
        }
    }
}

/// One normalized vision prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionPrediction {
    pub crop_guess: String,
    pub disease_label: String,
    pub full_label: String,

    /// 0-100
    pub confidence: u8,
    pub is_healthy: bool,

    /// Free-text advice from a vision LLM
    pub advice: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClassifierLabel {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct LlmDiagnosis {
    #[serde(default)]
    crop: Option<String>,
    disease: String,
    confidence: f64,
    #[serde(default)]
    treatment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VisionReply {
    Labels(Vec<ClassifierLabel>),
    Diagnosis(LlmDiagnosis),
}

/// Split a classifier label into (crop guess, disease label)
///
/// `"Tomato___Late_blight"` → `("Tomato", "Late blight")`.
pub fn parse_label(label: &str) -> (String, String) {
    let mut parts = label.splitn(2, "___");
    let crop = parts
        .next()
        .map(|c| c.replace('_', " ").trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let disease = parts
        .next()
        .map(|d| d.replace('_', " ").trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());
    (crop, disease)
}

fn to_percent(score: f64) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Fuzzy-matching key: lowercase, underscores to spaces, single-spaced
fn match_key(text: &str) -> String {
    text.replace('_', " ")
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn names_overlap(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Catalog disease for a prediction
///
/// The disease name must overlap the label (containment either way). When several
/// diseases qualify, one listing the guessed crop wins; otherwise catalog order decides.
pub fn match_disease<'a>(kb: &'a KnowledgeBase, prediction: &VisionPrediction) -> Option<&'a Disease> {
    let label = match_key(&prediction.disease_label);
    let crop = match_key(&prediction.crop_guess);

    let candidates: Vec<&Disease> = kb
        .diseases()
        .iter()
        .filter(|d| names_overlap(&match_key(&d.name), &label))
        .collect();

    candidates
        .iter()
        .find(|d| {
            crop != match_key(UNKNOWN)
                && d.affected_crops.iter().any(|c| names_overlap(&match_key(c), &crop))
        })
        .or_else(|| candidates.first())
        .copied()
}

fn crop_for_detail(prediction: &VisionPrediction) -> Option<&str> {
    Some(prediction.crop_guess.as_str()).filter(|c| *c != UNKNOWN)
}

fn with_advice(mut reasons: Vec<String>, prediction: &VisionPrediction) -> Vec<String> {
    if let Some(advice) = prediction.advice.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        reasons.push(advice.to_string());
    }
    reasons
}

fn healthy_item(prediction: &VisionPrediction) -> RecommendationItem {
    let name = match crop_for_detail(prediction) {
        Some(crop) => format!("Healthy {}", crop),
        None => "Healthy".to_string(),
    };
    let detail = DiseaseDetail {
        severity: Severity::Low,
        crop: crop_for_detail(prediction).map(str::to_string),
        description: Some("No disease detected in the photo".to_string()),
        treatments: Treatments {
            organic: vec!["No treatment needed".to_string()],
            chemical: vec!["No chemical treatment required".to_string()],
            prevention: Treatments::consult_expert().prevention,
        },
        resistant_varieties: Vec::new(),
        is_healthy: true,
    };
    let reasons = with_advice(vec!["No visible disease symptoms detected".to_string()], prediction);
    RecommendationItem::new(name, prediction.confidence, reasons, Source::Ai).with_detail(ItemDetail::Disease(detail))
}

fn matched_item(disease: &Disease, prediction: &VisionPrediction) -> RecommendationItem {
    let reasons = with_advice(
        vec![format!(
            "Identified from photo as {} on {}",
            prediction.disease_label, prediction.crop_guess
        )],
        prediction,
    );
    RecommendationItem::new(disease.name.clone(), prediction.confidence, reasons, Source::Ai)
        .with_detail(ItemDetail::Disease(disease_detail(disease, crop_for_detail(prediction))))
}

fn unverified_item(prediction: &VisionPrediction) -> RecommendationItem {
    let severity = if prediction.confidence > UNMATCHED_HIGH_SEVERITY_CONFIDENCE {
        Severity::High
    } else {
        Severity::Medium
    };
    let detail = DiseaseDetail {
        severity,
        crop: crop_for_detail(prediction).map(str::to_string),
        description: Some("Detected from image analysis using AI vision".to_string()),
        treatments: Treatments::consult_expert(),
        resistant_varieties: Vec::new(),
        is_healthy: false,
    };
    let reasons = with_advice(
        vec!["Not in the local disease catalog; confirm with an agricultural expert".to_string()],
        prediction,
    );
    RecommendationItem::new(prediction.disease_label.clone(), prediction.confidence, reasons, Source::AiUnverified)
        .with_detail(ItemDetail::Disease(detail))
}

/// Enrich predictions from the catalog, one item per distinct diagnosis
pub fn reconcile(kb: &KnowledgeBase, predictions: &[VisionPrediction]) -> RecommendationResult {
    let mut items: Vec<RecommendationItem> = Vec::with_capacity(predictions.len());

    for prediction in predictions {
        let item = if prediction.is_healthy {
            healthy_item(prediction)
        } else {
            match match_disease(kb, prediction) {
                Some(disease) => matched_item(disease, prediction),
                None => {
                    tracing::debug!("Vision label '{}' has no catalog match", prediction.full_label);
                    unverified_item(prediction)
                }
            }
        };

        if !items.iter().any(|existing| existing.name == item.name) {
            items.push(item);
        }
    }

    RecommendationResult::from_items(items)
}

/// Vision backend backed by a multimodal generative model
pub struct LlmVisionBackend {
    model: Arc<dyn GenerativeModel>,
}

impl LlmVisionBackend {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl VisionBackend for LlmVisionBackend {
    fn name(&self) -> &str {
        self.model.name()
    }

    async fn analyze(&self, image: &ImageInput) -> Result<String, ServiceError> {
        self.model.generate(VISION_PROMPT, Some(image)).await
    }
}

/// Photo diagnosis through a vision backend
pub struct VisionDiagnosisAdapter {
    backend: Arc<dyn VisionBackend>,
    timeout: Duration,
}

impl VisionDiagnosisAdapter {
    pub fn new(backend: Arc<dyn VisionBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Validate the image, call the backend (bounded), parse its reply
    pub async fn predict(&self, image: &ImageInput) -> Result<Vec<VisionPrediction>, VisionError> {
        image.validate()?;

        let reply = tokio::time::timeout(self.timeout, self.backend.analyze(image))
            .await
            .map_err(|_| ServiceError::Timeout(self.timeout))??;

        Self::parse_reply(&reply)
    }

    /// Predict and reconcile against the catalog
    pub async fn diagnose(&self, kb: &KnowledgeBase, image: &ImageInput) -> Result<RecommendationResult, VisionError> {
        let predictions = self.predict(image).await?;
        Ok(reconcile(kb, &predictions))
    }

    /// Normalize either reply shape into predictions
    pub fn parse_reply(reply: &str) -> Result<Vec<VisionPrediction>, VisionError> {
        let payload = extract_json_payload(reply)
            .ok_or_else(|| VisionError::Malformed("no JSON payload in reply".to_string()))?;
        let parsed: VisionReply =
            serde_json::from_str(payload).map_err(|err| VisionError::Malformed(err.to_string()))?;

        let predictions = match parsed {
            VisionReply::Labels(mut labels) => {
                if labels.iter().any(|l| !l.score.is_finite()) {
                    return Err(VisionError::Malformed("non-numeric classifier score".to_string()));
                }
                labels.sort_by(|a, b| b.score.total_cmp(&a.score));
                labels
                    .into_iter()
                    .take(MAX_PREDICTIONS)
                    .map(|l| {
                        let (crop_guess, disease_label) = parse_label(&l.label);
                        VisionPrediction {
                            is_healthy: disease_label.to_lowercase().contains("healthy"),
                            crop_guess,
                            disease_label,
                            full_label: l.label,
                            confidence: to_percent(l.score),
                            advice: None,
                        }
                    })
                    .collect::<Vec<_>>()
            }
            VisionReply::Diagnosis(diagnosis) => {
                if !diagnosis.confidence.is_finite() || diagnosis.confidence < 0.0 {
                    return Err(VisionError::Malformed(format!(
                        "confidence must be a non-negative number, got {}",
                        diagnosis.confidence
                    )));
                }
                // Some models answer in percent despite the prompt
                let confidence = if diagnosis.confidence > 1.0 {
                    diagnosis.confidence.round().min(100.0) as u8
                } else {
                    to_percent(diagnosis.confidence)
                };
                let crop_guess = diagnosis
                    .crop
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| UNKNOWN.to_string());
                let disease_label = diagnosis.disease.trim().to_string();
                if disease_label.is_empty() {
                    return Err(VisionError::Malformed("empty disease name".to_string()));
                }
                vec![VisionPrediction {
                    is_healthy: disease_label.to_lowercase().contains("healthy"),
                    full_label: format!("{}___{}", crop_guess, disease_label.replace(' ', "_")),
                    crop_guess,
                    disease_label,
                    confidence,
                    advice: diagnosis.treatment,
                }]
            }
        };

        if predictions.is_empty() {
            return Err(VisionError::NoPredictions);
        }
        Ok(predictions)
    }
}
