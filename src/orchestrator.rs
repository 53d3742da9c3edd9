//! Recommendation Orchestrator
//!
//! Façade over the adapters and rankers:
//!
//! - crops: AI first; any AI failure falls back to the deterministic ranker
//! - symptoms: always deterministic
//! - photos: vision first; warming-up is surfaced for retry, hard failures fall back to
//!   the symptom ranker when symptoms were supplied
//!
//! Cancellation aborts the outstanding call and never triggers a fallback.

use crate::adapters::{AIRecommendationAdapter, ImageInput, VisionDiagnosisAdapter, VisionError};
use crate::data::KnowledgeBase;
use crate::query::{EnvironmentalContext, FarmerQuery, QueryError, SymptomQuery};
use crate::ranker::{DeterministicCropRanker, DeterministicDiseaseRanker};
use crate::result::RecommendationResult;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Bound on a single outbound AI or vision call
pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(12);

/// Crop recommendation failures visible to callers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendationError {
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),

    #[error("request was cancelled")]
    Cancelled,
}

/// Disease diagnosis failures visible to callers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosisError {
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Retry the same photo after `retry_after`
    #[error("vision model is warming up, please retry shortly")]
    ModelWarmingUp { retry_after: Option<Duration> },

    /// Photo diagnosis failed and no symptoms were supplied to fall back on
    #[error("photo diagnosis unavailable ({0}); describe the symptoms instead")]
    VisionUnavailable(String),

    #[error("request was cancelled")]
    Cancelled,
}

impl DiagnosisError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DiagnosisError::ModelWarmingUp { .. })
    }
}

/// Entry point for all recommendation flows
pub struct RecommendationOrchestrator {
    kb: Arc<KnowledgeBase>,
    advisor: Option<AIRecommendationAdapter>,
    vision: Option<VisionDiagnosisAdapter>,
}

impl RecommendationOrchestrator {
    /// Deterministic-only orchestrator
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self {
            kb,
            advisor: None,
            vision: None,
        }
    }

    pub fn with_advisor(mut self, advisor: AIRecommendationAdapter) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn with_vision(mut self, vision: VisionDiagnosisAdapter) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.kb
    }

    pub fn ai_enabled(&self) -> bool {
        self.advisor.is_some()
    }

    pub fn vision_enabled(&self) -> bool {
        self.vision.is_some()
    }

    /// Top crops: AI when it answers cleanly, rule-based otherwise
    pub async fn recommend_crops(
        &self,
        query: &FarmerQuery,
        context: Option<&EnvironmentalContext>,
        cancel: &CancellationToken,
    ) -> Result<RecommendationResult, RecommendationError> {
        query.validate()?;
        if let Some(context) = context {
            context.validate()?;
        }
        if cancel.is_cancelled() {
            return Err(RecommendationError::Cancelled);
        }

        let fallback_reason = match &self.advisor {
            None => "AI advisor not configured".to_string(),
            Some(advisor) => {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RecommendationError::Cancelled),
                    outcome = advisor.recommend(&self.kb, query) => outcome,
                };
                match outcome {
                    Ok(result) => return Ok(result),
                    Err(err) => {
                        tracing::warn!(
                            "AI recommendation via {} failed (retryable: {}): {}",
                            advisor.model_name(),
                            err.is_retryable(),
                            err
                        );
                        format!("AI advisor unavailable: {}", err)
                    }
                }
            }
        };

        tracing::info!("Using rule-based crop ranking ({})", fallback_reason);
        Ok(DeterministicCropRanker::new(&self.kb)
            .rank(query, context)
            .with_fallback_reason(fallback_reason))
    }

    /// Diseases matching a symptom report (deterministic)
    pub fn diagnose_symptoms(&self, query: &SymptomQuery) -> Result<RecommendationResult, DiagnosisError> {
        query.validate(&self.kb)?;
        Ok(DeterministicDiseaseRanker::new(&self.kb).rank(query))
    }

    /// Diagnose a photo, falling back to `symptoms` on a hard vision failure
    pub async fn diagnose_image(
        &self,
        image: &ImageInput,
        symptoms: Option<&SymptomQuery>,
        cancel: &CancellationToken,
    ) -> Result<RecommendationResult, DiagnosisError> {
        if let Some(query) = symptoms {
            query.validate(&self.kb)?;
        }
        image
            .validate()
            .map_err(|err| DiagnosisError::InvalidImage(err.to_string()))?;
        if cancel.is_cancelled() {
            return Err(DiagnosisError::Cancelled);
        }

        let failure = match &self.vision {
            None => "vision service not configured".to_string(),
            Some(vision) => {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(DiagnosisError::Cancelled),
                    outcome = vision.diagnose(&self.kb, image) => outcome,
                };
                match outcome {
                    Ok(result) => return Ok(result),
                    Err(VisionError::WarmingUp { retry_after }) => {
                        tracing::info!("Vision model {} is warming up", vision.backend_name());
                        return Err(DiagnosisError::ModelWarmingUp { retry_after });
                    }
                    Err(VisionError::InvalidImage(reason)) => return Err(DiagnosisError::InvalidImage(reason)),
                    Err(err) => {
                        tracing::warn!("Vision diagnosis via {} failed: {}", vision.backend_name(), err);
                        err.to_string()
                    }
                }
            }
        };

        match symptoms {
            Some(query) => {
                tracing::info!("Using symptom-based diagnosis ({})", failure);
                Ok(DeterministicDiseaseRanker::new(&self.kb)
                    .rank(query)
                    .with_fallback_reason(format!("Photo diagnosis unavailable: {}", failure)))
            }
            None => Err(DiagnosisError::VisionUnavailable(failure)),
        }
    }
}
