//! Crop Advisor Rust Implementation
//!
//! Farmer-advisory decision engine: crop recommendations and disease diagnosis with
//! deterministic fallbacks behind every AI call.
//!
//! - `data`: knowledge base (crop and disease catalogs)
//! - `scoring/`: crop suitability and disease match formulas
//! - `explanation/`: human-readable reasons derived from score breakdowns
//! - `ranker`: deterministic top-3 rankers
//! - `adapters/`: Gemini and Hugging Face clients plus reply normalizers
//! - `orchestrator`: AI-first flows with rule-based fallback

pub mod tiers;
pub mod data;
pub mod query;
pub mod result;
pub mod scoring;
pub mod explanation;
pub mod ranker;
pub mod adapters;
pub mod orchestrator;
pub mod config;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use tiers::{BudgetTier, Goal, Season, Severity, SoilType, Symptom, WaterTier, Weather};
pub use data::{Crop, Disease, KnowledgeBase, KnowledgeBaseError};
pub use query::{Budget, EnvironmentalContext, FarmerQuery, QueryError, SymptomQuery};
pub use result::{RecommendationItem, RecommendationResult, Source};
pub use scoring::{crop_score, disease_score, score_crop, score_disease};
pub use ranker::{DeterministicCropRanker, DeterministicDiseaseRanker};
pub use adapters::{AIRecommendationAdapter, ImageInput, VisionDiagnosisAdapter};
pub use orchestrator::{DiagnosisError, RecommendationError, RecommendationOrchestrator};
pub use config::AdvisorConfig;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
