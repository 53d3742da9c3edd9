//! Deterministic scoring engines
//!
//! Each engine is a pure function from a catalog record and a query to a bounded integer
//! score, returning the per-term breakdown alongside so rationale can be re-derived from
//! the exact numbers that produced the score.

pub mod crop_suitability;
pub mod disease_match;

pub use crop_suitability::{crop_score, score_crop, CropScoreBreakdown, CropTerm};
pub use disease_match::{disease_score, score_disease, DiseaseScoreBreakdown};

/// Clamp a raw score into the display range
pub(crate) fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}
