//! Disease Match Scoring
//!
//! Scores how well a catalog disease explains a farmer's symptom report. Symptom
//! overlap is the evidence gate: a disease sharing no symptom with the query scores 0
//! regardless of crop or weather, so it can never be recommended on context alone.

use super::clamp_score;
use crate::data::Disease;
use crate::query::SymptomQuery;
use crate::tiers::{Severity, Symptom};

/// Weight of the symptom match rate
pub const SYMPTOM_WEIGHT: f64 = 40.0;

/// Running score a high-severity disease must exceed to earn the amplifier
pub const SEVERITY_AMPLIFIER_THRESHOLD: f64 = 40.0;

/// Per-term contributions for one disease
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseScoreBreakdown {
    /// Disease symptoms the query reported, in catalog order
    pub matched_symptoms: Vec<Symptom>,

    /// |matched| / |disease symptoms|
    pub match_rate: f64,

    pub symptom_points: f64,
    pub multi_symptom_bonus: f64,

    /// +30 exact affected crop, +15 mixed-vegetable bucket
    pub crop_points: f64,
    pub exact_crop: bool,

    pub season_points: f64,
    pub weather_points: f64,
    pub severity_bonus: f64,

    /// Unrounded total
    pub raw: f64,

    /// Rounded, clamped score
    pub score: u8,
}

impl DiseaseScoreBreakdown {
    fn no_evidence() -> Self {
        Self {
            matched_symptoms: Vec::new(),
            match_rate: 0.0,
            symptom_points: 0.0,
            multi_symptom_bonus: 0.0,
            crop_points: 0.0,
            exact_crop: false,
            season_points: 0.0,
            weather_points: 0.0,
            severity_bonus: 0.0,
            raw: 0.0,
            score: 0,
        }
    }
}

/// Score a disease with full breakdown
pub fn score_disease(disease: &Disease, query: &SymptomQuery) -> DiseaseScoreBreakdown {
    let matched_symptoms: Vec<Symptom> = disease
        .symptoms
        .iter()
        .copied()
        .filter(|s| query.reports(*s))
        .collect();

    if matched_symptoms.is_empty() || disease.symptoms.is_empty() {
        return DiseaseScoreBreakdown::no_evidence();
    }

    let match_rate = matched_symptoms.len() as f64 / disease.symptoms.len() as f64;
    let symptom_points = match_rate * SYMPTOM_WEIGHT;
    let multi_symptom_bonus = if matched_symptoms.len() >= 2 { 10.0 } else { 0.0 };

    let exact_crop = disease.affects_exactly(&query.crop);
    let crop_points = if exact_crop {
        30.0
    } else if disease.affects_mixed_vegetables() {
        15.0
    } else {
        0.0
    };

    let factors = &disease.environmental_factors;
    let season_points = if query.season.covered_by(&factors.favorable_seasons) { 10.0 } else { 0.0 };
    let weather_points = if factors.weather.contains(&query.weather) { 10.0 } else { 0.0 };

    let running = symptom_points + multi_symptom_bonus + crop_points + season_points + weather_points;
    let severity_bonus = if disease.severity == Severity::High && running > SEVERITY_AMPLIFIER_THRESHOLD {
        5.0
    } else {
        0.0
    };
    let raw = running + severity_bonus;

    DiseaseScoreBreakdown {
        matched_symptoms,
        match_rate,
        symptom_points,
        multi_symptom_bonus,
        crop_points,
        exact_crop,
        season_points,
        weather_points,
        severity_bonus,
        raw,
        score: clamp_score(raw),
    }
}

/// Score only
pub fn disease_score(disease: &Disease, query: &SymptomQuery) -> u8 {
    score_disease(disease, query).score
}
