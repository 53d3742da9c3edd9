//! Deterministic Rankers
//!
//! Score every catalog record, stable-sort by score (ties keep catalog order), keep the
//! top 3 and attach rationale. No randomness, no I/O: identical inputs always produce
//! identical output.
//!
//! The crop catalog is scored with Rayon; `collect` on an indexed parallel iterator
//! preserves input order, so the subsequent stable sort sees catalog order exactly as a
//! sequential run would.

use crate::data::KnowledgeBase;
use crate::explanation::{crop_detail, disease_detail, generate_crop_reasons, generate_disease_reasons};
use crate::query::{EnvironmentalContext, FarmerQuery, SymptomQuery};
use crate::result::{ItemDetail, RecommendationItem, RecommendationResult, Source};
use crate::scoring::{score_crop, score_disease, CropScoreBreakdown, DiseaseScoreBreakdown};
use rayon::prelude::*;

/// Maximum items a ranker returns
pub const TOP_N: usize = 3;

/// Ranks the crop catalog against a farmer query
pub struct DeterministicCropRanker<'a> {
    kb: &'a KnowledgeBase,
}

impl<'a> DeterministicCropRanker<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Score every crop, in catalog order
    pub fn score_all(
        &self,
        query: &FarmerQuery,
        context: Option<&EnvironmentalContext>,
    ) -> Vec<(usize, CropScoreBreakdown)> {
        self.kb
            .crops()
            .par_iter()
            .enumerate()
            .map(|(idx, crop)| (idx, score_crop(crop, query, context)))
            .collect()
    }

    /// Top 3 crops with reasons, source `rule-based`
    ///
    /// Expects a validated query.
    pub fn rank(&self, query: &FarmerQuery, context: Option<&EnvironmentalContext>) -> RecommendationResult {
        let mut scored = self.score_all(query, context);
        scored.sort_by(|a, b| b.1.score.cmp(&a.1.score));
        scored.truncate(TOP_N);

        let items = scored
            .into_iter()
            .map(|(idx, breakdown)| {
                let crop = &self.kb.crops()[idx];
                let reasons = generate_crop_reasons(crop, query, &breakdown);
                RecommendationItem::new(crop.name.clone(), breakdown.score, reasons, Source::RuleBased)
                    .with_detail(ItemDetail::Crop(crop_detail(crop, query)))
            })
            .collect();

        RecommendationResult::from_items(items)
    }
}

/// Ranks the disease catalog against a symptom report
pub struct DeterministicDiseaseRanker<'a> {
    kb: &'a KnowledgeBase,
}

impl<'a> DeterministicDiseaseRanker<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Score every disease, in catalog order (zero scores included)
    pub fn score_all(&self, query: &SymptomQuery) -> Vec<(usize, DiseaseScoreBreakdown)> {
        self.kb
            .diseases()
            .iter()
            .enumerate()
            .map(|(idx, disease)| (idx, score_disease(disease, query)))
            .collect()
    }

    /// Top 3 non-zero diseases with reasons and resistant varieties, source `rule-based`
    ///
    /// Expects a validated query. Empty when no disease shares a symptom with the query.
    pub fn rank(&self, query: &SymptomQuery) -> RecommendationResult {
        let mut scored: Vec<_> = self
            .score_all(query)
            .into_iter()
            .filter(|(_, breakdown)| breakdown.score > 0)
            .collect();
        scored.sort_by(|a, b| b.1.score.cmp(&a.1.score));
        scored.truncate(TOP_N);

        let items = scored
            .into_iter()
            .map(|(idx, breakdown)| {
                let disease = &self.kb.diseases()[idx];
                let reasons = generate_disease_reasons(disease, query, &breakdown);
                RecommendationItem::new(disease.name.clone(), breakdown.score, reasons, Source::RuleBased)
                    .with_detail(ItemDetail::Disease(disease_detail(disease, Some(&query.crop))))
            })
            .collect();

        RecommendationResult::from_items(items)
    }
}
