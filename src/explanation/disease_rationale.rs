use super::MAX_REASONS;
use crate::data::Disease;
use crate::query::SymptomQuery;
use crate::result::{DiseaseDetail, VarietySuggestion};
use crate::scoring::DiseaseScoreBreakdown;
use crate::tiers::Severity;

/// Display confidence of the first resistant variety; each next one drops by 5
const FIRST_VARIETY_CONFIDENCE: u8 = 90;
const VARIETY_CONFIDENCE_STEP: u8 = 5;
const MAX_VARIETIES: usize = 3;

/// Generate up to 3 reasons explaining a disease match
pub fn generate_disease_reasons(
    disease: &Disease,
    query: &SymptomQuery,
    breakdown: &DiseaseScoreBreakdown,
) -> Vec<String> {
    let mut reasons = Vec::with_capacity(MAX_REASONS);

    if !breakdown.matched_symptoms.is_empty() {
        let labels: Vec<String> = breakdown
            .matched_symptoms
            .iter()
            .map(|s| s.label().to_lowercase())
            .collect();
        reasons.push(format!(
            "Matches {} of {} symptoms: {}",
            breakdown.matched_symptoms.len(),
            disease.symptoms.len(),
            labels.join(", ")
        ));
    }

    if breakdown.exact_crop {
        reasons.push(format!("Known to affect {}", query.crop.trim()));
    } else if breakdown.crop_points > 0.0 {
        reasons.push("Common across vegetable crops".to_string());
    }

    match (breakdown.season_points > 0.0, breakdown.weather_points > 0.0) {
        (true, true) => reasons.push(format!(
            "Favored by {} season and {} weather",
            query.season.display_name(),
            query.weather
        )),
        (true, false) => reasons.push(format!("Active in the {} season", query.season.display_name())),
        (false, true) => reasons.push(format!("Favored by {} weather", query.weather)),
        (false, false) => {}
    }

    if disease.severity == Severity::High {
        reasons.push("High severity: act quickly to limit spread".to_string());
    }

    reasons.truncate(MAX_REASONS);
    reasons
}

/// Resistant varieties at descending display confidence
///
/// A catalog entry without varieties gets one generic suggestion for the crop.
pub fn resistant_variety_suggestions(disease: &Disease, crop: &str) -> Vec<VarietySuggestion> {
    if disease.resistant_varieties.is_empty() {
        return vec![VarietySuggestion {
            name: format!("Disease-resistant variety of {}", crop.trim()),
            confidence: FIRST_VARIETY_CONFIDENCE,
        }];
    }

    disease
        .resistant_varieties
        .iter()
        .take(MAX_VARIETIES)
        .zip(0u8..)
        .map(|(name, idx)| VarietySuggestion {
            name: name.clone(),
            confidence: FIRST_VARIETY_CONFIDENCE - idx * VARIETY_CONFIDENCE_STEP,
        })
        .collect()
}

/// Catalog enrichment payload for a disease item
pub fn disease_detail(disease: &Disease, crop: Option<&str>) -> DiseaseDetail {
    let crop_name = crop
        .map(str::to_string)
        .or_else(|| disease.affected_crops.first().cloned())
        .unwrap_or_default();

    DiseaseDetail {
        severity: disease.severity,
        crop: crop.map(|c| c.trim().to_string()),
        description: disease.description.clone(),
        treatments: disease.treatments.clone(),
        resistant_varieties: resistant_variety_suggestions(disease, &crop_name),
        is_healthy: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::disease;
    use crate::scoring::score_disease;
    use crate::tiers::{Season, Symptom, Weather};

    #[test]
    fn test_reasons_for_blast() {
        let blast = disease("Blast", "Rice");
        let q = SymptomQuery::new("Rice", vec![Symptom::LeafSpots, Symptom::Wilting], Season::Kharif, Weather::Humid);
        let reasons = generate_disease_reasons(&blast, &q, &score_disease(&blast, &q));

        assert_eq!(reasons.len(), 3);
        assert_eq!(reasons[0], "Matches 2 of 3 symptoms: leaf spots, wilting");
        assert_eq!(reasons[1], "Known to affect Rice");
        assert_eq!(reasons[2], "Favored by Kharif season and humid weather");
    }

    #[test]
    fn test_variety_confidences_descend() {
        let mut blast = disease("Blast", "Rice");
        blast.resistant_varieties = vec!["Jyothi".into(), "Uma".into(), "Kanchana".into(), "Aiswarya".into()];
        let varieties = resistant_variety_suggestions(&blast, "Rice");

        let confidences: Vec<u8> = varieties.iter().map(|v| v.confidence).collect();
        assert_eq!(confidences, vec![90, 85, 80]);
        assert_eq!(varieties[2].name, "Kanchana");
    }

    #[test]
    fn test_synthetic_variety_when_catalog_has_none() {
        let mut rot = disease("Bud Rot", "Coconut");
        rot.resistant_varieties.clear();
        let varieties = resistant_variety_suggestions(&rot, "Coconut");
        assert_eq!(varieties.len(), 1);
        assert_eq!(varieties[0].name, "Disease-resistant variety of Coconut");
        assert_eq!(varieties[0].confidence, 90);
    }

    #[test]
    fn test_detail_carries_catalog_treatments() {
        let blast = disease("Blast", "Rice");
        let detail = disease_detail(&blast, Some("Rice"));
        assert_eq!(detail.severity, Severity::High);
        assert_eq!(detail.treatments, blast.treatments);
        assert!(!detail.is_healthy);
    }
}
