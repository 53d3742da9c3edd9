//! AI Crop Recommendation Adapter
//!
//! Asks a generative model for the top crops, constrained to the catalog's approved
//! names, and normalizes the reply into the canonical result shape. Any defect in the
//! reply (no JSON, wrong schema, unknown crop, out-of-range confidence) fails the whole
//! call; a partial AI answer is never returned.

use super::error::ServiceError;
use super::extract::extract_json_payload;
use super::service::GenerativeModel;
use crate::data::KnowledgeBase;
use crate::query::FarmerQuery;
use crate::ranker::TOP_N;
use crate::result::{CropDetail, ItemDetail, RecommendationItem, RecommendationResult, Source};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_AI_REASON: &str = "Recommended by the AI advisor for your profile";

/// Why an AI recommendation could not be used
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiRecommendationError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("reply contained no JSON payload")]
    NoJson,

    #[error("reply did not match the expected schema: {0}")]
    Schema(String),

    #[error("model returned no recommendations")]
    EmptyRecommendations,

    #[error("model recommended '{0}', which is not in the approved crop list")]
    DisallowedCrop(String),

    #[error("confidence for '{name}' must be between 0 and 100, got {value}")]
    InvalidConfidence { name: String, value: f64 },
}

impl AiRecommendationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AiRecommendationError::Service(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiReply {
    recommendations: Vec<AiCrop>,
    region: String,
    tips: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiCrop {
    name: String,
    confidence: f64,
    investment: String,
    profit_margin: String,
    growth_cycle: String,
    market_demand: String,
    reasons: Vec<String>,
}

/// Generative-model crop advisor
pub struct AIRecommendationAdapter {
    model: Arc<dyn GenerativeModel>,
    timeout: Duration,
}

impl AIRecommendationAdapter {
    pub fn new(model: Arc<dyn GenerativeModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Prompt stating the farmer profile and the approved crop list
    pub fn build_prompt(query: &FarmerQuery, approved: &[&str]) -> String {
        let soil_line = query
            .soil
            .map(|soil| format!("\n- Soil Type: {}", soil))
            .unwrap_or_default();

        format!(
            r#"You are an expert agricultural advisor for farmers in Kerala, India.

Based on the following farmer profile, recommend the TOP {top} BEST CROPS to grow.

**IMPORTANT:** You must ONLY recommend crops from this approved list:
{approved}

**Farmer's Profile:**
- Season: {season}
- Budget: {budget}
- Farm Size: {size} acres
- Water Availability: {water}
- Primary Goal: {goal}{soil_line}

**Requirements:**
1. Focus on crops suitable for Kerala's climate and soil.
2. Consider local market demand.
3. Use the exact crop name from the approved list.
4. Return ONLY a valid JSON object in this format:
{{
    "recommendations": [
        {{
            "name": "Exact Name from Approved List",
            "confidence": 92,
            "investment": "₹XX,000 - ₹XX,000/acre",
            "profitMargin": "+XX%",
            "growthCycle": "X-X months",
            "marketDemand": "High/Medium/Low",
            "reasons": ["Reason 1", "Reason 2"]
        }}
    ],
    "region": "Recommended Kerala region",
    "tips": ["Tip 1", "Tip 2"]
}}"#,
            top = TOP_N,
            approved = approved.join(", "),
            season = query.season.display_name(),
            budget = query.budget,
            size = query.farm_size(),
            water = query.water,
            goal = query.goal,
        )
    }

    /// Ask the model, bounded by the adapter timeout
    pub async fn recommend(
        &self,
        kb: &KnowledgeBase,
        query: &FarmerQuery,
    ) -> Result<RecommendationResult, AiRecommendationError> {
        let prompt = Self::build_prompt(query, &kb.approved_crop_names());

        let reply = tokio::time::timeout(self.timeout, self.model.generate(&prompt, None))
            .await
            .map_err(|_| ServiceError::Timeout(self.timeout))??;

        let result = Self::parse_reply(&reply, kb)?;
        tracing::debug!(
            "AI recommended {:?} via {}",
            result.names(),
            self.model.name()
        );
        Ok(result)
    }

    /// Validate and normalize a raw model reply
    ///
    /// Every field of the requested shape must be present; display fields must be
    /// non-blank.
    pub fn parse_reply(reply: &str, kb: &KnowledgeBase) -> Result<RecommendationResult, AiRecommendationError> {
        let payload = extract_json_payload(reply).ok_or(AiRecommendationError::NoJson)?;
        let parsed: AiReply =
            serde_json::from_str(payload).map_err(|err| AiRecommendationError::Schema(err.to_string()))?;

        if parsed.recommendations.is_empty() {
            return Err(AiRecommendationError::EmptyRecommendations);
        }

        let mut items: Vec<RecommendationItem> = Vec::with_capacity(parsed.recommendations.len());
        for rec in parsed.recommendations {
            let crop = kb
                .crop(&rec.name)
                .ok_or_else(|| AiRecommendationError::DisallowedCrop(rec.name.clone()))?;

            if !rec.confidence.is_finite() || !(0.0..=100.0).contains(&rec.confidence) {
                return Err(AiRecommendationError::InvalidConfidence {
                    name: rec.name,
                    value: rec.confidence,
                });
            }

            if items.iter().any(|item| item.name == crop.name) {
                continue;
            }

            let mut reasons: Vec<String> = rec
                .reasons
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .take(3)
                .collect();
            if reasons.is_empty() {
                reasons.push(DEFAULT_AI_REASON.to_string());
            }

            let detail = CropDetail {
                investment: required_text(&crop.name, "investment", rec.investment)?,
                profit_margin: required_text(&crop.name, "profitMargin", rec.profit_margin)?,
                growth_cycle: required_text(&crop.name, "growthCycle", rec.growth_cycle)?,
                market_demand: required_text(&crop.name, "marketDemand", rec.market_demand)?,
            };

            items.push(
                RecommendationItem::new(crop.name.clone(), rec.confidence.round() as u8, reasons, Source::Ai)
                    .with_detail(ItemDetail::Crop(detail)),
            );
        }

        items.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        items.truncate(TOP_N);

        Ok(RecommendationResult {
            items,
            region: Some(parsed.region.trim().to_string()).filter(|r| !r.is_empty()),
            tips: parsed
                .tips
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            fallback_reason: None,
        })
    }
}

fn required_text(crop: &str, field: &str, value: String) -> Result<String, AiRecommendationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AiRecommendationError::Schema(format!("blank {} for '{}'", field, crop)));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::knowledge_base;
    use crate::query::Budget;
    use crate::tiers::{Goal, Season, WaterTier};
    use serde_json::{json, Value};

    fn query() -> FarmerQuery {
        FarmerQuery::new(Season::Kharif, Budget::Amount(50_000.0), WaterTier::Moderate, Goal::Profit)
    }

    fn item(name: &str, confidence: Value) -> Value {
        json!({
            "name": name,
            "confidence": confidence,
            "investment": "₹40,000/acre",
            "profitMargin": "+25%",
            "growthCycle": "4 months",
            "marketDemand": "High",
            "reasons": ["Suits the season"]
        })
    }

    fn reply(items: Vec<Value>) -> String {
        json!({"recommendations": items, "region": "Palakkad", "tips": ["Test the soil first"]}).to_string()
    }

    #[test]
    fn test_prompt_lists_approved_names_and_profile() {
        let prompt = AIRecommendationAdapter::build_prompt(&query(), &["Rice (Paddy)", "Coconut"]);
        assert!(prompt.contains("Rice (Paddy), Coconut"));
        assert!(prompt.contains("- Season: Kharif"));
        assert!(prompt.contains("- Budget: ₹50000"));
        assert!(prompt.contains("- Primary Goal: profit"));
        assert!(prompt.contains("\"recommendations\""));
        assert!(!prompt.contains("Soil Type"));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let kb = knowledge_base();
        let reply = r#"```json
{
  "recommendations": [
    {"name": "Banana", "confidence": 81.4, "investment": "₹1,00,000/acre", "profitMargin": "+40%",
     "growthCycle": "12 months", "marketDemand": "High", "reasons": ["Strong demand"]},
    {"name": "rice", "confidence": 92, "investment": "₹40,000/acre", "profitMargin": "+20%",
     "growthCycle": " 4 months ", "marketDemand": "Medium", "reasons": []}
  ],
  "region": "Palakkad",
  "tips": ["Use certified seed", "  "]
}
```"#;
        let result = AIRecommendationAdapter::parse_reply(reply, &kb).unwrap();

        assert_eq!(result.names(), vec!["Rice", "Banana"]);
        assert!(result.all_from(Source::Ai));
        assert_eq!(result.items[0].confidence, 92);
        assert_eq!(result.items[0].reasons, vec![DEFAULT_AI_REASON.to_string()]);
        assert_eq!(result.items[0].crop_detail().unwrap().growth_cycle, "4 months");
        assert_eq!(result.items[1].confidence, 81);
        assert_eq!(result.items[1].crop_detail().unwrap().investment, "₹1,00,000/acre");
        assert_eq!(result.region.as_deref(), Some("Palakkad"));
        assert_eq!(result.tips, vec!["Use certified seed".to_string()]);
    }

    #[test]
    fn test_missing_fields_reject_reply() {
        let kb = knowledge_base();
        let bare = r#"{"recommendations": [{"name": "Rice", "confidence": 70}]}"#;
        let err = AIRecommendationAdapter::parse_reply(bare, &kb).unwrap_err();
        assert!(matches!(err, AiRecommendationError::Schema(_)));

        for field in ["investment", "profitMargin", "growthCycle", "marketDemand", "reasons"] {
            let mut rice = item("Rice", json!(70));
            rice.as_object_mut().unwrap().remove(field);
            let err = AIRecommendationAdapter::parse_reply(&reply(vec![rice]), &kb).unwrap_err();
            assert!(matches!(err, AiRecommendationError::Schema(_)), "missing {}", field);
        }

        let no_region = json!({"recommendations": [item("Rice", json!(70))], "tips": []}).to_string();
        let err = AIRecommendationAdapter::parse_reply(&no_region, &kb).unwrap_err();
        assert!(matches!(err, AiRecommendationError::Schema(_)));

        let no_tips = json!({"recommendations": [item("Rice", json!(70))], "region": "Thrissur"}).to_string();
        let err = AIRecommendationAdapter::parse_reply(&no_tips, &kb).unwrap_err();
        assert!(matches!(err, AiRecommendationError::Schema(_)));
    }

    #[test]
    fn test_blank_display_field_rejects_reply() {
        let kb = knowledge_base();
        let mut rice = item("Rice", json!(70));
        rice["marketDemand"] = json!("   ");
        let err = AIRecommendationAdapter::parse_reply(&reply(vec![rice]), &kb).unwrap_err();
        assert!(matches!(err, AiRecommendationError::Schema(_)));
    }

    #[test]
    fn test_disallowed_crop_fails_whole_reply() {
        let kb = knowledge_base();
        let reply = reply(vec![item("Rice", json!(90)), item("Saffron", json!(88))]);
        assert_eq!(
            AIRecommendationAdapter::parse_reply(&reply, &kb),
            Err(AiRecommendationError::DisallowedCrop("Saffron".into()))
        );
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let kb = knowledge_base();
        let err = AIRecommendationAdapter::parse_reply(&reply(vec![item("Rice", json!(140))]), &kb).unwrap_err();
        assert!(matches!(err, AiRecommendationError::InvalidConfidence { .. }));
    }

    #[test]
    fn test_string_confidence_is_schema_error() {
        let kb = knowledge_base();
        let err = AIRecommendationAdapter::parse_reply(&reply(vec![item("Rice", json!("high"))]), &kb).unwrap_err();
        assert!(matches!(err, AiRecommendationError::Schema(_)));
    }

    #[test]
    fn test_non_json_and_empty_replies() {
        let kb = knowledge_base();
        assert_eq!(
            AIRecommendationAdapter::parse_reply("I cannot help with that.", &kb),
            Err(AiRecommendationError::NoJson)
        );
        assert_eq!(
            AIRecommendationAdapter::parse_reply(&reply(vec![]), &kb),
            Err(AiRecommendationError::EmptyRecommendations)
        );
    }

    #[test]
    fn test_truncates_to_top_three() {
        let kb = crate::data::KnowledgeBase::bundled().unwrap();
        let reply = reply(vec![
            item("Coconut", json!(60)),
            item("Mango", json!(95)),
            item("Cocoa", json!(70)),
            item("Vanilla", json!(80)),
        ]);
        let result = AIRecommendationAdapter::parse_reply(&reply, &kb).unwrap();
        assert_eq!(result.names(), vec!["Mango", "Vanilla", "Cocoa"]);
    }
}
