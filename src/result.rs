//! Canonical Recommendation Result
//!
//! Every path through the engine (AI text, vision classifier, vision LLM, deterministic
//! rankers) is normalized into [`RecommendationResult`]. Callers never see a
//! source-specific shape; provenance travels on each item as a [`Source`] tag.

use crate::data::Treatments;
use crate::tiers::Severity;
use serde::{Deserialize, Serialize};

/// Where a recommendation item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Generative model or vision service, validated against the catalog
    Ai,
    /// Deterministic scoring engine
    RuleBased,
    /// Vision label with no catalog counterpart
    AiUnverified,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ai => "ai",
            Source::RuleBased => "rule-based",
            Source::AiUnverified => "ai-unverified",
        }
    }
}

/// Economics shown alongside a crop recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropDetail {
    pub investment: String,
    pub profit_margin: String,
    pub growth_cycle: String,
    pub market_demand: String,
}

/// A resistant variety with its display confidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarietySuggestion {
    pub name: String,
    pub confidence: u8,
}

/// Treatment and risk information shown alongside a disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseDetail {
    pub severity: Severity,

    /// Crop the diagnosis applies to (query crop, or the classifier's crop guess)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub treatments: Treatments,

    #[serde(default)]
    pub resistant_varieties: Vec<VarietySuggestion>,

    #[serde(default)]
    pub is_healthy: bool,
}

/// Subject-specific payload on an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ItemDetail {
    Crop(CropDetail),
    Disease(DiseaseDetail),
}

/// One ranked recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    /// Crop or disease name
    pub name: String,

    /// Display confidence (0-100)
    pub confidence: u8,

    /// Short human-readable justifications
    pub reasons: Vec<String>,

    pub source: Source,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ItemDetail>,
}

impl RecommendationItem {
    pub fn new(name: impl Into<String>, confidence: u8, reasons: Vec<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.min(100),
            reasons,
            source,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: ItemDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn disease_detail(&self) -> Option<&DiseaseDetail> {
        match &self.detail {
            Some(ItemDetail::Disease(detail)) => Some(detail),
            _ => None,
        }
    }

    pub fn crop_detail(&self) -> Option<&CropDetail> {
        match &self.detail {
            Some(ItemDetail::Crop(detail)) => Some(detail),
            _ => None,
        }
    }
}

/// Ordered recommendations plus optional context
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub items: Vec<RecommendationItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<String>,

    /// Why the deterministic path answered instead of the AI service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl RecommendationResult {
    pub fn from_items(items: Vec<RecommendationItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn with_fallback_reason(mut self, reason: impl Into<String>) -> Self {
        self.fallback_reason = Some(reason.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether every item carries the given provenance
    pub fn all_from(&self, source: Source) -> bool {
        self.items.iter().all(|item| item.source == source)
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_wire_names() {
        assert_eq!(serde_json::to_string(&Source::RuleBased).unwrap(), "\"rule-based\"");
        assert_eq!(serde_json::to_string(&Source::AiUnverified).unwrap(), "\"ai-unverified\"");
        assert_eq!(Source::Ai.as_str(), "ai");
    }

    #[test]
    fn test_confidence_capped_at_100() {
        let item = RecommendationItem::new("Rice", 140, vec![], Source::Ai);
        assert_eq!(item.confidence, 100);
    }

    #[test]
    fn test_item_json_shape() {
        let item = RecommendationItem::new("Coconut", 88, vec!["Thrives in Kerala".into()], Source::RuleBased)
            .with_detail(ItemDetail::Crop(CropDetail {
                investment: "₹60000/acre".into(),
                profit_margin: "56%".into(),
                growth_cycle: "1825 days".into(),
                market_demand: "High".into(),
            }));
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["source"], "rule-based");
        assert_eq!(json["detail"]["kind"], "crop");
        assert_eq!(json["detail"]["profitMargin"], "56%");
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_value(RecommendationResult::from_items(vec![])).unwrap();
        assert!(json.get("region").is_none());
        assert!(json.get("fallbackReason").is_none());
        assert!(json.get("tips").is_none());
    }
}
