use super::MAX_REASONS;
use crate::data::Crop;
use crate::query::FarmerQuery;
use crate::result::CropDetail;
use crate::scoring::{CropScoreBreakdown, CropTerm};
use crate::tiers::Goal;

/// Used when no term contributed positively
pub const FALLBACK_CROP_REASON: &str = "Best available match for your conditions";

/// Generate 1-3 reasons for a crop, strongest concern first
///
/// Only terms that added to the score produce a reason, in [`CropTerm::RATIONALE_ORDER`].
pub fn generate_crop_reasons(crop: &Crop, query: &FarmerQuery, breakdown: &CropScoreBreakdown) -> Vec<String> {
    let mut reasons: Vec<String> = CropTerm::RATIONALE_ORDER
        .iter()
        .filter(|term| breakdown.contribution(**term) > 0)
        .filter_map(|term| term_reason(*term, crop, query, breakdown))
        .take(MAX_REASONS)
        .collect();

    if reasons.is_empty() {
        reasons.push(FALLBACK_CROP_REASON.to_string());
    }
    reasons
}

fn term_reason(term: CropTerm, crop: &Crop, query: &FarmerQuery, breakdown: &CropScoreBreakdown) -> Option<String> {
    let text = match term {
        CropTerm::Goal => match query.goal {
            Goal::Profit => format!(
                "High profitability potential (about ₹{:.0} profit per acre)",
                crop.projected_profit()
            ),
            Goal::LowRisk => "Low climate sensitivity keeps risk down".to_string(),
            Goal::QuickHarvest => format!("Quick harvest in {} days", crop.duration_days),
            Goal::Yield | Goal::Sustainability => return None,
        },
        CropTerm::Season => format!("Well suited to the {} season", query.season.display_name()),
        CropTerm::Water if breakdown.water >= 15 => "Matches your water availability".to_string(),
        CropTerm::Water => "Moderate water needs adapt to your supply".to_string(),
        CropTerm::Budget if breakdown.affordability >= 1.0 => "Fits within your budget".to_string(),
        CropTerm::Budget => format!(
            "Close to your budget (covers {:.0}% of the estimated cost)",
            breakdown.affordability * 100.0
        ),
        CropTerm::Soil => match query.soil {
            Some(soil) => format!("Grows well in {} soil", soil),
            None => return None,
        },
        CropTerm::Climate => "Expected rainfall is close to what the crop needs".to_string(),
    };
    Some(text)
}

/// Economics payload for a rule-based crop item
pub fn crop_detail(crop: &Crop, query: &FarmerQuery) -> CropDetail {
    let revenue = crop.expected_yield_kg * crop.market_price_per_kg;
    let margin = if revenue > 0.0 {
        (crop.projected_profit() / revenue * 100.0).round()
    } else {
        0.0
    };

    CropDetail {
        investment: format!("₹{:.0}", crop.investment_per_acre * query.farm_size()),
        profit_margin: format!("{:.0}%", margin),
        growth_cycle: format!("{} days", crop.duration_days),
        market_demand: crop.market_demand.display_text().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::crop;
    use crate::query::Budget;
    use crate::scoring::score_crop;
    use crate::tiers::{Season, SoilType, WaterTier};

    fn query(goal: Goal) -> FarmerQuery {
        FarmerQuery::new(Season::Kharif, Budget::Amount(50_000.0), WaterTier::Moderate, goal)
    }

    #[test]
    fn test_reasons_follow_priority_order() {
        let rice = crop("Rice (Paddy)");
        let q = query(Goal::QuickHarvest).with_soil(SoilType::Laterite);
        let reasons = generate_crop_reasons(&rice, &q, &score_crop(&rice, &q, None));

        assert_eq!(
            reasons,
            vec![
                "Quick harvest in 120 days".to_string(),
                "Well suited to the Kharif season".to_string(),
                "Matches your water availability".to_string(),
            ]
        );
    }

    #[test]
    fn test_partial_budget_reason() {
        let rice = crop("Rice (Paddy)");
        let mut q = query(Goal::Yield);
        q.budget = Budget::Amount(30_000.0);
        q.season = Season::Rabi;
        q.water = WaterTier::High;
        let breakdown = score_crop(&rice, &q, None);
        let reasons = generate_crop_reasons(&rice, &q, &breakdown);

        assert_eq!(reasons[0], "Moderate water needs adapt to your supply");
        assert_eq!(reasons[1], "Close to your budget (covers 75% of the estimated cost)");
    }

    #[test]
    fn test_fallback_reason_when_nothing_contributes() {
        let mut rice = crop("Rice (Paddy)");
        rice.water = WaterTier::High;
        let mut q = query(Goal::Yield);
        q.season = Season::Summer;
        q.water = WaterTier::Low;
        q.budget = Budget::Amount(0.0);

        let reasons = generate_crop_reasons(&rice, &q, &score_crop(&rice, &q, None));
        assert_eq!(reasons, vec![FALLBACK_CROP_REASON.to_string()]);
    }

    #[test]
    fn test_crop_detail_scales_investment_with_farm_size() {
        let rice = crop("Rice (Paddy)");
        let detail = crop_detail(&rice, &query(Goal::Profit).with_farm_size(2.0));
        assert_eq!(detail.investment, "₹80000");
        // (50 000 − 40 000) / 50 000
        assert_eq!(detail.profit_margin, "20%");
        assert_eq!(detail.growth_cycle, "120 days");
        assert_eq!(detail.market_demand, "High");
    }
}
