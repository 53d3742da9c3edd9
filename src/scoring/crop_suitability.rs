//! Crop Suitability Scoring
//!
//! Scores one catalog crop against a farmer's constraints. Base 50, then six additive
//! terms (season, soil, water, budget, climate risk, goal) and a final clamp to [0, 100].
//!
//! | Term    | Reward                                  | Penalty            |
//! |---------|-----------------------------------------|--------------------|
//! | Season  | +20 in season (or crop accepts all)     | −30                |
//! | Soil    | +15 accepted (or crop accepts all)      | −20 (0 if no soil) |
//! | Water   | +15 exact tier, +5 moderate crop        | 0                  |
//! | Budget  | +10 affordability ≥ 1, +5 ≥ 0.7         | −15                |
//! | Climate | +10 rainfall gap < 200 mm, 0 < 500 mm   | −20                |
//! | Goal    | +10 profit, +15 low risk / quick harvest | 0                 |

use super::clamp_score;
use crate::data::Crop;
use crate::query::{EnvironmentalContext, FarmerQuery};
use crate::tiers::{Goal, Sensitivity, SoilType, WaterTier};

pub const BASE_SCORE: i32 = 50;

/// Profit per acre above which the profit goal earns its bonus (₹)
pub const PROFIT_GOAL_THRESHOLD: f64 = 100_000.0;

/// Crops shorter than this count as a quick harvest (days)
pub const QUICK_HARVEST_DAYS: u32 = 180;

/// Individual scoring terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropTerm {
    Goal,
    Season,
    Water,
    Budget,
    Soil,
    Climate,
}

impl CropTerm {
    /// Order in which terms are turned into reasons
    pub const RATIONALE_ORDER: [CropTerm; 6] = [
        CropTerm::Goal,
        CropTerm::Season,
        CropTerm::Water,
        CropTerm::Budget,
        CropTerm::Soil,
        CropTerm::Climate,
    ];
}

/// Per-term contributions for one crop
#[derive(Debug, Clone, PartialEq)]
pub struct CropScoreBreakdown {
    pub season: i32,
    pub soil: i32,
    pub water: i32,
    pub budget: i32,
    pub climate: i32,
    pub goal: i32,

    /// Budget / estimated cost (infinite for a zero-cost crop)
    pub affordability: f64,

    /// |30-day rainfall − crop requirement| (mm)
    pub rainfall_gap_mm: f64,

    /// Final clamped score
    pub score: u8,
}

impl CropScoreBreakdown {
    pub fn contribution(&self, term: CropTerm) -> i32 {
        match term {
            CropTerm::Goal => self.goal,
            CropTerm::Season => self.season,
            CropTerm::Water => self.water,
            CropTerm::Budget => self.budget,
            CropTerm::Soil => self.soil,
            CropTerm::Climate => self.climate,
        }
    }

    /// Unclamped total
    pub fn raw(&self) -> i32 {
        BASE_SCORE + self.season + self.soil + self.water + self.budget + self.climate + self.goal
    }
}

/// Score a crop with full breakdown
pub fn score_crop(
    crop: &Crop,
    query: &FarmerQuery,
    context: Option<&EnvironmentalContext>,
) -> CropScoreBreakdown {
    let season = if query.season.covered_by(&crop.seasons) { 20 } else { -30 };

    let soil = match query.soil {
        None | Some(SoilType::All) => 0,
        Some(soil) if soil.covered_by(&crop.soils) => 15,
        Some(_) => -20,
    };

    let water = if crop.water == query.water {
        15
    } else if crop.water == WaterTier::Moderate {
        5
    } else {
        0
    };

    let estimated_cost = crop.investment_per_acre * query.farm_size();
    let affordability = if estimated_cost > 0.0 {
        query.budget.amount() / estimated_cost
    } else {
        f64::INFINITY
    };
    let budget = if affordability >= 1.0 {
        10
    } else if affordability >= 0.7 {
        5
    } else {
        -15
    };

    let rainfall = EnvironmentalContext::rainfall_or_default(context);
    let rainfall_gap_mm = (rainfall - crop.rainfall_required_mm).abs();
    let climate = if rainfall_gap_mm < 200.0 {
        10
    } else if rainfall_gap_mm < 500.0 {
        0
    } else {
        -20
    };

    let goal = match query.goal {
        Goal::Profit if crop.projected_profit() > PROFIT_GOAL_THRESHOLD => 10,
        Goal::LowRisk if crop.climate_sensitivity == Sensitivity::Low => 15,
        Goal::QuickHarvest if crop.duration_days < QUICK_HARVEST_DAYS => 15,
        _ => 0,
    };

    let mut breakdown = CropScoreBreakdown {
        season,
        soil,
        water,
        budget,
        climate,
        goal,
        affordability,
        rainfall_gap_mm,
        score: 0,
    };
    breakdown.score = clamp_score(breakdown.raw() as f64);
    breakdown
}

/// Score only
pub fn crop_score(crop: &Crop, query: &FarmerQuery, context: Option<&EnvironmentalContext>) -> u8 {
    score_crop(crop, query, context).score
}
