//! Farmer and Symptom Queries
//!
//! Per-request inputs to the scoring engines. Queries deserialize straight from the HTTP
//! body (camelCase) and are validated against the knowledge base before any scoring runs.

use crate::data::KnowledgeBase;
use crate::tiers::{BudgetTier, Goal, Season, SoilType, Symptom, WaterTier, Weather};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 30-day rainfall assumed when no environmental context is supplied (mm)
pub const DEFAULT_RAINFALL_MM: f64 = 200.0;

/// Farm size assumed when the farmer does not give one (acres)
pub const DEFAULT_FARM_SIZE: f64 = 1.0;

/// Descriptive validation failures for caller-supplied queries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("season must be kharif, rabi or summer; 'all' is only valid in catalog records")]
    WildcardSeason,

    #[error("farm size must be a positive number, got {0}")]
    NonPositiveFarmSize(f64),

    #[error("budget must be a non-negative amount, got {0}")]
    NegativeBudget(f64),

    #[error("rainfall must be a non-negative number of millimetres, got {0}")]
    InvalidRainfall(f64),

    #[error("at least one symptom is required")]
    EmptySymptoms,

    #[error("crop name is required")]
    MissingCrop,

    #[error("unknown crop '{0}'")]
    UnknownCrop(String),
}

/// Budget as an explicit amount (₹) or a coarse tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Budget {
    Amount(f64),
    Tier(BudgetTier),
}

impl Budget {
    /// Amount used for affordability; tiers map to their representative amount
    pub fn amount(&self) -> f64 {
        match self {
            Budget::Amount(value) => *value,
            Budget::Tier(tier) => tier.representative_amount(),
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Amount(value) => write!(f, "₹{:.0}", value),
            Budget::Tier(tier) => write!(f, "{} (about ₹{:.0})", tier, tier.representative_amount()),
        }
    }
}

/// Constraints a farmer states when asking what to plant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerQuery {
    pub season: Season,
    pub budget: Budget,

    /// Water availability on the farm
    #[serde(alias = "waterAvailability")]
    pub water: WaterTier,

    pub goal: Goal,

    #[serde(default, alias = "soilType")]
    pub soil: Option<SoilType>,

    /// Acres; `None` means one acre
    #[serde(default)]
    pub farm_size: Option<f64>,
}

impl FarmerQuery {
    pub fn new(season: Season, budget: Budget, water: WaterTier, goal: Goal) -> Self {
        Self {
            season,
            budget,
            water,
            goal,
            soil: None,
            farm_size: None,
        }
    }

    pub fn with_soil(mut self, soil: SoilType) -> Self {
        self.soil = Some(soil);
        self
    }

    pub fn with_farm_size(mut self, acres: f64) -> Self {
        self.farm_size = Some(acres);
        self
    }

    /// Effective farm size
    pub fn farm_size(&self) -> f64 {
        self.farm_size.unwrap_or(DEFAULT_FARM_SIZE)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.season == Season::All {
            return Err(QueryError::WildcardSeason);
        }
        let size = self.farm_size();
        if !size.is_finite() || size <= 0.0 {
            return Err(QueryError::NonPositiveFarmSize(size));
        }
        let amount = self.budget.amount();
        if !amount.is_finite() || amount < 0.0 {
            return Err(QueryError::NegativeBudget(amount));
        }
        Ok(())
    }
}

fn default_weather() -> Weather {
    Weather::Humid
}

/// Observed symptoms on a named crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomQuery {
    pub crop: String,
    pub symptoms: Vec<Symptom>,
    pub season: Season,

    #[serde(default = "default_weather")]
    pub weather: Weather,
}

impl SymptomQuery {
    pub fn new(crop: impl Into<String>, symptoms: Vec<Symptom>, season: Season, weather: Weather) -> Self {
        Self {
            crop: crop.into(),
            symptoms,
            season,
            weather,
        }
    }

    /// Whether the query reports a given symptom
    pub fn reports(&self, symptom: Symptom) -> bool {
        self.symptoms.contains(&symptom)
    }

    pub fn validate(&self, kb: &KnowledgeBase) -> Result<(), QueryError> {
        if self.crop.trim().is_empty() {
            return Err(QueryError::MissingCrop);
        }
        if self.symptoms.is_empty() {
            return Err(QueryError::EmptySymptoms);
        }
        if self.season == Season::All {
            return Err(QueryError::WildcardSeason);
        }
        if !kb.is_known_crop(&self.crop) {
            return Err(QueryError::UnknownCrop(self.crop.trim().to_string()));
        }
        Ok(())
    }
}

/// Optional weather context for climate-risk scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalContext {
    /// Rolling 30-day rainfall estimate (mm)
    pub rainfall_30d_mm: f64,
}

impl Default for EnvironmentalContext {
    fn default() -> Self {
        Self {
            rainfall_30d_mm: DEFAULT_RAINFALL_MM,
        }
    }
}

impl EnvironmentalContext {
    /// Rainfall from an optional context, falling back to [`DEFAULT_RAINFALL_MM`]
    pub fn rainfall_or_default(context: Option<&EnvironmentalContext>) -> f64 {
        context.map_or(DEFAULT_RAINFALL_MM, |c| c.rainfall_30d_mm)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if !self.rainfall_30d_mm.is_finite() || self.rainfall_30d_mm < 0.0 {
            return Err(QueryError::InvalidRainfall(self.rainfall_30d_mm));
        }
        Ok(())
    }
}
