//! Knowledge Base Loading and Management
//!
//! Holds the crop and disease catalogs the scoring engines read from. The catalogs are
//! parsed and validated once at startup; afterwards the [`KnowledgeBase`] is immutable and
//! shared behind an `Arc`. Every structural problem (missing field, empty symptom set,
//! empty treatment list, duplicate name, non-finite number) is rejected here so that
//! scoring can be total.

use crate::tiers::{Rating, Season, Sensitivity, Severity, SoilType, Symptom, WaterTier, Weather};
use anyhow::{Context, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Wildcard affected-crop bucket matching any vegetable crop
pub const MIXED_VEGETABLES: &str = "Vegetables (Mixed)";

const BUNDLED_CROPS: &str = include_str!("../data/crops.json");
const BUNDLED_DISEASES: &str = include_str!("../data/diseases.json");

/// Catalog integrity failures. Always fatal at load time.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("failed to parse {catalog} catalog: {source}")]
    Parse {
        catalog: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {catalog} record '{name}': {reason}")]
    InvalidRecord {
        catalog: &'static str,
        name: String,
        reason: String,
    },

    #[error("duplicate {catalog} name '{name}'")]
    DuplicateName { catalog: &'static str, name: String },

    #[error("{catalog} catalog is empty")]
    EmptyCatalog { catalog: &'static str },
}

/// Crop catalog record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    /// Unique crop name (also the approved name the AI must use)
    pub name: String,

    /// Suitable seasons (may contain `all`)
    pub seasons: Vec<Season>,

    /// Suitable soils (may contain `all`)
    pub soils: Vec<SoilType>,

    /// Water requirement
    pub water: WaterTier,

    /// Investment per acre (₹)
    pub investment_per_acre: f64,

    /// Expected yield per acre (kg)
    pub expected_yield_kg: f64,

    /// Market price (₹/kg)
    pub market_price_per_kg: f64,

    /// Rainfall the crop needs over its critical growth window (mm)
    pub rainfall_required_mm: f64,

    /// Days from planting to first harvest
    pub duration_days: u32,

    pub climate_sensitivity: Sensitivity,
    pub kerala_suitability: Rating,
    pub market_demand: Rating,
    pub profitability: Rating,
    pub sustainability: Rating,
}

impl Crop {
    /// Revenue minus investment for one acre
    pub fn projected_profit(&self) -> f64 {
        self.expected_yield_kg * self.market_price_per_kg - self.investment_per_acre
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is empty".into());
        }
        if self.seasons.is_empty() {
            return Err("at least one season is required".into());
        }
        if self.soils.is_empty() {
            return Err("at least one soil type is required".into());
        }
        let numeric = [
            ("investmentPerAcre", self.investment_per_acre),
            ("expectedYieldKg", self.expected_yield_kg),
            ("marketPricePerKg", self.market_price_per_kg),
            ("rainfallRequiredMm", self.rainfall_required_mm),
        ];
        for (field, value) in numeric {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", field, value));
            }
        }
        Ok(())
    }
}

/// Environmental conditions under which a disease thrives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalFactors {
    pub favorable_seasons: Vec<Season>,
    pub weather: Vec<Weather>,
}

/// Treatment actions by category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatments {
    pub organic: Vec<String>,
    pub chemical: Vec<String>,
    pub prevention: Vec<String>,
}

impl Treatments {
    /// Generic treatments for a disease the catalog does not know
    pub fn consult_expert() -> Self {
        Self {
            organic: vec!["Consult agricultural expert for specific treatment".to_string()],
            chemical: vec!["Consult agricultural expert for chemical treatment options".to_string()],
            prevention: vec![
                "Regular monitoring".to_string(),
                "Proper crop spacing".to_string(),
                "Good drainage".to_string(),
            ],
        }
    }

    fn validate(&self) -> Result<(), String> {
        let categories = [
            ("organic", &self.organic),
            ("chemical", &self.chemical),
            ("prevention", &self.prevention),
        ];
        for (category, actions) in categories {
            if actions.is_empty() {
                return Err(format!("{} treatments are empty", category));
            }
            if actions.iter().any(|a| a.trim().is_empty()) {
                return Err(format!("{} treatments contain a blank action", category));
            }
        }
        Ok(())
    }
}

/// Disease catalog record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disease {
    #[serde(default)]
    pub id: Option<u32>,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub symptoms: Vec<Symptom>,

    /// Crop names, possibly including [`MIXED_VEGETABLES`]
    pub affected_crops: Vec<String>,

    pub severity: Severity,

    pub environmental_factors: EnvironmentalFactors,

    pub treatments: Treatments,

    #[serde(default)]
    pub resistant_varieties: Vec<String>,
}

impl Disease {
    /// Exact (case-insensitive) affected-crop match, ignoring the mixed bucket
    pub fn affects_exactly(&self, crop: &str) -> bool {
        let crop = crop.trim();
        self.affected_crops
            .iter()
            .any(|c| c != MIXED_VEGETABLES && c.eq_ignore_ascii_case(crop))
    }

    /// Whether the disease lists the generic vegetable bucket
    pub fn affects_mixed_vegetables(&self) -> bool {
        self.affected_crops.iter().any(|c| c == MIXED_VEGETABLES)
    }

    fn validate(&mut self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is empty".into());
        }
        self.symptoms.sort();
        self.symptoms.dedup();
        if self.symptoms.is_empty() {
            return Err("symptom set is empty".into());
        }
        if self.affected_crops.iter().all(|c| c.trim().is_empty()) {
            return Err("no affected crops".into());
        }
        self.treatments.validate()
    }
}

/// Immutable crop + disease catalogs
///
/// Constructed explicitly and injected into rankers and adapters; there is no global
/// instance, so tests can substitute fixtures freely.
#[derive(Debug)]
pub struct KnowledgeBase {
    crops: Vec<Crop>,
    diseases: Vec<Disease>,

    /// Lowercased crop name → index into `crops`
    crop_index: FxHashMap<String, usize>,

    /// Lowercased disease name → index into `diseases`
    disease_index: FxHashMap<String, usize>,

    /// Lowercased names accepted in symptom queries (catalog crops + affected crops)
    known_crops: FxHashSet<String>,
}

impl KnowledgeBase {
    /// Build from already-parsed records, validating every entry
    pub fn from_records(crops: Vec<Crop>, mut diseases: Vec<Disease>) -> Result<Self, KnowledgeBaseError> {
        if crops.is_empty() {
            return Err(KnowledgeBaseError::EmptyCatalog { catalog: "crop" });
        }
        if diseases.is_empty() {
            return Err(KnowledgeBaseError::EmptyCatalog { catalog: "disease" });
        }

        let mut crop_index = FxHashMap::default();
        let mut known_crops = FxHashSet::default();
        for (idx, crop) in crops.iter().enumerate() {
            crop.validate().map_err(|reason| KnowledgeBaseError::InvalidRecord {
                catalog: "crop",
                name: crop.name.clone(),
                reason,
            })?;
            let key = crop.name.trim().to_lowercase();
            if crop_index.insert(key.clone(), idx).is_some() {
                return Err(KnowledgeBaseError::DuplicateName {
                    catalog: "crop",
                    name: crop.name.clone(),
                });
            }
            known_crops.insert(key);
        }

        let mut disease_index = FxHashMap::default();
        for (idx, disease) in diseases.iter_mut().enumerate() {
            disease.validate().map_err(|reason| KnowledgeBaseError::InvalidRecord {
                catalog: "disease",
                name: disease.name.clone(),
                reason,
            })?;
            if disease_index.insert(disease.name.trim().to_lowercase(), idx).is_some() {
                return Err(KnowledgeBaseError::DuplicateName {
                    catalog: "disease",
                    name: disease.name.clone(),
                });
            }
            for crop in &disease.affected_crops {
                if crop != MIXED_VEGETABLES && !crop.trim().is_empty() {
                    known_crops.insert(crop.trim().to_lowercase());
                }
            }
        }

        Ok(Self {
            crops,
            diseases,
            crop_index,
            disease_index,
            known_crops,
        })
    }

    /// Parse both catalogs from JSON arrays
    pub fn from_json(crops_json: &str, diseases_json: &str) -> Result<Self, KnowledgeBaseError> {
        let crops: Vec<Crop> = serde_json::from_str(crops_json)
            .map_err(|source| KnowledgeBaseError::Parse { catalog: "crop", source })?;
        let diseases: Vec<Disease> = serde_json::from_str(diseases_json)
            .map_err(|source| KnowledgeBaseError::Parse { catalog: "disease", source })?;
        Self::from_records(crops, diseases)
    }

    /// Catalogs compiled into the binary (`data/crops.json`, `data/diseases.json`)
    pub fn bundled() -> Result<Self, KnowledgeBaseError> {
        Self::from_json(BUNDLED_CROPS, BUNDLED_DISEASES)
    }

    /// Load `crops.json` and `diseases.json` from a data directory
    pub fn load(data_dir: &Path) -> Result<Self> {
        let crops_path = data_dir.join("crops.json");
        let diseases_path = data_dir.join("diseases.json");

        let crops_json = fs::read_to_string(&crops_path)
            .with_context(|| format!("Failed to read crop catalog: {:?}", crops_path))?;
        let diseases_json = fs::read_to_string(&diseases_path)
            .with_context(|| format!("Failed to read disease catalog: {:?}", diseases_path))?;

        let kb = Self::from_json(&crops_json, &diseases_json)
            .with_context(|| format!("Invalid knowledge base in {:?}", data_dir))?;

        tracing::info!("Loaded knowledge base from {:?}", data_dir);
        tracing::info!("  Crops: {}", kb.crops.len());
        tracing::info!("  Diseases: {}", kb.diseases.len());

        Ok(kb)
    }

    /// All crops, in catalog order
    pub fn crops(&self) -> &[Crop] {
        &self.crops
    }

    /// All diseases, in catalog order
    pub fn diseases(&self) -> &[Disease] {
        &self.diseases
    }

    /// Case-insensitive crop lookup
    pub fn crop(&self, name: &str) -> Option<&Crop> {
        self.crop_index
            .get(&name.trim().to_lowercase())
            .map(|&idx| &self.crops[idx])
    }

    /// Case-insensitive disease lookup
    pub fn disease(&self, name: &str) -> Option<&Disease> {
        self.disease_index
            .get(&name.trim().to_lowercase())
            .map(|&idx| &self.diseases[idx])
    }

    pub fn disease_by_id(&self, id: u32) -> Option<&Disease> {
        self.diseases.iter().find(|d| d.id == Some(id))
    }

    /// Diseases affecting a crop, including the mixed-vegetable bucket
    pub fn diseases_for_crop(&self, crop: &str) -> Vec<&Disease> {
        self.diseases
            .iter()
            .filter(|d| d.affects_exactly(crop) || d.affects_mixed_vegetables())
            .collect()
    }

    /// Crop names the AI adapter may recommend, in catalog order
    pub fn approved_crop_names(&self) -> Vec<&str> {
        self.crops.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether a symptom query may name this crop
    pub fn is_known_crop(&self, name: &str) -> bool {
        self.known_crops.contains(&name.trim().to_lowercase())
    }
}
