//! Tier and Vocabulary Enumerations
//!
//! Every qualitative attribute in the catalogs and queries (season, soil, water tier,
//! ratings, sensitivity, severity, weather, symptom tags, goals) is a small closed set.
//! Parsing is case-insensitive and tolerant of spaces/hyphens, so `"Low Risk"`,
//! `"low-risk"` and `"low_risk"` all resolve to the same variant. Anything outside
//! the vocabulary is rejected at deserialization time instead of silently never matching.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// A value that is not part of a closed vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {vocabulary} '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    pub vocabulary: &'static str,
    pub value: String,
    pub expected: String,
}

/// Normalize a raw token: trim, lowercase, spaces and hyphens become underscores
fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $canonical:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical wire name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $canonical),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let key = normalize_key(raw);
                $(
                    if key == $canonical $(|| key == $alias)* {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownVariant {
                    vocabulary: stringify!($name),
                    value: raw.to_string(),
                    expected: [$($canonical),+].join(", "),
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

vocabulary! {
    /// Indian cropping seasons
    ///
    /// `All` only appears in catalog records (a crop or disease indifferent to season);
    /// a query season must be concrete.
    pub enum Season {
        /// Monsoon season (June–October)
        Kharif => "kharif" | "monsoon",
        /// Winter season (October–March)
        Rabi => "rabi" | "winter",
        /// Summer / zaid season (March–June)
        Summer => "summer" | "zaid",
        All => "all",
    }
}

vocabulary! {
    /// Soil types found across Kerala's agro-climatic zones
    pub enum SoilType {
        Laterite => "laterite",
        Alluvial => "alluvial",
        Clay => "clay",
        Loamy => "loamy" | "loam",
        Sandy => "sandy" | "sand",
        Red => "red",
        Black => "black",
        Forest => "forest",
        All => "all" | "any",
    }
}

vocabulary! {
    /// Water requirement of a crop, or water availability of a farm
    pub enum WaterTier {
        Low => "low" | "limited",
        Moderate => "moderate" | "medium" | "rainfed",
        High => "high" | "abundant" | "irrigated",
    }
}

vocabulary! {
    /// Categorical catalog rating (Kerala suitability, demand, profitability, sustainability)
    pub enum Rating {
        Low => "low",
        Moderate => "moderate" | "medium",
        High => "high",
    }
}

vocabulary! {
    /// Sensitivity of a crop to climate variability
    pub enum Sensitivity {
        Low => "low",
        Medium => "medium" | "moderate",
        High => "high",
    }
}

vocabulary! {
    /// Disease severity
    pub enum Severity {
        Low => "low",
        Medium => "medium" | "moderate",
        High => "high",
    }
}

vocabulary! {
    /// Prevailing weather reported with a symptom query
    pub enum Weather {
        Humid => "humid",
        Rainy => "rainy" | "rain" | "wet",
        Dry => "dry",
        Hot => "hot",
        Cool => "cool" | "cold",
    }
}

vocabulary! {
    /// Observable symptom tags
    pub enum Symptom {
        LeafSpots => "leaf_spots",
        Wilting => "wilting",
        Discoloration => "discoloration" | "yellowing",
        StuntedGrowth => "stunted_growth",
        RootDamage => "root_damage",
        FruitDamage => "fruit_damage",
        Rot => "rot" | "mold",
    }
}

vocabulary! {
    /// Farmer's primary goal
    pub enum Goal {
        Profit => "profit" | "maximum_profit",
        Yield => "yield" | "maximum_yield",
        Sustainability => "sustainability",
        LowRisk => "low_risk" | "risk",
        QuickHarvest => "quick_harvest",
    }
}

vocabulary! {
    /// Coarse budget bracket when the farmer does not give an amount
    pub enum BudgetTier {
        Low => "low",
        Moderate => "moderate" | "mid" | "medium",
        High => "high",
    }
}

impl Season {
    /// Whether `self` is covered by a catalog season set (membership or "all")
    pub fn covered_by(self, set: &[Season]) -> bool {
        set.iter().any(|s| *s == self || *s == Season::All)
    }

    /// Friendly name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Season::Kharif => "Kharif",
            Season::Rabi => "Rabi",
            Season::Summer => "Summer",
            Season::All => "any",
        }
    }
}

impl SoilType {
    /// Whether `self` is covered by a catalog soil set (membership or "all")
    pub fn covered_by(self, set: &[SoilType]) -> bool {
        set.iter().any(|s| *s == self || *s == SoilType::All)
    }
}

impl Rating {
    pub fn display_text(&self) -> &'static str {
        match self {
            Rating::Low => "Low",
            Rating::Moderate => "Moderate",
            Rating::High => "High",
        }
    }
}

impl Symptom {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Symptom::LeafSpots => "Leaf spots",
            Symptom::Wilting => "Wilting",
            Symptom::Discoloration => "Yellowing/browning",
            Symptom::StuntedGrowth => "Stunted growth",
            Symptom::RootDamage => "Root damage",
            Symptom::FruitDamage => "Fruit/flower damage",
            Symptom::Rot => "Rot or fungal growth",
        }
    }
}

impl BudgetTier {
    /// Representative amount (₹) used for affordability
    pub fn representative_amount(&self) -> f64 {
        match self {
            BudgetTier::Low => 25_000.0,
            BudgetTier::Moderate => 60_000.0,
            BudgetTier::High => 150_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_and_separator_insensitive() {
        assert_eq!("Low Risk".parse::<Goal>().unwrap(), Goal::LowRisk);
        assert_eq!("quick-harvest".parse::<Goal>().unwrap(), Goal::QuickHarvest);
        assert_eq!(" KHARIF ".parse::<Season>().unwrap(), Season::Kharif);
    }

    #[test]
    fn test_aliases_resolve() {
        assert_eq!("medium".parse::<WaterTier>().unwrap(), WaterTier::Moderate);
        assert_eq!("moderate".parse::<Severity>().unwrap(), Severity::Medium);
        assert_eq!("irrigated".parse::<WaterTier>().unwrap(), WaterTier::High);
        assert_eq!("any".parse::<SoilType>().unwrap(), SoilType::All);
        assert_eq!(SoilType::All.to_string(), "all");
    }

    #[test]
    fn test_unknown_value_rejected() {
        let err = "monsoonish".parse::<Season>().unwrap_err();
        assert_eq!(err.vocabulary, "Season");
        assert!(err.to_string().contains("kharif"));
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&Symptom::LeafSpots).unwrap();
        assert_eq!(json, "\"leaf_spots\"");

        let parsed: Vec<Symptom> = serde_json::from_str(r#"["Wilting", "root damage"]"#).unwrap();
        assert_eq!(parsed, vec![Symptom::Wilting, Symptom::RootDamage]);

        assert!(serde_json::from_str::<Weather>("\"foggy\"").is_err());
    }

    #[test]
    fn test_covered_by_respects_wildcard() {
        assert!(Season::Rabi.covered_by(&[Season::All]));
        assert!(Season::Kharif.covered_by(&[Season::Rabi, Season::Kharif]));
        assert!(!Season::Summer.covered_by(&[Season::Kharif]));
        assert!(SoilType::Clay.covered_by(&[SoilType::All]));
        assert!(!SoilType::Sandy.covered_by(&[SoilType::Laterite]));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }
}
