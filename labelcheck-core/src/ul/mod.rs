//! UL Warning Calculator
//!
//! Flags ingredients whose per-day adult amount reaches the tolerable upper
//! intake level (UL). Per-day amount = parsed amount × daily multiplier,
//! expressed in the ingredient's canonical unit.
//!
//! **Tiers:**
//! - `high`: per-day amount exceeds the UL
//! - `moderate`: per-day amount is at least `moderate_fraction × UL`
//!
//! Ingredients with no UL on file are never flagged.

use crate::models::{ProductIngredient, ReferenceData};
use labelcheck_common::config::UlConfig;
use labelcheck_common::units::convert_amount;
use labelcheck_common::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Warning basis reported with every result
pub const UL_BASIS: &str = "per_day_adult";

/// How far a daily multiplier can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    /// Taken from the label's own directions
    High,
    /// Inferred from the data source's serving conventions
    Medium,
    /// Assumed; nothing on file
    Low,
}

/// Servings-per-day factor with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMultiplier {
    pub value: f64,
    pub source: String,
    pub reliability: Reliability,
}

impl DailyMultiplier {
    pub fn new(value: f64, source: impl Into<String>, reliability: Reliability) -> Self {
        Self {
            value,
            source: source.into(),
            reliability,
        }
    }

    /// One serving per day, used when nothing better is known
    pub fn single_serving() -> Self {
        Self::new(1.0, "assumed_single_serving", Reliability::Low)
    }

    fn is_usable(&self) -> bool {
        self.value.is_finite() && self.value > 0.0
    }
}

impl Default for DailyMultiplier {
    fn default() -> Self {
        Self::single_serving()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UlWarnings {
    pub high: Vec<String>,
    pub moderate: Vec<String>,
    pub basis: &'static str,
    pub daily_multiplier_used: f64,
    pub daily_multiplier_source: String,
    pub daily_multiplier_reliability: Reliability,
}

impl UlWarnings {
    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.moderate.is_empty()
    }
}

/// Tier of one ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UlTier {
    High,
    Moderate,
    Below,
}

/// Computes UL warnings with a configured moderate threshold
#[derive(Debug, Clone, Copy)]
pub struct UlCalculator {
    moderate_fraction: f64,
}

impl UlCalculator {
    /// Fraction must lie in (0, 1]
    pub fn new(moderate_fraction: f64) -> Result<Self> {
        if !(moderate_fraction > 0.0 && moderate_fraction <= 1.0) {
            return Err(Error::Config(format!(
                "ul.moderate_fraction must be in (0, 1], got {}",
                moderate_fraction
            )));
        }
        Ok(Self { moderate_fraction })
    }

    pub fn from_config(config: &UlConfig) -> Result<Self> {
        Self::new(config.require_moderate_fraction()?)
    }

    pub fn moderate_fraction(&self) -> f64 {
        self.moderate_fraction
    }

    pub fn classify(&self, per_day: f64, ul: f64) -> UlTier {
        if per_day > ul {
            UlTier::High
        } else if per_day >= ul * self.moderate_fraction {
            UlTier::Moderate
        } else {
            UlTier::Below
        }
    }

    /// Classify the active ingredients of one product
    pub fn compute<'a, I>(
        &self,
        ingredients: I,
        reference: &ReferenceData,
        multiplier: &DailyMultiplier,
    ) -> UlWarnings
    where
        I: IntoIterator<Item = &'a ProductIngredient>,
    {
        let used = if multiplier.is_usable() {
            multiplier.clone()
        } else {
            warn!(
                value = multiplier.value,
                source = %multiplier.source,
                "Unusable daily multiplier, assuming one serving per day"
            );
            DailyMultiplier::single_serving()
        };

        let mut high = Vec::new();
        let mut moderate = Vec::new();

        for ingredient in ingredients.into_iter().filter(|i| i.is_active) {
            let Some(meta) = ingredient.ingredient_id.and_then(|id| reference.meta(id)) else {
                continue;
            };
            let Some(ul) = meta.ul_adult.filter(|ul| *ul > 0.0) else {
                continue;
            };
            let (Some(amount), Some(unit)) = (ingredient.amount, ingredient.unit_trimmed()) else {
                continue;
            };
            let canonical_unit = meta.unit.as_deref().unwrap_or(unit);
            let Some(converted) = convert_amount(amount, unit, canonical_unit) else {
                debug!(
                    ingredient = %meta.name,
                    unit = unit,
                    canonical_unit = canonical_unit,
                    "Unit not convertible, skipping UL check"
                );
                continue;
            };

            let per_day = converted * used.value;
            let tier = self.classify(per_day, ul);
            debug!(ingredient = %meta.name, per_day, ul, tier = ?tier, "UL classification");

            let bucket = match tier {
                UlTier::High => &mut high,
                UlTier::Moderate => &mut moderate,
                UlTier::Below => continue,
            };
            if !bucket.contains(&meta.name) {
                bucket.push(meta.name.clone());
            }
        }

        UlWarnings {
            high,
            moderate,
            basis: UL_BASIS,
            daily_multiplier_used: used.value,
            daily_multiplier_source: used.source,
            daily_multiplier_reliability: used.reliability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IngredientMeta;

    fn meta(id: i64, name: &str, unit: &str, ul: Option<f64>) -> IngredientMeta {
        IngredientMeta {
            ingredient_id: id,
            name: name.to_string(),
            unit: Some(unit.to_string()),
            rda_adult: None,
            ul_adult: ul,
        }
    }

    fn row(id: i64, amount: f64, unit: &str) -> ProductIngredient {
        ProductIngredient {
            ingredient_id: Some(id),
            name: format!("ingredient {}", id),
            form_raw: None,
            amount: Some(amount),
            unit: Some(unit.to_string()),
            is_active: true,
        }
    }

    fn reference() -> ReferenceData {
        ReferenceData::new(
            vec![],
            vec![],
            vec![
                meta(1, "Vitamin D", "mcg", Some(100.0)),
                meta(2, "Zinc", "mg", Some(40.0)),
                meta(3, "Vitamin B12", "mcg", None),
                meta(4, "Magnesium", "mg", Some(350.0)),
            ],
        )
    }

    #[test]
    fn test_fraction_validation() {
        assert!(UlCalculator::new(0.8).is_ok());
        assert!(UlCalculator::new(1.0).is_ok());
        assert!(UlCalculator::new(0.0).is_err());
        assert!(UlCalculator::new(1.5).is_err());
        assert!(UlCalculator::new(f64::NAN).is_err());
    }

    #[test]
    fn test_from_config_requires_fraction() {
        let result = UlCalculator::from_config(&UlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_tiers_with_multiplier() {
        let calc = UlCalculator::new(0.75).unwrap();
        let rows = vec![
            row(1, 60.0, "mcg"),  // 120/day > 100
            row(2, 16.0, "mg"),   // 32/day >= 30
            row(3, 5000.0, "mcg"), // no UL
            row(4, 100.0, "mg"),  // 200/day < 262.5
        ];
        let multiplier = DailyMultiplier::new(2.0, "label_directions", Reliability::High);
        let warnings = calc.compute(&rows, &reference(), &multiplier);

        assert_eq!(warnings.high, vec!["Vitamin D"]);
        assert_eq!(warnings.moderate, vec!["Zinc"]);
        assert_eq!(warnings.basis, "per_day_adult");
        assert_eq!(warnings.daily_multiplier_used, 2.0);
        assert_eq!(warnings.daily_multiplier_source, "label_directions");
    }

    #[test]
    fn test_unit_conversion_before_comparison() {
        let calc = UlCalculator::new(0.9).unwrap();
        let rows = vec![row(2, 0.05, "g")]; // 50 mg
        let warnings = calc.compute(&rows, &reference(), &DailyMultiplier::default());

        assert_eq!(warnings.high, vec!["Zinc"]);
    }

    #[test]
    fn test_inconvertible_and_inactive_skipped() {
        let calc = UlCalculator::new(0.5).unwrap();
        let mut inactive = row(2, 100.0, "mg");
        inactive.is_active = false;
        let rows = vec![row(1, 4000.0, "IU"), inactive];
        let warnings = calc.compute(&rows, &reference(), &DailyMultiplier::default());

        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unusable_multiplier_falls_back() {
        let calc = UlCalculator::new(0.5).unwrap();
        let bad = DailyMultiplier::new(0.0, "broken", Reliability::Medium);
        let warnings = calc.compute(&[row(2, 45.0, "mg")], &reference(), &bad);

        assert_eq!(warnings.daily_multiplier_used, 1.0);
        assert_eq!(warnings.daily_multiplier_reliability, Reliability::Low);
        assert_eq!(warnings.high, vec!["Zinc"]);
    }

    #[test]
    fn test_ul_equal_is_moderate_not_high() {
        let calc = UlCalculator::new(0.8).unwrap();
        assert_eq!(calc.classify(40.0, 40.0), UlTier::Moderate);
        assert_eq!(calc.classify(40.1, 40.0), UlTier::High);
        assert_eq!(calc.classify(31.9, 40.0), UlTier::Below);
    }
}
