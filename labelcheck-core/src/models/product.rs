//! Product ingredient rows as persisted by the scoring pipeline

use serde::{Deserialize, Serialize};

/// One declared ingredient of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIngredient {
    pub ingredient_id: Option<i64>,
    pub name: String,
    /// Raw form text from the regulatory dataset
    #[serde(default)]
    pub form_raw: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ProductIngredient {
    /// Raw form text with surrounding whitespace removed; `None` when blank
    pub fn form_raw_trimmed(&self) -> Option<&str> {
        self.form_raw
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Unit with whitespace removed; `None` when blank
    pub fn unit_trimmed(&self) -> Option<&str> {
        self.unit.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// A product with its persisted form-coverage evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredProduct {
    pub product_id: i64,
    pub name: Option<String>,
    pub form_coverage: f64,
    pub ingredients: Vec<ProductIngredient>,
}

impl ScoredProduct {
    pub fn active_ingredients(&self) -> impl Iterator<Item = &ProductIngredient> {
        self.ingredients.iter().filter(|i| i.is_active)
    }

    /// Products whose form-coverage evidence came out zero
    pub fn has_zero_coverage(&self) -> bool {
        self.form_coverage <= 0.0
    }
}
