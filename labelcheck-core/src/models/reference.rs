//! Ingredient taxonomy reference rows (read-only for this crate)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Curation state of a taxonomy form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Verified,
    Pending,
    Rejected,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Verified => "verified",
            AuditStatus::Pending => "pending",
            AuditStatus::Rejected => "rejected",
        }
    }

    /// Parse a stored status; unknown values are treated as pending
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "verified" => AuditStatus::Verified,
            "rejected" => AuditStatus::Rejected,
            _ => AuditStatus::Pending,
        }
    }
}

/// Delivery form of an ingredient (e.g. magnesium `citrate`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientForm {
    pub ingredient_id: i64,
    pub form_key: String,
    pub form_label: String,
    pub audit_status: AuditStatus,
}

impl IngredientForm {
    pub fn is_verified(&self) -> bool {
        self.audit_status == AuditStatus::Verified
    }
}

/// Alternate spelling of a form; `ingredient_id == None` means global
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAlias {
    pub alias_text: String,
    pub alias_norm: Option<String>,
    pub form_key: String,
    pub ingredient_id: Option<i64>,
}

impl FormAlias {
    /// True when the alias may be used for the given ingredient
    pub fn applies_to(&self, ingredient_id: i64) -> bool {
        self.ingredient_id.map_or(true, |id| id == ingredient_id)
    }
}

/// Dosage reference for an ingredient, in its canonical unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientMeta {
    pub ingredient_id: i64,
    pub name: String,
    pub unit: Option<String>,
    pub rda_adult: Option<f64>,
    pub ul_adult: Option<f64>,
}

/// Reference rows for a set of ingredients, indexed for lookup
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    forms: HashMap<i64, Vec<IngredientForm>>,
    aliases: Vec<FormAlias>,
    meta: HashMap<i64, IngredientMeta>,
}

impl ReferenceData {
    pub fn new(
        forms: Vec<IngredientForm>,
        aliases: Vec<FormAlias>,
        meta: Vec<IngredientMeta>,
    ) -> Self {
        let mut by_ingredient: HashMap<i64, Vec<IngredientForm>> = HashMap::new();
        for form in forms {
            by_ingredient.entry(form.ingredient_id).or_default().push(form);
        }
        Self {
            forms: by_ingredient,
            aliases,
            meta: meta.into_iter().map(|m| (m.ingredient_id, m)).collect(),
        }
    }

    /// All known forms of an ingredient, verified or not
    pub fn forms_for(&self, ingredient_id: i64) -> &[IngredientForm] {
        self.forms
            .get(&ingredient_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn verified_forms_for(&self, ingredient_id: i64) -> impl Iterator<Item = &IngredientForm> {
        self.forms_for(ingredient_id).iter().filter(|f| f.is_verified())
    }

    /// Global aliases plus every ingredient-scoped alias loaded
    pub fn aliases(&self) -> &[FormAlias] {
        &self.aliases
    }

    pub fn meta(&self, ingredient_id: i64) -> Option<&IngredientMeta> {
        self.meta.get(&ingredient_id)
    }
}
