//! Root-cause classification for products with zero form coverage
//!
//! Each defective ingredient gets one reason; the product takes the
//! highest-precedence reason among its active ingredients:
//!
//! `ingredient_id_missing` > `unit_missing` > `unit_mismatch` >
//! `missingVerified` > `mismatch`
//!
//! Structural defects (identity, unit) outrank taxonomy gaps so they are
//! never hidden behind them.

use crate::forms::{check_unit, match_form, FormMatchOutcome, UnitCheck};
use crate::models::{ProductIngredient, ReferenceData, ScoredProduct};
use serde::Serialize;
use std::fmt;

/// Primary reason a product has no form-coverage evidence.
///
/// Variant order is precedence order (highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RootCause {
    #[serde(rename = "ingredient_id_missing")]
    IngredientIdMissing,
    #[serde(rename = "unit_missing")]
    UnitMissing,
    #[serde(rename = "unit_mismatch")]
    UnitMismatch,
    #[serde(rename = "missingVerified")]
    MissingVerified,
    #[serde(rename = "mismatch")]
    Mismatch,
    #[serde(rename = "no_active_ingredients")]
    NoActiveIngredients,
}

impl RootCause {
    pub const ALL: [RootCause; 6] = [
        RootCause::IngredientIdMissing,
        RootCause::UnitMissing,
        RootCause::UnitMismatch,
        RootCause::MissingVerified,
        RootCause::Mismatch,
        RootCause::NoActiveIngredients,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RootCause::IngredientIdMissing => "ingredient_id_missing",
            RootCause::UnitMissing => "unit_missing",
            RootCause::UnitMismatch => "unit_mismatch",
            RootCause::MissingVerified => "missingVerified",
            RootCause::Mismatch => "mismatch",
            RootCause::NoActiveIngredients => "no_active_ingredients",
        }
    }
}

impl fmt::Display for RootCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subtype of a `mismatch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Raw form text empty or blank
    FormRawMissing,
    /// Raw form present but no verified form or alias matches it
    TaxonomyMismatch,
}

impl MismatchKind {
    pub const ALL: [MismatchKind; 2] = [MismatchKind::FormRawMissing, MismatchKind::TaxonomyMismatch];

    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::FormRawMissing => "form_raw_missing",
            MismatchKind::TaxonomyMismatch => "taxonomy_mismatch",
        }
    }
}

/// One ingredient-level defect
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientFinding<'a> {
    pub ingredient: &'a ProductIngredient,
    pub reason: RootCause,
    pub mismatch: Option<MismatchKind>,
}

/// Classify one ingredient; `None` when it would count as matched
pub fn classify_ingredient<'a>(
    ingredient: &'a ProductIngredient,
    reference: &ReferenceData,
) -> Option<IngredientFinding<'a>> {
    let finding = |reason, mismatch| {
        Some(IngredientFinding {
            ingredient,
            reason,
            mismatch,
        })
    };

    let Some(id) = ingredient.ingredient_id else {
        return finding(RootCause::IngredientIdMissing, None);
    };

    match check_unit(ingredient, reference.meta(id)) {
        UnitCheck::Missing => return finding(RootCause::UnitMissing, None),
        UnitCheck::Mismatch => return finding(RootCause::UnitMismatch, None),
        UnitCheck::Ok => {}
    }

    if reference.verified_forms_for(id).next().is_none() {
        return finding(RootCause::MissingVerified, None);
    }

    let Some(raw) = ingredient.form_raw_trimmed() else {
        return finding(RootCause::Mismatch, Some(MismatchKind::FormRawMissing));
    };

    match match_form(raw, id, reference.forms_for(id), reference.aliases()) {
        FormMatchOutcome::Matched { .. } => None,
        FormMatchOutcome::MissingVerifiedForms => finding(RootCause::MissingVerified, None),
        FormMatchOutcome::NoMatch => {
            finding(RootCause::Mismatch, Some(MismatchKind::TaxonomyMismatch))
        }
    }
}

/// Classification of one product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductClassification<'a> {
    pub product: &'a ScoredProduct,
    /// `None` when every active ingredient now matches
    pub reason: Option<RootCause>,
    pub findings: Vec<IngredientFinding<'a>>,
}

impl<'a> ProductClassification<'a> {
    /// Findings carrying the product's primary reason
    pub fn primary_findings(&self) -> impl Iterator<Item = &IngredientFinding<'a>> + '_ {
        let reason = self.reason;
        self.findings.iter().filter(move |f| Some(f.reason) == reason)
    }
}

/// Classify a product by strict precedence over its active ingredients
pub fn classify_product<'a>(
    product: &'a ScoredProduct,
    reference: &ReferenceData,
) -> ProductClassification<'a> {
    let active: Vec<&ProductIngredient> = product.active_ingredients().collect();
    if active.is_empty() {
        return ProductClassification {
            product,
            reason: Some(RootCause::NoActiveIngredients),
            findings: Vec::new(),
        };
    }

    let findings: Vec<IngredientFinding<'a>> = active
        .into_iter()
        .filter_map(|ingredient| classify_ingredient(ingredient, reference))
        .collect();
    let reason = findings.iter().map(|f| f.reason).min();

    ProductClassification {
        product,
        reason,
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditStatus, IngredientForm, IngredientMeta};

    fn reference() -> ReferenceData {
        ReferenceData::new(
            vec![IngredientForm {
                ingredient_id: 1,
                form_key: "citrate".into(),
                form_label: "Citrate".into(),
                audit_status: AuditStatus::Verified,
            }],
            vec![],
            vec![
                IngredientMeta {
                    ingredient_id: 1,
                    name: "Magnesium".into(),
                    unit: Some("mg".into()),
                    rda_adult: None,
                    ul_adult: None,
                },
                IngredientMeta {
                    ingredient_id: 2,
                    name: "Ashwagandha".into(),
                    unit: Some("mg".into()),
                    rda_adult: None,
                    ul_adult: None,
                },
            ],
        )
    }

    fn ingredient(id: Option<i64>, form: Option<&str>, unit: Option<&str>) -> ProductIngredient {
        ProductIngredient {
            ingredient_id: id,
            name: "x".into(),
            form_raw: form.map(Into::into),
            amount: Some(100.0),
            unit: unit.map(Into::into),
            is_active: true,
        }
    }

    fn product(ingredients: Vec<ProductIngredient>) -> ScoredProduct {
        ScoredProduct {
            product_id: 10,
            name: Some("Test".into()),
            form_coverage: 0.0,
            ingredients,
        }
    }

    #[test]
    fn test_ingredient_reasons() {
        let data = reference();
        let reason = |i: ProductIngredient| {
            classify_ingredient(&i, &data).map(|f| (f.reason, f.mismatch))
        };

        assert_eq!(
            reason(ingredient(None, Some("oxide"), Some("mg"))),
            Some((RootCause::IngredientIdMissing, None))
        );
        assert_eq!(
            reason(ingredient(Some(1), Some("oxide"), None)),
            Some((RootCause::UnitMissing, None))
        );
        assert_eq!(
            reason(ingredient(Some(1), Some("oxide"), Some("IU"))),
            Some((RootCause::UnitMismatch, None))
        );
        assert_eq!(
            reason(ingredient(Some(2), Some("root"), Some("mg"))),
            Some((RootCause::MissingVerified, None))
        );
        assert_eq!(
            reason(ingredient(Some(1), Some("  "), Some("mg"))),
            Some((RootCause::Mismatch, Some(MismatchKind::FormRawMissing)))
        );
        assert_eq!(
            reason(ingredient(Some(1), Some("oxide"), Some("mg"))),
            Some((RootCause::Mismatch, Some(MismatchKind::TaxonomyMismatch)))
        );
        assert_eq!(reason(ingredient(Some(1), Some("citrate"), Some("mg"))), None);
    }

    #[test]
    fn test_missing_id_outranks_mismatch() {
        let data = reference();
        let p = product(vec![
            ingredient(Some(1), Some("oxide"), Some("mg")),
            ingredient(None, Some("oxide"), Some("mg")),
        ]);
        let classification = classify_product(&p, &data);

        assert_eq!(classification.reason, Some(RootCause::IngredientIdMissing));
        assert_eq!(classification.findings.len(), 2);
        assert_eq!(classification.primary_findings().count(), 1);
    }

    #[test]
    fn test_unit_outranks_missing_verified() {
        let data = reference();
        let p = product(vec![
            ingredient(Some(2), Some("root"), Some("mg")),
            ingredient(Some(1), Some("citrate"), Some("IU")),
        ]);

        assert_eq!(classify_product(&p, &data).reason, Some(RootCause::UnitMismatch));
    }

    #[test]
    fn test_no_active_ingredients() {
        let mut inactive = ingredient(None, None, None);
        inactive.is_active = false;
        let p = product(vec![inactive]);

        assert_eq!(
            classify_product(&p, &reference()).reason,
            Some(RootCause::NoActiveIngredients)
        );
    }

    #[test]
    fn test_all_matching_is_unclassified() {
        let p = product(vec![ingredient(Some(1), Some("Magnesium Citrate"), Some("mg"))]);
        let classification = classify_product(&p, &reference());

        assert_eq!(classification.reason, None);
        assert!(classification.findings.is_empty());
    }

    #[test]
    fn test_reason_names() {
        let names: Vec<&str> = RootCause::ALL.iter().map(RootCause::as_str).collect();
        assert_eq!(
            names,
            vec![
                "ingredient_id_missing",
                "unit_missing",
                "unit_mismatch",
                "missingVerified",
                "mismatch",
                "no_active_ingredients"
            ]
        );
        assert_eq!(
            serde_json::to_string(&RootCause::MissingVerified).unwrap(),
            "\"missingVerified\""
        );
    }
}
