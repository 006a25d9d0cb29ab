//! Form coverage evidence
//!
//! Share of a product's active ingredients whose declared form matches a
//! verified taxonomy entry. An ingredient counts toward the denominator
//! once it has an ingredient id; it counts as matched only when its unit is
//! usable and its form matches.

use super::matcher::{match_form, FormMatchOutcome};
use crate::models::{IngredientMeta, ProductIngredient, ReferenceData};
use labelcheck_common::units::{is_recognized_unit, normalize_unit, units_compatible};
use serde::Serialize;
use tracing::debug;

/// Usability of an ingredient's declared unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCheck {
    Ok,
    Missing,
    /// Present but not convertible to the ingredient's canonical unit
    Mismatch,
}

/// Check a declared unit against the ingredient's canonical unit.
///
/// Without a canonical unit on file any recognized label unit is accepted.
pub fn check_unit(ingredient: &ProductIngredient, meta: Option<&IngredientMeta>) -> UnitCheck {
    let Some(unit) = ingredient.unit_trimmed().and_then(normalize_unit) else {
        return UnitCheck::Missing;
    };

    let canonical = meta
        .and_then(|m| m.unit.as_deref())
        .filter(|u| !u.trim().is_empty());
    let usable = match canonical {
        Some(canonical) => units_compatible(&unit, canonical),
        None => is_recognized_unit(&unit),
    };

    if usable {
        UnitCheck::Ok
    } else {
        UnitCheck::Mismatch
    }
}

/// Per-ingredient coverage decision
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoverageStatus {
    /// No ingredient id; outside the denominator
    Unidentified,
    UnitMissing,
    UnitMismatch,
    FormRawMissing,
    Evaluated { outcome: FormMatchOutcome },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageDetail {
    pub name: String,
    pub ingredient_id: Option<i64>,
    #[serde(flatten)]
    pub status: CoverageStatus,
}

impl CoverageDetail {
    pub fn is_matched(&self) -> bool {
        matches!(&self.status, CoverageStatus::Evaluated { outcome } if outcome.is_match())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormCoverage {
    pub evaluated: usize,
    pub matched: usize,
    /// `matched / evaluated`, 0 when nothing was evaluated
    pub ratio: f64,
    pub details: Vec<CoverageDetail>,
}

fn coverage_status(ingredient: &ProductIngredient, reference: &ReferenceData) -> CoverageStatus {
    let Some(id) = ingredient.ingredient_id else {
        return CoverageStatus::Unidentified;
    };

    match check_unit(ingredient, reference.meta(id)) {
        UnitCheck::Missing => return CoverageStatus::UnitMissing,
        UnitCheck::Mismatch => return CoverageStatus::UnitMismatch,
        UnitCheck::Ok => {}
    }

    let Some(raw) = ingredient.form_raw_trimmed() else {
        return if reference.verified_forms_for(id).next().is_none() {
            CoverageStatus::Evaluated {
                outcome: FormMatchOutcome::MissingVerifiedForms,
            }
        } else {
            CoverageStatus::FormRawMissing
        };
    };

    CoverageStatus::Evaluated {
        outcome: match_form(raw, id, reference.forms_for(id), reference.aliases()),
    }
}

/// Evaluate form coverage over the active ingredients
pub fn evaluate_form_coverage<'a, I>(ingredients: I, reference: &ReferenceData) -> FormCoverage
where
    I: IntoIterator<Item = &'a ProductIngredient>,
{
    let details: Vec<CoverageDetail> = ingredients
        .into_iter()
        .filter(|i| i.is_active)
        .map(|ingredient| {
            let status = coverage_status(ingredient, reference);
            debug!(
                ingredient = %ingredient.name,
                ingredient_id = ?ingredient.ingredient_id,
                status = ?status,
                "Form coverage decision"
            );
            CoverageDetail {
                name: ingredient.name.clone(),
                ingredient_id: ingredient.ingredient_id,
                status,
            }
        })
        .collect();

    let evaluated = details
        .iter()
        .filter(|d| d.status != CoverageStatus::Unidentified)
        .count();
    let matched = details.iter().filter(|d| d.is_matched()).count();
    let ratio = if evaluated == 0 {
        0.0
    } else {
        matched as f64 / evaluated as f64
    };

    FormCoverage {
        evaluated,
        matched,
        ratio,
        details,
    }
}
