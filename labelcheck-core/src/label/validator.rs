//! Extraction Validator & Confidence Scorer
//!
//! Sanity-checks parsed ingredients and folds every finding into one
//! confidence value.
//!
//! **Confidence composition (order matters):**
//! 1. Start at 1.0
//! 2. Coverage below 0.70 costs `(0.70 − coverage) × 0.5`
//! 3. Each issue costs its severity weight
//! 4. With ingredients present: `score × 0.7 + mean ingredient confidence × 0.3`
//! 5. Clamp to [0, 1]

use crate::models::{IssueKind, ParsedIngredient, ValidationIssue};
use labelcheck_common::units::is_recognized_unit;

/// Coverage below this is penalized and reported
pub const MIN_COVERAGE: f64 = 0.70;

/// Confidence below this requires manual confirmation
pub const CONFIRMATION_THRESHOLD: f64 = 0.70;

const COVERAGE_PENALTY_FACTOR: f64 = 0.5;
const SCORE_BLEND_WEIGHT: f64 = 0.7;
const INGREDIENT_BLEND_WEIGHT: f64 = 0.3;

/// Per-serving ceiling beyond which an amount is treated as a misread
struct AmountCeiling {
    name: &'static str,
    max_amount: f64,
    unit: &'static str,
}

const HIGH_RISK_CEILINGS: &[AmountCeiling] = &[
    AmountCeiling { name: "vitamin d", max_amount: 1_250.0, unit: "mcg" },
    AmountCeiling { name: "vitamin d", max_amount: 50_000.0, unit: "IU" },
    AmountCeiling { name: "vitamin a", max_amount: 3_000.0, unit: "mcg" },
    AmountCeiling { name: "vitamin a", max_amount: 10_000.0, unit: "IU" },
    AmountCeiling { name: "vitamin c", max_amount: 5_000.0, unit: "mg" },
    AmountCeiling { name: "iron", max_amount: 100.0, unit: "mg" },
    AmountCeiling { name: "calcium", max_amount: 2_500.0, unit: "mg" },
    AmountCeiling { name: "zinc", max_amount: 100.0, unit: "mg" },
];

/// Per-ingredient checks: unit legality and known-ingredient amount ceilings
pub fn validate_ingredient(ingredient: &ParsedIngredient) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if let Some(unit) = ingredient.unit.as_deref() {
        if !is_recognized_unit(unit) {
            issues.push(ValidationIssue::new(
                IssueKind::UnitInvalid,
                format!("{}: unrecognized unit '{}'", ingredient.name, unit),
            ));
        }
    }

    if let (Some(amount), Some(unit)) = (ingredient.amount, ingredient.unit.as_deref()) {
        let name = ingredient.name.to_lowercase();
        let breached = HIGH_RISK_CEILINGS.iter().find(|c| {
            name.contains(c.name) && c.unit.eq_ignore_ascii_case(unit) && amount > c.max_amount
        });
        if let Some(ceiling) = breached {
            issues.push(ValidationIssue::new(
                IssueKind::ValueAnomaly,
                format!(
                    "{}: {} {} exceeds plausible maximum of {} {}",
                    ingredient.name, amount, unit, ceiling.max_amount, ceiling.unit
                ),
            ));
        }
    }

    issues
}

/// Run every check and append the findings to `issues`
pub fn validate(
    ingredients: &[ParsedIngredient],
    parse_coverage: f64,
    serving_size: Option<&str>,
    issues: &mut Vec<ValidationIssue>,
) {
    for ingredient in ingredients {
        issues.extend(validate_ingredient(ingredient));
    }

    if parse_coverage < MIN_COVERAGE {
        issues.push(ValidationIssue::new(
            IssueKind::LowCoverage,
            format!(
                "Only {:.0}% of ingredient rows yielded an amount and unit",
                parse_coverage * 100.0
            ),
        ));
    }

    if serving_size.is_none() {
        issues.push(ValidationIssue::new(
            IssueKind::MissingServingSize,
            "Serving size was not detected",
        ));
    }
}

/// Step 2: coverage shortfall penalty
pub fn apply_coverage_penalty(score: f64, parse_coverage: f64) -> f64 {
    if parse_coverage < MIN_COVERAGE {
        score - (MIN_COVERAGE - parse_coverage) * COVERAGE_PENALTY_FACTOR
    } else {
        score
    }
}

/// Step 3: one fixed penalty per issue
pub fn apply_issue_penalties(score: f64, issues: &[ValidationIssue]) -> f64 {
    issues
        .iter()
        .fold(score, |acc, issue| acc - issue.kind.severity_weight())
}

/// Step 4: blend with the mean ingredient confidence
pub fn blend_ingredient_confidence(score: f64, ingredients: &[ParsedIngredient]) -> f64 {
    if ingredients.is_empty() {
        return score;
    }
    let mean = ingredients.iter().map(|i| i.confidence).sum::<f64>() / ingredients.len() as f64;
    score * SCORE_BLEND_WEIGHT + mean * INGREDIENT_BLEND_WEIGHT
}

/// Compose the final confidence score
pub fn compute_confidence(
    parse_coverage: f64,
    issues: &[ValidationIssue],
    ingredients: &[ParsedIngredient],
) -> f64 {
    let score = 1.0;
    let score = apply_coverage_penalty(score, parse_coverage);
    let score = apply_issue_penalties(score, issues);
    let score = blend_ingredient_confidence(score, ingredients);
    score.clamp(0.0, 1.0)
}

/// Manual-confirmation policy.
///
/// Broader than the scoring penalties: any serving-size, unit or value finding
/// forces review even when the blended score stays high.
pub fn needs_confirmation(
    confidence_score: f64,
    parse_coverage: f64,
    issues: &[ValidationIssue],
) -> bool {
    confidence_score < CONFIRMATION_THRESHOLD
        || parse_coverage < MIN_COVERAGE
        || issues.iter().any(|i| i.kind.forces_confirmation())
}
