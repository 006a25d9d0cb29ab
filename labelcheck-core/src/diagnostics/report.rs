//! Aggregation of product classifications into a curation report

use super::classifier::{classify_product, IngredientFinding, MismatchKind, RootCause};
use crate::forms::normalize_match_text;
use crate::models::{ReferenceData, ScoredProduct};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Bounds on the report's lists
#[derive(Debug, Clone, Copy)]
pub struct ReportLimits {
    pub top_n: usize,
    pub max_examples: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            top_n: 20,
            max_examples: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientTally {
    pub ingredient_id: Option<i64>,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductTally {
    pub product_id: i64,
    pub name: Option<String>,
    /// Active ingredients carrying the product's primary reason
    pub defective_ingredients: usize,
    pub active_ingredients: usize,
}

/// One row for manual curation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportExample {
    pub product_id: i64,
    pub product_name: Option<String>,
    pub ingredient_id: Option<i64>,
    pub ingredient_name: String,
    pub form_raw: Option<String>,
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<MismatchKind>,
    /// Closest verified form key (taxonomy mismatches only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_form_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_similarity: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RootCauseReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub sampled_products: usize,
    pub zero_coverage_products: usize,
    /// Zero-coverage products whose ingredients all match today
    pub unclassified_products: usize,
    pub reason_counts: BTreeMap<&'static str, usize>,
    /// Share of zero-coverage products per reason
    pub reason_ratios: BTreeMap<&'static str, f64>,
    pub mismatch_counts: BTreeMap<&'static str, usize>,
    /// Most frequent ingredients per mismatch subtype
    pub top_ingredients: BTreeMap<&'static str, Vec<IngredientTally>>,
    /// Products with the most defective ingredients, per reason
    pub top_products: BTreeMap<&'static str, Vec<ProductTally>>,
    pub examples: BTreeMap<&'static str, Vec<ReportExample>>,
}

/// Closest verified form key to a raw form by Jaro-Winkler similarity
pub fn nearest_form_key(
    raw: &str,
    ingredient_id: i64,
    reference: &ReferenceData,
) -> Option<(String, f64)> {
    let candidate = normalize_match_text(raw);
    if candidate.is_empty() {
        return None;
    }

    reference
        .verified_forms_for(ingredient_id)
        .map(|form| {
            let score = strsim::jaro_winkler(&candidate, &normalize_match_text(&form.form_key));
            (form.form_key.clone(), score)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

fn example(
    product: &ScoredProduct,
    finding: &IngredientFinding<'_>,
    reference: &ReferenceData,
) -> ReportExample {
    let ingredient = finding.ingredient;
    let nearest = match (finding.mismatch, ingredient.ingredient_id, ingredient.form_raw_trimmed()) {
        (Some(MismatchKind::TaxonomyMismatch), Some(id), Some(raw)) => {
            nearest_form_key(raw, id, reference)
        }
        _ => None,
    };

    ReportExample {
        product_id: product.product_id,
        product_name: product.name.clone(),
        ingredient_id: ingredient.ingredient_id,
        ingredient_name: ingredient.name.clone(),
        form_raw: ingredient.form_raw.clone(),
        unit: ingredient.unit.clone(),
        mismatch: finding.mismatch,
        nearest_similarity: nearest.as_ref().map(|(_, score)| *score),
        nearest_form_key: nearest.map(|(key, _)| key),
    }
}

/// Sort descending by count, then by name, and keep `n`
fn top_n<T, K: Ord>(mut items: Vec<T>, n: usize, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(key);
    items.truncate(n);
    items
}

/// Classify the zero-coverage products among `sampled` and aggregate.
///
/// Source data is only read.
pub fn build_report(
    sampled: &[ScoredProduct],
    reference: &ReferenceData,
    limits: ReportLimits,
) -> RootCauseReport {
    let zero: Vec<&ScoredProduct> = sampled.iter().filter(|p| p.has_zero_coverage()).collect();

    let mut reason_counts: BTreeMap<&'static str, usize> =
        RootCause::ALL.iter().map(|r| (r.as_str(), 0)).collect();
    let mut mismatch_counts: BTreeMap<&'static str, usize> =
        MismatchKind::ALL.iter().map(|m| (m.as_str(), 0)).collect();
    let mut ingredient_tallies: HashMap<(MismatchKind, Option<i64>, String), usize> = HashMap::new();
    let mut product_tallies: BTreeMap<&'static str, Vec<ProductTally>> = BTreeMap::new();
    let mut examples: BTreeMap<&'static str, Vec<ReportExample>> = BTreeMap::new();
    let mut unclassified = 0;

    for product in &zero {
        let classification = classify_product(product, reference);
        let Some(reason) = classification.reason else {
            unclassified += 1;
            continue;
        };
        *reason_counts.entry(reason.as_str()).or_default() += 1;

        let primary: Vec<&IngredientFinding<'_>> = classification.primary_findings().collect();

        if reason == RootCause::Mismatch {
            for finding in &primary {
                let Some(kind) = finding.mismatch else { continue };
                *mismatch_counts.entry(kind.as_str()).or_default() += 1;
                let key = (
                    kind,
                    finding.ingredient.ingredient_id,
                    finding.ingredient.name.trim().to_string(),
                );
                *ingredient_tallies.entry(key).or_default() += 1;
            }
        }

        product_tallies.entry(reason.as_str()).or_default().push(ProductTally {
            product_id: product.product_id,
            name: product.name.clone(),
            defective_ingredients: primary.len(),
            active_ingredients: product.active_ingredients().count(),
        });

        let bucket = examples.entry(reason.as_str()).or_default();
        for finding in &primary {
            if bucket.len() >= limits.max_examples {
                break;
            }
            bucket.push(example(product, finding, reference));
        }
        if reason == RootCause::NoActiveIngredients && bucket.len() < limits.max_examples {
            bucket.push(ReportExample {
                product_id: product.product_id,
                product_name: product.name.clone(),
                ingredient_id: None,
                ingredient_name: String::new(),
                form_raw: None,
                unit: None,
                mismatch: None,
                nearest_form_key: None,
                nearest_similarity: None,
            });
        }
    }

    let zero_count = zero.len();
    let reason_ratios = reason_counts
        .iter()
        .map(|(reason, count)| {
            let ratio = if zero_count == 0 {
                0.0
            } else {
                *count as f64 / zero_count as f64
            };
            (*reason, ratio)
        })
        .collect();

    let mut top_ingredients: BTreeMap<&'static str, Vec<IngredientTally>> = BTreeMap::new();
    for kind in MismatchKind::ALL {
        let tallies: Vec<IngredientTally> = ingredient_tallies
            .iter()
            .filter(|((k, _, _), _)| *k == kind)
            .map(|((_, id, name), count)| IngredientTally {
                ingredient_id: *id,
                name: name.clone(),
                count: *count,
            })
            .collect();
        let ranked = top_n(tallies, limits.top_n, |t| {
            (std::cmp::Reverse(t.count), t.name.clone(), t.ingredient_id)
        });
        top_ingredients.insert(kind.as_str(), ranked);
    }

    let top_products = product_tallies
        .into_iter()
        .map(|(reason, tallies)| {
            let ranked = top_n(tallies, limits.top_n, |t| {
                (std::cmp::Reverse(t.defective_ingredients), t.product_id)
            });
            (reason, ranked)
        })
        .collect();

    tracing::info!(
        sampled = sampled.len(),
        zero_coverage = zero_count,
        unclassified,
        "Root-cause classification complete"
    );

    RootCauseReport {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        sampled_products: sampled.len(),
        zero_coverage_products: zero_count,
        unclassified_products: unclassified,
        reason_counts,
        reason_ratios,
        mismatch_counts,
        top_ingredients,
        top_products,
        examples,
    }
}
