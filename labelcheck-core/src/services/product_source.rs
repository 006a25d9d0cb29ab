//! Scored products and their declared ingredients
//!
//! Reads the scoring pipeline's persisted `product_scores` and
//! `product_ingredients` tables. Sampling is deterministic for a given seed.

use super::batch::{push_id_list, BatchReader};
use crate::models::{ProductIngredient, ScoredProduct};
use labelcheck_common::config::ReferenceConfig;
use labelcheck_common::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sqlx::{QueryBuilder, SqlitePool};
use std::collections::HashMap;
use tracing::info;

type ScoreRow = (i64, Option<String>, Option<f64>);
type IngredientRow = (
    i64,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<String>,
    Option<bool>,
);

/// Product reads for offline diagnostics
#[derive(Clone)]
pub struct ProductSource {
    reader: BatchReader,
}

impl ProductSource {
    pub fn new(pool: SqlitePool, config: &ReferenceConfig) -> Self {
        Self {
            reader: BatchReader::from_config(pool, config),
        }
    }

    /// Every scored product id, ascending
    pub async fn product_ids(&self) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = self
            .reader
            .fetch_all("products.ids", || {
                QueryBuilder::new("SELECT product_id FROM product_scores ORDER BY product_id")
            })
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Up to `sample_size` product ids chosen by a seeded shuffle, ascending
    pub async fn sample_product_ids(&self, sample_size: usize, seed: u64) -> Result<Vec<i64>> {
        let all = self.product_ids().await?;
        let sampled = sample_ids(&all, sample_size, seed);
        info!(
            total = all.len(),
            sampled = sampled.len(),
            seed,
            "Sampled products"
        );
        Ok(sampled)
    }

    /// Products with their ingredients, in id order. Unknown ids are skipped.
    pub async fn load_products(&self, product_ids: &[i64]) -> Result<Vec<ScoredProduct>> {
        let scores: Vec<ScoreRow> = self
            .reader
            .fetch_chunked("products.scores", product_ids, |chunk| {
                let mut builder = QueryBuilder::new(
                    "SELECT product_id, product_name, form_coverage FROM product_scores \
                     WHERE product_id IN ",
                );
                push_id_list(&mut builder, chunk);
                builder
            })
            .await?;

        let ingredient_rows: Vec<IngredientRow> = self
            .reader
            .fetch_chunked("products.ingredients", product_ids, |chunk| {
                let mut builder = QueryBuilder::new(
                    "SELECT product_id, ingredient_id, name, form_raw, amount, unit, is_active \
                     FROM product_ingredients WHERE product_id IN ",
                );
                push_id_list(&mut builder, chunk);
                builder.push(" ORDER BY product_id, rowid");
                builder
            })
            .await?;

        let mut ingredients: HashMap<i64, Vec<ProductIngredient>> = HashMap::new();
        for (product_id, ingredient_id, name, form_raw, amount, unit, is_active) in ingredient_rows {
            ingredients.entry(product_id).or_default().push(ProductIngredient {
                ingredient_id,
                name: name.unwrap_or_default(),
                form_raw,
                amount,
                unit,
                is_active: is_active.unwrap_or(true),
            });
        }

        let mut products: Vec<ScoredProduct> = scores
            .into_iter()
            .map(|(product_id, name, form_coverage)| ScoredProduct {
                product_id,
                name,
                form_coverage: form_coverage.unwrap_or(0.0),
                ingredients: ingredients.remove(&product_id).unwrap_or_default(),
            })
            .collect();
        products.sort_by_key(|p| p.product_id);
        Ok(products)
    }
}

/// Seeded sample of ids, returned ascending
pub fn sample_ids(ids: &[i64], sample_size: usize, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sampled: Vec<i64> = ids.choose_multiple(&mut rng, sample_size).copied().collect();
    sampled.sort_unstable();
    sampled
}
