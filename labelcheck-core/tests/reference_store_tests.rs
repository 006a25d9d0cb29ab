//! SQLite reference store and product source against a temporary database

mod helpers;

use helpers::{create_test_db, seed_products, seed_reference};
use labelcheck_common::config::ReferenceConfig;
use labelcheck_common::Error;
use labelcheck_core::forms::{match_form, FormMatchOutcome, MatchSource};
use labelcheck_core::services::{ProductSource, ReferenceStore, SqliteReferenceStore};

fn small_chunks() -> ReferenceConfig {
    ReferenceConfig {
        chunk_size: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_verified_forms_only() {
    let (_dir, path, pool) = create_test_db().await.unwrap();
    seed_reference(&pool).await.unwrap();

    let store = SqliteReferenceStore::open(&path, &small_chunks()).await.unwrap();
    let forms = store.verified_forms(&[1, 2, 3]).await.unwrap();

    let keys: Vec<(i64, &str)> = forms
        .iter()
        .map(|f| (f.ingredient_id, f.form_key.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (1, "citrate"),
            (1, "glycinate"),
            (2, "bisglycinate"),
            (2, "picolinate")
        ]
    );
    assert!(forms.iter().all(|f| f.is_verified()));
}

#[tokio::test]
async fn test_aliases_global_plus_scoped() {
    let (_dir, path, pool) = create_test_db().await.unwrap();
    seed_reference(&pool).await.unwrap();

    let store = SqliteReferenceStore::open(&path, &ReferenceConfig::default())
        .await
        .unwrap();
    let aliases = store.form_aliases(&[1]).await.unwrap();

    let texts: Vec<&str> = aliases.iter().map(|a| a.alias_text.as_str()).collect();
    assert_eq!(texts, vec!["Albion TRAACS", "Magtein"]);
}

#[tokio::test]
async fn test_ingredient_meta_batched() {
    let (_dir, path, pool) = create_test_db().await.unwrap();
    seed_reference(&pool).await.unwrap();

    let store = SqliteReferenceStore::open(&path, &small_chunks()).await.unwrap();
    let meta = store.ingredient_meta(&[4, 1, 999]).await.unwrap();

    // One page per id, in request order
    let names: Vec<&str> = meta.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Vitamin D", "Magnesium"]);
    assert_eq!(meta[0].ul_adult, Some(100.0));
    assert_eq!(meta[1].unit.as_deref(), Some("mg"));
}

#[tokio::test]
async fn test_empty_id_list() {
    let (_dir, path, pool) = create_test_db().await.unwrap();
    seed_reference(&pool).await.unwrap();

    let store = SqliteReferenceStore::open(&path, &ReferenceConfig::default())
        .await
        .unwrap();
    let data = store.load_reference(&[]).await.unwrap();

    assert!(data.forms_for(1).is_empty());
    // Global aliases are always loaded
    assert_eq!(data.aliases().len(), 1);
}

#[tokio::test]
async fn test_match_through_store() {
    let (_dir, path, pool) = create_test_db().await.unwrap();
    seed_reference(&pool).await.unwrap();

    let store = SqliteReferenceStore::open(&path, &ReferenceConfig::default())
        .await
        .unwrap();
    let data = store.load_reference(&[2]).await.unwrap();
    let run = |candidate: &str| match_form(candidate, 2, data.forms_for(2), data.aliases());

    assert_eq!(
        run("Albion TRAACS"),
        FormMatchOutcome::Matched {
            form_key: "bisglycinate".to_string(),
            via: MatchSource::Alias
        }
    );
    assert_eq!(
        run("Zinc Picolinate"),
        FormMatchOutcome::Matched {
            form_key: "picolinate".to_string(),
            via: MatchSource::Form
        }
    );
    // Scoped to another ingredient
    assert_eq!(run("OptiZinc"), FormMatchOutcome::NoMatch);
}

#[tokio::test]
async fn test_missing_database_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let result =
        SqliteReferenceStore::open(&dir.path().join("absent.db"), &ReferenceConfig::default()).await;

    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_product_source_loads_ingredients() {
    let (_dir, _path, pool) = create_test_db().await.unwrap();
    seed_products(&pool).await.unwrap();

    let source = ProductSource::new(pool, &small_chunks());
    assert_eq!(source.product_ids().await.unwrap(), vec![1, 2, 3, 4, 5, 6]);

    let products = source.load_products(&[6, 4, 1, 42]).await.unwrap();
    let ids: Vec<i64> = products.iter().map(|p| p.product_id).collect();
    assert_eq!(ids, vec![1, 4, 6]);

    let calm = &products[0];
    assert_eq!(calm.name.as_deref(), Some("Calm Magnesium"));
    assert_eq!(calm.ingredients.len(), 2);
    assert_eq!(calm.ingredients[0].form_raw.as_deref(), Some("magnesium oxide"));
    assert!(calm.has_zero_coverage());

    let empty = &products[2];
    assert!(!empty.ingredients[0].is_active);
    assert_eq!(empty.active_ingredients().count(), 0);
}

#[tokio::test]
async fn test_sampling_is_reproducible() {
    let (_dir, _path, pool) = create_test_db().await.unwrap();
    seed_products(&pool).await.unwrap();

    let source = ProductSource::new(pool, &ReferenceConfig::default());
    let first = source.sample_product_ids(3, 11).await.unwrap();
    let second = source.sample_product_ids(3, 11).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}
