//! Database Test Utilities
//!
//! Temporary SQLite databases with the reference and product tables

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tempfile::TempDir;

const SCHEMA: &str = r#"
    CREATE TABLE ingredients (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        unit TEXT,
        rda_adult REAL,
        ul_adult REAL
    );

    CREATE TABLE ingredient_forms (
        ingredient_id INTEGER NOT NULL,
        form_key TEXT NOT NULL,
        form_label TEXT NOT NULL,
        audit_status TEXT NOT NULL
    );

    CREATE TABLE form_aliases (
        alias_text TEXT NOT NULL,
        alias_norm TEXT,
        form_key TEXT NOT NULL,
        ingredient_id INTEGER
    );

    CREATE TABLE product_scores (
        product_id INTEGER PRIMARY KEY,
        product_name TEXT,
        form_coverage REAL
    );

    CREATE TABLE product_ingredients (
        product_id INTEGER NOT NULL,
        ingredient_id INTEGER,
        name TEXT,
        form_raw TEXT,
        amount REAL,
        unit TEXT,
        is_active INTEGER
    );
"#;

/// Create temporary test database with the schema applied
///
/// Returns (TempDir, path, pool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, PathBuf, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("labelcheck_test.db");

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    let pool = SqlitePool::connect(&db_url).await?;
    sqlx::raw_sql(SCHEMA).execute(&pool).await?;

    Ok((temp_dir, db_path, pool))
}

/// Magnesium (1), Zinc (2), Ashwagandha (3, no verified forms), Vitamin D (4)
pub async fn seed_reference(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(
        r#"
        INSERT INTO ingredients (id, name, unit, rda_adult, ul_adult) VALUES
            (1, 'Magnesium', 'mg', 420, 350),
            (2, 'Zinc', 'mg', 11, 40),
            (3, 'Ashwagandha', 'mg', NULL, NULL),
            (4, 'Vitamin D', 'mcg', 15, 100);

        INSERT INTO ingredient_forms (ingredient_id, form_key, form_label, audit_status) VALUES
            (1, 'citrate', 'Citrate', 'verified'),
            (1, 'glycinate', 'Glycinate', 'verified'),
            (1, 'oxide', 'Oxide', 'pending'),
            (2, 'picolinate', 'Picolinate', 'verified'),
            (2, 'bisglycinate', 'Bisglycinate Chelate', 'verified'),
            (3, 'root_extract', 'Root Extract', 'pending'),
            (4, 'cholecalciferol', 'Cholecalciferol', 'verified');

        INSERT INTO form_aliases (alias_text, alias_norm, form_key, ingredient_id) VALUES
            ('Albion TRAACS', 'albion traacs', 'bisglycinate', NULL),
            ('Magtein', NULL, 'glycinate', 1),
            ('OptiZinc', NULL, 'picolinate', 99);
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Products 1..=6 with zero coverage except product 5
pub async fn seed_products(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(
        r#"
        INSERT INTO product_scores (product_id, product_name, form_coverage) VALUES
            (1, 'Calm Magnesium', 0.0),
            (2, 'Zinc Plus', 0.0),
            (3, 'Stress Blend', 0.0),
            (4, 'Mystery Mix', 0.0),
            (5, 'Good Magnesium', 1.0),
            (6, 'Empty Capsule', 0.0);

        INSERT INTO product_ingredients (product_id, ingredient_id, name, form_raw, amount, unit, is_active) VALUES
            (1, 1, 'Magnesium', 'magnesium oxide', 200, 'mg', 1),
            (1, 1, 'Magnesium', '', 100, 'mg', 1),
            (2, 2, 'Zinc', 'zinc gluconate', 30, 'mg', 1),
            (2, 2, 'Zinc', 'picolinate', 15, NULL, 1),
            (3, 3, 'Ashwagandha', 'root', 600, 'mg', 1),
            (4, NULL, 'Proprietary Blend', 'powder', 500, 'mg', 1),
            (4, 1, 'Magnesium', 'oxide', 100, 'mg', 1),
            (5, 1, 'Magnesium', 'Magnesium Citrate', 200, 'mg', 1),
            (6, NULL, 'Gelatin', NULL, NULL, NULL, 0);
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
