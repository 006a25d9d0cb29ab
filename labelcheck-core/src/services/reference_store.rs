//! Reference-data collaborator (ingredient taxonomy store)
//!
//! Read-only access to verified forms, form aliases and dosage metadata.
//! Lookups are batched into `IN (...)` pages; each page is retried on
//! transient database failures (lock contention, pool timeout, I/O).

use super::batch::{push_id_list, BatchReader};
use crate::models::{AuditStatus, FormAlias, IngredientForm, IngredientMeta, ReferenceData};
use async_trait::async_trait;
use labelcheck_common::config::ReferenceConfig;
use labelcheck_common::{Error, Result};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{QueryBuilder, SqlitePool};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Read-only taxonomy lookups
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Verified forms of the given ingredients
    async fn verified_forms(&self, ingredient_ids: &[i64]) -> Result<Vec<IngredientForm>>;

    /// Global aliases plus aliases scoped to the given ingredients
    async fn form_aliases(&self, ingredient_ids: &[i64]) -> Result<Vec<FormAlias>>;

    async fn ingredient_meta(&self, ingredient_ids: &[i64]) -> Result<Vec<IngredientMeta>>;

    /// Everything the matcher, coverage and UL stages need for these ingredients
    async fn load_reference(&self, ingredient_ids: &[i64]) -> Result<ReferenceData> {
        let ids = dedup_ids(ingredient_ids);
        let forms = self.verified_forms(&ids).await?;
        let aliases = self.form_aliases(&ids).await?;
        let meta = self.ingredient_meta(&ids).await?;
        Ok(ReferenceData::new(forms, aliases, meta))
    }
}

/// Sorted, deduplicated ids
pub(crate) fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

type FormRow = (i64, String, String, String);
type AliasRow = (String, Option<String>, String, Option<i64>);
type MetaRow = (i64, String, Option<String>, Option<f64>, Option<f64>);

/// Taxonomy store backed by the SQLite reference tables
#[derive(Clone)]
pub struct SqliteReferenceStore {
    reader: BatchReader,
}

impl SqliteReferenceStore {
    pub fn new(pool: SqlitePool, config: &ReferenceConfig) -> Self {
        Self {
            reader: BatchReader::from_config(pool, config),
        }
    }

    /// Open the database file read-only
    pub async fn open(path: &Path, config: &ReferenceConfig) -> Result<Self> {
        let pool = open_read_only(path).await?;
        info!(path = %path.display(), "Opened reference database");
        Ok(Self::new(pool, config))
    }

    pub fn pool(&self) -> &SqlitePool {
        self.reader.pool()
    }
}

/// Read-only pool on an existing database file
pub async fn open_read_only(path: &Path) -> Result<SqlitePool> {
    if !path.exists() {
        return Err(Error::NotFound(format!("database {}", path.display())));
    }
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    Ok(SqlitePool::connect_with(options).await?)
}

#[async_trait]
impl ReferenceStore for SqliteReferenceStore {
    async fn verified_forms(&self, ingredient_ids: &[i64]) -> Result<Vec<IngredientForm>> {
        let rows: Vec<FormRow> = self
            .reader
            .fetch_chunked("reference.verified_forms", ingredient_ids, |chunk| {
                let mut builder = QueryBuilder::new(
                    "SELECT ingredient_id, form_key, form_label, audit_status \
                     FROM ingredient_forms WHERE audit_status = 'verified' AND ingredient_id IN ",
                );
                push_id_list(&mut builder, chunk);
                builder.push(" ORDER BY ingredient_id, form_key");
                builder
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|(ingredient_id, form_key, form_label, status)| IngredientForm {
                ingredient_id,
                form_key,
                form_label,
                audit_status: AuditStatus::parse(&status),
            })
            .collect())
    }

    async fn form_aliases(&self, ingredient_ids: &[i64]) -> Result<Vec<FormAlias>> {
        let global: Vec<AliasRow> = self
            .reader
            .fetch_all("reference.global_aliases", || {
                QueryBuilder::new(
                    "SELECT alias_text, alias_norm, form_key, ingredient_id \
                     FROM form_aliases WHERE ingredient_id IS NULL ORDER BY alias_text",
                )
            })
            .await?;

        let scoped: Vec<AliasRow> = self
            .reader
            .fetch_chunked("reference.scoped_aliases", ingredient_ids, |chunk| {
                let mut builder = QueryBuilder::new(
                    "SELECT alias_text, alias_norm, form_key, ingredient_id \
                     FROM form_aliases WHERE ingredient_id IN ",
                );
                push_id_list(&mut builder, chunk);
                builder.push(" ORDER BY ingredient_id, alias_text");
                builder
            })
            .await?;

        Ok(global
            .into_iter()
            .chain(scoped)
            .map(|(alias_text, alias_norm, form_key, ingredient_id)| FormAlias {
                alias_text,
                alias_norm,
                form_key,
                ingredient_id,
            })
            .collect())
    }

    async fn ingredient_meta(&self, ingredient_ids: &[i64]) -> Result<Vec<IngredientMeta>> {
        let rows: Vec<MetaRow> = self
            .reader
            .fetch_chunked("reference.ingredient_meta", ingredient_ids, |chunk| {
                let mut builder = QueryBuilder::new(
                    "SELECT id, name, unit, rda_adult, ul_adult FROM ingredients WHERE id IN ",
                );
                push_id_list(&mut builder, chunk);
                builder.push(" ORDER BY id");
                builder
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|(ingredient_id, name, unit, rda_adult, ul_adult)| IngredientMeta {
                ingredient_id,
                name,
                unit,
                rda_adult,
                ul_adult,
            })
            .collect())
    }
}

/// Fixture-backed store for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceStore {
    pub forms: Vec<IngredientForm>,
    pub aliases: Vec<FormAlias>,
    pub meta: Vec<IngredientMeta>,
}

#[async_trait]
impl ReferenceStore for InMemoryReferenceStore {
    async fn verified_forms(&self, ingredient_ids: &[i64]) -> Result<Vec<IngredientForm>> {
        Ok(self
            .forms
            .iter()
            .filter(|f| f.is_verified() && ingredient_ids.contains(&f.ingredient_id))
            .cloned()
            .collect())
    }

    async fn form_aliases(&self, ingredient_ids: &[i64]) -> Result<Vec<FormAlias>> {
        Ok(self
            .aliases
            .iter()
            .filter(|a| a.ingredient_id.map_or(true, |id| ingredient_ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn ingredient_meta(&self, ingredient_ids: &[i64]) -> Result<Vec<IngredientMeta>> {
        Ok(self
            .meta
            .iter()
            .filter(|m| ingredient_ids.contains(&m.ingredient_id))
            .cloned()
            .collect())
    }
}
