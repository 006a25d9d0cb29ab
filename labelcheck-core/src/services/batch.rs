//! Chunked, retried reads against SQLite

use labelcheck_common::config::ReferenceConfig;
use labelcheck_common::error::is_transient_sqlx;
use labelcheck_common::{retry_with_policy, Error, Result, RetryPolicy};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

/// Runs `IN (...)` lookups in fixed-size pages, retrying each page on
/// transient failures
#[derive(Clone)]
pub struct BatchReader {
    pool: SqlitePool,
    chunk_size: usize,
    retry_policy: RetryPolicy,
}

impl BatchReader {
    pub fn new(pool: SqlitePool, chunk_size: usize, retry_policy: RetryPolicy) -> Self {
        Self {
            pool,
            chunk_size: chunk_size.max(1),
            retry_policy,
        }
    }

    pub fn from_config(pool: SqlitePool, config: &ReferenceConfig) -> Self {
        Self::new(pool, config.chunk_size, config.retry_policy())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// One query per id chunk; rows concatenated in chunk order.
    /// No query runs for an empty id list.
    pub async fn fetch_chunked<T, F>(&self, operation: &str, ids: &[i64], build: F) -> Result<Vec<T>>
    where
        T: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
        F: Fn(&[i64]) -> QueryBuilder<'static, Sqlite>,
    {
        let mut rows = Vec::new();
        for chunk in ids.chunks(self.chunk_size) {
            let page: Vec<T> = self.fetch_all(operation, || build(chunk)).await?;
            debug!(operation, chunk = chunk.len(), rows = page.len(), "Fetched page");
            rows.extend(page);
        }
        Ok(rows)
    }

    /// One retried query
    pub async fn fetch_all<T, F>(&self, operation: &str, build: F) -> Result<Vec<T>>
    where
        T: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
        F: Fn() -> QueryBuilder<'static, Sqlite>,
    {
        retry_with_policy(operation, &self.retry_policy, is_transient_sqlx, || {
            let mut builder = build();
            let pool = self.pool.clone();
            async move { builder.build_query_as::<T>().fetch_all(&pool).await }
        })
        .await
        .map_err(|e| lookup_error(operation, &self.retry_policy, e))
    }
}

/// Exhausted transient failures become transport errors; the rest stay database errors
fn lookup_error(operation: &str, policy: &RetryPolicy, err: sqlx::Error) -> Error {
    if is_transient_sqlx(&err) {
        Error::transport(operation, policy.max_attempts, err)
    } else {
        Error::Database(err)
    }
}

/// Append `(?, ?, ...)` binding every id
pub fn push_id_list(builder: &mut QueryBuilder<'static, Sqlite>, ids: &[i64]) {
    builder.push("(");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}
