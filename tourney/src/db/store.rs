//! PostgreSQL-backed store: one row per record, keyed by full path.

use super::config::DatabaseConfig;
use crate::store::{
    DEFAULT_MAX_UPDATE_ATTEMPTS, Store, StoreError, StoreResult, UpdateError, assemble_subtree,
    validate_path,
};
use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use sqlx::{
    PgPool, Row,
    postgres::PgPoolOptions,
};
use std::time::Duration;

const CREATE_VERSION_SEQUENCE: &str = "CREATE SEQUENCE IF NOT EXISTS store_entry_versions";

// Versions come from one sequence, so a recreated path never reuses a
// version a concurrent conditional update may still hold.
const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS store_entries (
    path TEXT PRIMARY KEY,
    value JSONB NOT NULL,
    version BIGINT NOT NULL DEFAULT nextval('store_entry_versions'),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

/// [`Store`] over a single `store_entries` table.
///
/// Conditional updates compare the row's `version` column and retry with a
/// short randomized backoff when another writer got there first.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    max_update_attempts: u32,
}

impl PgStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            max_update_attempts: DEFAULT_MAX_UPDATE_ATTEMPTS,
        }
    }

    /// Open a connection pool sized by `config`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tourney::db::{DatabaseConfig, PgStore};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), tourney::StoreError> {
    ///     let store = PgStore::connect(&DatabaseConfig::from_env()).await?;
    ///     store.ensure_schema().await?;
    ///     store.health_check().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        log::info!(
            "Connected to store database (max {} connections)",
            config.max_connections
        );
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn with_max_update_attempts(mut self, attempts: u32) -> Self {
        self.max_update_attempts = attempts.max(1);
        self
    }

    /// Create the backing table if it does not exist yet
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_VERSION_SEQUENCE).execute(&self.pool).await?;
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Round trip to the database
    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool; later operations fail with [`StoreError::Unavailable`]
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn backoff(&self, attempt: u32) {
        let ceiling = 5 * u64::from(attempt.min(20));
        let millis = rand::rng().random_range(1..=ceiling.max(1));
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[async_trait]
impl Store for PgStore {
    async fn read(&self, path: &str) -> StoreResult<Option<Value>> {
        validate_path(path)?;
        let prefix = format!("{path}/");

        let rows = sqlx::query(
            "SELECT path, value FROM store_entries
             WHERE path = $1 OR left(path, length($2)) = $2",
        )
        .bind(path)
        .bind(&prefix)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("path")?;
            let value: Value = row.try_get("value")?;
            if key == path {
                return Ok(Some(value));
            }
            records.push((key, value));
        }
        Ok(assemble_subtree(path, records))
    }

    async fn write(&self, path: &str, value: Value) -> StoreResult<()> {
        validate_path(path)?;
        sqlx::query(
            "INSERT INTO store_entries (path, value, version, updated_at)
             VALUES ($1, $2, nextval('store_entry_versions'), NOW())
             ON CONFLICT (path)
             DO UPDATE SET
                value = EXCLUDED.value,
                version = nextval('store_entry_versions'),
                updated_at = NOW()",
        )
        .bind(path)
        .bind(&value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_if_absent(&self, path: &str, value: Value) -> StoreResult<bool> {
        validate_path(path)?;
        let inserted = sqlx::query(
            "INSERT INTO store_entries (path, value, version, updated_at)
             VALUES ($1, $2, nextval('store_entry_versions'), NOW())
             ON CONFLICT (path) DO NOTHING
             RETURNING path",
        )
        .bind(path)
        .bind(&value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        validate_path(path)?;
        sqlx::query("DELETE FROM store_entries WHERE path = $1 OR left(path, length($2)) = $2")
            .bind(path)
            .bind(format!("{path}/"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn transactional_update<F, E>(
        &self,
        path: &str,
        mut f: F,
    ) -> Result<Value, UpdateError<E>>
    where
        F: FnMut(Option<&Value>) -> Result<Value, E> + Send,
        E: Send,
    {
        validate_path(path)?;

        for attempt in 1..=self.max_update_attempts {
            let row = sqlx::query("SELECT value, version FROM store_entries WHERE path = $1")
                .bind(path)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::from)?;

            let observed = match row {
                Some(row) => Some((
                    row.try_get::<Value, _>("value").map_err(StoreError::from)?,
                    row.try_get::<i64, _>("version").map_err(StoreError::from)?,
                )),
                None => None,
            };
            let next = f(observed.as_ref().map(|(value, _)| value)).map_err(UpdateError::Aborted)?;

            let committed = match observed {
                Some((_, version)) => sqlx::query(
                    "UPDATE store_entries
                     SET value = $2, version = nextval('store_entry_versions'), updated_at = NOW()
                     WHERE path = $1 AND version = $3
                     RETURNING version",
                )
                .bind(path)
                .bind(&next)
                .bind(version)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::from)?,
                None => sqlx::query(
                    "INSERT INTO store_entries (path, value, version, updated_at)
                     VALUES ($1, $2, nextval('store_entry_versions'), NOW())
                     ON CONFLICT (path) DO NOTHING
                     RETURNING version",
                )
                .bind(path)
                .bind(&next)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::from)?,
            };

            if committed.is_some() {
                return Ok(next);
            }
            log::debug!(
                "Conditional update on {} lost a race (attempt {}), retrying",
                path,
                attempt
            );
            self.backoff(attempt).await;
        }

        Err(UpdateError::Store(StoreError::Contended {
            path: path.to_string(),
            attempts: self.max_update_attempts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    async fn store() -> PgStore {
        let config = DatabaseConfig {
            connection_timeout_secs: 5,
            ..DatabaseConfig::from_env()
        };
        let store = PgStore::connect(&config)
            .await
            .expect("Failed to connect to database");
        store.health_check().await.expect("Health check failed");
        store.ensure_schema().await.expect("Failed to create schema");
        store
    }

    fn unique(prefix: &str) -> String {
        format!("test_{}/{}", prefix, uuid::Uuid::new_v4())
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_write_read_delete() {
        let store = store().await;
        let root = unique("rw");
        store.write(&format!("{root}/a/x"), json!(1)).await.unwrap();
        store.write(&format!("{root}/a/y"), json!(2)).await.unwrap();
        store.write(&format!("{root}/b"), json!({"k": "v"})).await.unwrap();

        let tree = store.read(&root).await.unwrap().unwrap();
        assert_eq!(tree["a"]["x"], 1);
        assert_eq!(tree["a"]["y"], 2);
        assert_eq!(tree["b"]["k"], "v");

        store.delete(&root).await.unwrap();
        assert!(store.read(&root).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_insert_if_absent() {
        let store = store().await;
        let path = unique("insert");
        assert!(store.insert_if_absent(&path, json!(1)).await.unwrap());
        assert!(!store.insert_if_absent(&path, json!(2)).await.unwrap());
        assert_eq!(store.read(&path).await.unwrap(), Some(json!(1)));
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_concurrent_increments_are_exact() {
        let store = Arc::new(store().await);
        let path = unique("counter");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let path = path.clone();
                tokio::spawn(async move {
                    store
                        .transactional_update(&path, |current| {
                            let n = current.and_then(Value::as_i64).unwrap_or(0);
                            Ok::<_, ()>(json!(n + 1))
                        })
                        .await
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.read(&path).await.unwrap(), Some(json!(16)));
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_recreated_record_gets_new_version() {
        let store = store().await;
        let path = unique("recreate");
        let version = |store: PgStore, path: String| async move {
            sqlx::query("SELECT version FROM store_entries WHERE path = $1")
                .bind(path)
                .fetch_one(store.pool())
                .await
                .unwrap()
                .get::<i64, _>("version")
        };

        store.write(&path, json!(1)).await.unwrap();
        let before = version(store.clone(), path.clone()).await;
        store.delete(&path).await.unwrap();
        store.write(&path, json!(1)).await.unwrap();
        let after = version(store.clone(), path.clone()).await;

        assert!(after > before);
        store.delete(&path).await.unwrap();
    }
}
