//! In-process store with optimistic versioning.

use super::{
    DEFAULT_MAX_UPDATE_ATTEMPTS, Store, assemble_subtree,
    errors::{StoreError, StoreResult, UpdateError},
    validate_path,
};
use async_trait::async_trait;
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    version: u64,
}

/// Records plus a store-wide version clock.
///
/// Versions are never reused, so a record that is deleted and written again
/// never matches a version observed before the delete.
#[derive(Debug, Default)]
struct Records {
    entries: BTreeMap<String, Entry>,
    clock: u64,
}

impl Records {
    fn put(&mut self, path: &str, value: Value) {
        self.clock += 1;
        let version = self.clock;
        self.entries.insert(path.to_string(), Entry { value, version });
    }

    fn version_of(&self, path: &str) -> Option<u64> {
        self.entries.get(path).map(|e| e.version)
    }
}

/// In-memory [`Store`].
///
/// Every operation can be delayed by a fixed `latency` to mimic a remote
/// round trip; conditional updates pay it twice (read, then commit), which
/// opens the same interleaving window a hosted database has.
#[derive(Clone)]
pub struct MemoryStore {
    records: Arc<RwLock<Records>>,
    latency: Duration,
    max_update_attempts: u32,
}

impl MemoryStore {
    /// Create an empty store with no simulated latency
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Records::default())),
            latency: Duration::ZERO,
            max_update_attempts: DEFAULT_MAX_UPDATE_ATTEMPTS,
        }
    }

    /// Delay every operation by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Bound on optimistic retries of a conditional update
    pub fn with_max_update_attempts(mut self, attempts: u32) -> Self {
        self.max_update_attempts = attempts.max(1);
        self
    }

    /// Number of records currently stored
    pub async fn len(&self) -> usize {
        self.records.read().await.entries.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.entries.is_empty()
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn snapshot(&self, path: &str) -> Option<Entry> {
        self.records.read().await.entries.get(path).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self, path: &str) -> StoreResult<Option<Value>> {
        validate_path(path)?;
        self.round_trip().await;

        let records = self.records.read().await;
        let entries = &records.entries;
        if let Some(entry) = entries.get(path) {
            return Ok(Some(entry.value.clone()));
        }

        let prefix = format!("{path}/");
        let children = entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, entry)| (key.clone(), entry.value.clone()));

        Ok(assemble_subtree(path, children))
    }

    async fn write(&self, path: &str, value: Value) -> StoreResult<()> {
        validate_path(path)?;
        self.round_trip().await;

        self.records.write().await.put(path, value);
        Ok(())
    }

    async fn insert_if_absent(&self, path: &str, value: Value) -> StoreResult<bool> {
        validate_path(path)?;
        self.round_trip().await;

        let mut records = self.records.write().await;
        if records.entries.contains_key(path) {
            return Ok(false);
        }
        records.put(path, value);
        Ok(true)
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        validate_path(path)?;
        self.round_trip().await;

        let prefix = format!("{path}/");
        let mut records = self.records.write().await;
        records
            .entries
            .retain(|key, _| key != path && !key.starts_with(&prefix));
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

        for _ in 0..self.max_update_attempts {
            self.round_trip().await;
            let observed = self.snapshot(path).await;
            let next = f(observed.as_ref().map(|e| &e.value)).map_err(UpdateError::Aborted)?;
            let observed_version = observed.map(|e| e.version);

            self.round_trip().await;
            let mut records = self.records.write().await;
            if records.version_of(path) != observed_version {
                log::debug!("Conditional update on {} lost a race, retrying", path);
                continue;
            }

            records.put(path, next.clone());
            return Ok(next);
        }

        Err(UpdateError::Store(StoreError::Contended {
            path: path.to_string(),
            attempts: self.max_update_attempts,
        }))
    }
}
