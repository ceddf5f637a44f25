//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tourney::{
    Catalogue, EngineConfig, MemoryStore, RegistrationEngine, RegistrationForm, Store, StoreError,
    Tournament, UpdateError,
    store::StoreResult,
};

pub const PEPPER: &str = "integration_test_pepper";

/// Seed `users/{uid}` with the given wallet
pub async fn seed_user<S: Store>(store: &S, uid: &str, wallet: i64) {
    store
        .write(
            &format!("users/{uid}"),
            json!({
                "name": "Test Player",
                "email": format!("{uid}@example.com"),
                "mobile": null,
                "wallet": wallet,
                "points": 0,
                "createdAt": "2024-03-01T00:00:00Z"
            }),
        )
        .await
        .unwrap();
}

pub async fn wallet<S: Store>(store: &S, uid: &str) -> i64 {
    store
        .read(&format!("users/{uid}"))
        .await
        .unwrap()
        .and_then(|user| user["wallet"].as_i64())
        .unwrap()
}

pub fn form(uid: &str) -> RegistrationForm {
    RegistrationForm::new("5123", format!("{uid}@example.com"), "UTR0001")
}

/// Catalogue with `count` tournaments, ids 1..=count, entry fee 10 each
pub fn catalogue_of(count: i64) -> Catalogue {
    let template = Catalogue::builtin()
        .get(1)
        .cloned()
        .unwrap();
    let tournaments = (1..=count)
        .map(|id| Tournament {
            id,
            entry_fee: 10,
            ..template.clone()
        })
        .collect();
    Catalogue::new(tournaments).unwrap()
}

pub fn engine<S: Store>(store: Arc<S>, config: EngineConfig) -> RegistrationEngine<S> {
    RegistrationEngine::new(store, Arc::new(Catalogue::builtin()), config)
}

/// Store wrapper that can fail writes below a path prefix and counts reads
#[derive(Clone)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_prefix: Arc<std::sync::Mutex<Option<String>>>,
    fail_reads: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing_prefix: Arc::new(std::sync::Mutex::new(None)),
            fail_reads: Arc::new(AtomicBool::new(false)),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every write, insert and conditional update below `prefix`
    pub fn fail_writes_under(&self, prefix: &str) {
        *self.failing_prefix.lock().unwrap() = Some(prefix.to_string());
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check_write(&self, path: &str) -> StoreResult<()> {
        match self.failing_prefix.lock().unwrap().as_deref() {
            Some(prefix) if path.starts_with(prefix) => {
                Err(StoreError::Unavailable(format!("injected failure writing {path}")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn read(&self, path: &str) -> StoreResult<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, value: Value) -> StoreResult<()> {
        self.check_write(path)?;
        self.inner.write(path, value).await
    }

    async fn insert_if_absent(&self, path: &str, value: Value) -> StoreResult<bool> {
        self.check_write(path)?;
        self.inner.insert_if_absent(path, value).await
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        self.check_write(path)?;
        self.inner.delete(path).await
    }

    async fn transactional_update<F, E>(&self, path: &str, f: F) -> Result<Value, UpdateError<E>>
    where
        F: FnMut(Option<&Value>) -> Result<Value, E> + Send,
        E: Send,
    {
        self.check_write(path)?;
        self.inner.transactional_update(path, f).await
    }
}
