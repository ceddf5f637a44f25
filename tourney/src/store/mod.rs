//! Store adapter: a hierarchical key-value store with a conditional-update
//! primitive.
//!
//! The registration engine and the identity provider only ever talk to a
//! [`Store`]. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: in-process, optionally with simulated round-trip latency
//! - [`crate::db::PgStore`]: PostgreSQL-backed, one row per record
//!
//! Paths are `/`-separated (see [`paths`]). Reading a path that only exists as
//! a prefix of stored records returns the assembled subtree as a JSON object,
//! so `read("registrations")` yields `{ "<tournamentId>": { "<uid>": {...} } }`.
//!
//! ## Example
//!
//! ```
//! use tourney::store::{MemoryStore, Store, UpdateError};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     store.write("users/u1", json!({ "wallet": 100 })).await?;
//!
//!     let committed = store
//!         .transactional_update("users/u1", |current| {
//!             let wallet = current.and_then(|v| v["wallet"].as_i64()).unwrap_or(0);
//!             if wallet < 40 {
//!                 return Err("insufficient");
//!             }
//!             Ok(json!({ "wallet": wallet - 40 }))
//!         })
//!         .await
//!         .map_err(|e| match e {
//!             UpdateError::Aborted(reason) => reason.to_string(),
//!             UpdateError::Store(err) => err.to_string(),
//!         })?;
//!     assert_eq!(committed["wallet"], 60);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod memory;
pub mod paths;

pub use errors::{StoreError, StoreResult, UpdateError};
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Default bound on optimistic retries of a conditional update.
pub const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 32;

/// Abstract persistent store consumed by the engine and identity provider.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the value at `path`, or the assembled subtree below it.
    async fn read(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Unconditionally overwrite the value at `path`.
    async fn write(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Write `value` only if nothing is stored at `path`.
    ///
    /// Returns `true` if the value was written.
    async fn insert_if_absent(&self, path: &str, value: Value) -> StoreResult<bool>;

    /// Remove the value at `path` together with everything below it.
    async fn delete(&self, path: &str) -> StoreResult<()>;

    /// Atomic read-modify-write of a single record.
    ///
    /// `f` receives the current value (or `None`) and returns the value to
    /// commit. If another writer commits in between, `f` is re-run against
    /// the fresh value. Returning `Err` from `f` aborts without writing.
    async fn transactional_update<F, E>(
        &self,
        path: &str,
        f: F,
    ) -> Result<Value, UpdateError<E>>
    where
        F: FnMut(Option<&Value>) -> Result<Value, E> + Send,
        E: Send;
}

/// Build the nested object for `prefix` out of `(full_path, value)` pairs
/// that all live strictly below it.
pub(crate) fn assemble_subtree<I>(prefix: &str, records: I) -> Option<Value>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut root = Map::new();
    let strip = format!("{prefix}/");

    for (path, value) in records {
        let Some(rest) = path.strip_prefix(&strip) else {
            continue;
        };
        let parts: Vec<&str> = rest.split('/').collect();
        insert_nested(&mut root, &parts, value);
    }

    if root.is_empty() {
        None
    } else {
        Some(Value::Object(root))
    }
}

fn insert_nested(node: &mut Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [last] => {
            node.insert((*last).to_string(), value);
        }
        [head, tail @ ..] => {
            let child = node
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_nested(map, tail, value);
            }
        }
    }
}

pub(crate) fn validate_path(path: &str) -> StoreResult<()> {
    match paths::segments(path) {
        Some(_) => Ok(()),
        None => Err(StoreError::InvalidPath(path.to_string())),
    }
}
