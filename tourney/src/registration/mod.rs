//! Registration engine: the only component that mutates wallets and
//! registration records.
//!
//! A registration is four remote steps against the shared store:
//!
//! 1. Duplicate check on `registrations/{tournamentId}/{uid}`
//! 2. Conditional wallet debit on `users/{uid}` (atomic per user record)
//! 3. Registration write
//! 4. Player-count increment on `tournamentStats/{tournamentId}`
//!
//! There is no transaction spanning the steps. [`ConsistencyMode::Relaxed`]
//! runs them as-is, accepting double debits for concurrent duplicates,
//! orphaned debits when step 3 fails and an approximate counter.
//! [`ConsistencyMode::Strict`] (the default) guards step 3 with an
//! insert-if-absent write, refunds the debit when step 3 fails or loses a
//! race, and increments the counter with a conditional update.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tourney::catalogue::Catalogue;
//! use tourney::registration::{EngineConfig, RegistrationEngine, RegistrationForm};
//! use tourney::store::{MemoryStore, Store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     store
//!         .write("users/u1", json!({ "email": "u1@example.com", "wallet": 100, "points": 0,
//!                                     "createdAt": "2024-03-01T00:00:00Z" }))
//!         .await?;
//!
//!     let engine = RegistrationEngine::new(store, Arc::new(Catalogue::builtin()), EngineConfig::default());
//!     let form = RegistrationForm::new("5123", "u1@example.com", "UTR42");
//!     let registration = engine.register("u1", 1, form).await?;
//!
//!     assert_eq!(registration.entry_fee, 100);
//!     assert_eq!(engine.get_player_count(1).await, 1);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod models;

pub use config::{ConsistencyMode, EngineConfig};
pub use engine::RegistrationEngine;
pub use errors::{RegistrationError, RegistrationResult};
pub use models::{Registration, RegistrationForm, RegistrationStatus, TournamentStats};
