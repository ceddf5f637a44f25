//! # Tourney
//!
//! Registration engine for paid esports tournaments.
//!
//! Players hold a wallet balance on their user record. Registering for a
//! tournament checks for an existing registration, conditionally debits the
//! entry fee, writes a pending registration and bumps the tournament's player
//! count. Everything durable lives behind the [`Store`] trait so the same
//! engine runs against PostgreSQL or an in-memory store.
//!
//! ## Core Modules
//!
//! - [`store`]: Hierarchical key-value store contract and in-memory store
//! - [`db`]: PostgreSQL configuration and [`PgStore`]
//! - [`catalogue`]: The static tournament list
//! - [`registration`]: The registration engine
//! - [`auth`]: Sign-up, sign-in and live profile updates
//! - [`wallet`]: Manual UPI top-up requests
//! - [`lobby`]: Headless lobby state for front ends
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tourney::{
//!     AuthManager, Catalogue, EngineConfig, MemoryStore, RegistrationEngine, RegistrationForm,
//!     SignUpRequest, Store,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let auth = AuthManager::new(Arc::clone(&store), "pepper_for_docs_only".to_string());
//!     let profile = auth
//!         .sign_up(SignUpRequest {
//!             email: "asha@example.com".to_string(),
//!             password: "hunter22".to_string(),
//!             name: Some("Asha".to_string()),
//!             mobile: None,
//!         })
//!         .await?;
//!
//!     // Credit the wallet out of band
//!     let path = format!("users/{}", profile.uid);
//!     let mut record = store.read(&path).await?.unwrap_or_default();
//!     record["wallet"] = 100.into();
//!     store.write(&path, record).await?;
//!
//!     let engine = RegistrationEngine::new(store, Arc::new(Catalogue::builtin()), EngineConfig::default());
//!     let form = RegistrationForm::new("5123", "asha@example.com", "UTR123");
//!     engine.register(&profile.uid, 2, form).await?;
//!     assert_eq!(engine.get_player_count(2).await, 1);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalogue;
pub mod db;
pub mod lobby;
pub mod registration;
pub mod store;
pub mod wallet;

pub use auth::{AuthError, AuthManager, ProfileSubscription, SignInRequest, SignUpRequest, UserProfile};
pub use catalogue::{Catalogue, CatalogueError, Tournament, TournamentId};
pub use db::{DatabaseConfig, PgStore};
pub use lobby::{JoinOutcome, Lobby, Modal, PlayerCountRefresher, SessionState};
pub use registration::{
    ConsistencyMode, EngineConfig, Registration, RegistrationEngine, RegistrationError,
    RegistrationForm, RegistrationStatus,
};
pub use store::{MemoryStore, Store, StoreError, UpdateError};
pub use wallet::{Money, TopUpError, TopUpRequest, TopUpResult, UpiConfig};
