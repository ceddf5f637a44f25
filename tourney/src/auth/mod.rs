//! Session and identity provider.
//!
//! Accounts live in the same [`Store`](crate::store::Store) as everything
//! else:
//!
//! - `accounts/{emailKey}`: uid and Argon2id hash (password + server pepper)
//! - `users/{uid}`: the profile record with wallet and points
//!
//! Sign-up reserves the account key with an insert-if-absent write, so two
//! concurrent sign-ups for the same address cannot both succeed. Profile
//! changes are observed through [`ProfileSubscription`], which polls.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tourney::auth::{AuthManager, SignInRequest, SignUpRequest};
//! use tourney::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = AuthManager::new(Arc::new(MemoryStore::new()), "pepper".to_string());
//!
//!     let created = auth
//!         .sign_up(SignUpRequest {
//!             email: "asha@example.com".to_string(),
//!             password: "hunter22".to_string(),
//!             name: Some("Asha".to_string()),
//!             mobile: None,
//!         })
//!         .await?;
//!
//!     let profile = auth
//!         .sign_in(SignInRequest {
//!             email: "asha@example.com".to_string(),
//!             password: "hunter22".to_string(),
//!         })
//!         .await?;
//!     assert_eq!(created.uid, profile.uid);
//!     assert!(profile.wallet.is_zero());
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod subscription;

pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{AccountRecord, SignInRequest, SignUpRequest, UserId, UserProfile, UserRecord};
pub use subscription::ProfileSubscription;
