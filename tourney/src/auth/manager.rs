//! Identity provider implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccountRecord, SignInRequest, SignUpRequest, UserProfile, UserRecord},
    subscription::ProfileSubscription,
};
use crate::lobby::SessionState;
use crate::store::{Store, StoreError, paths};
use crate::wallet::Money;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

/// Default profile polling interval
pub const DEFAULT_PROFILE_POLL: Duration = Duration::from_secs(2);

/// Minimum password length accepted at sign-up
const MIN_PASSWORD_LEN: usize = 6;

/// Authentication manager
pub struct AuthManager<S> {
    store: Arc<S>,
    pepper: String,
    poll_interval: Duration,
}

impl<S> Clone for AuthManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pepper: self.pepper.clone(),
            poll_interval: self.poll_interval,
        }
    }
}

impl<S: Store> AuthManager<S> {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `store` - Shared backing store
    /// * `pepper` - Server-side pepper for password hashing
    pub fn new(store: Arc<S>, pepper: String) -> Self {
        Self {
            store,
            pepper,
            poll_interval: DEFAULT_PROFILE_POLL,
        }
    }

    /// Override how often [`watch_profile`](Self::watch_profile) polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Create an account and its empty user record
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidEmail` - Email missing `@`
    /// * `AuthError::WeakPassword` - Password too short
    /// * `AuthError::EmailInUse` - Account already exists
    pub async fn sign_up(&self, request: SignUpRequest) -> AuthResult<UserProfile> {
        let email = request.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidEmail(email));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let uid = Uuid::new_v4().to_string();
        let account = AccountRecord {
            uid: uid.clone(),
            email: email.clone(),
            password_hash: self.hash_password(&request.password)?,
        };

        // Reserving the account key is what makes duplicate sign-ups fail
        let account_path = paths::account(&email);
        let reserved = self
            .store
            .insert_if_absent(&account_path, to_value(&account)?)
            .await?;
        if !reserved {
            return Err(AuthError::EmailInUse);
        }

        let record = UserRecord {
            name: request.name.filter(|n| !n.trim().is_empty()),
            email,
            mobile: request.mobile.filter(|m| !m.trim().is_empty()),
            wallet: Money::ZERO,
            points: 0,
            created_at: Utc::now().to_rfc3339(),
        };
        if let Err(e) = self.store.write(&paths::user(&uid), to_value(&record)?).await {
            if let Err(cleanup) = self.store.delete(&account_path).await {
                log::error!("Failed to release account reservation for {}: {}", uid, cleanup);
            }
            return Err(e.into());
        }

        log::info!("Created account {}", uid);
        Ok(UserProfile::from_record(&uid, record))
    }

    /// Verify credentials and load the profile
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredential` - Empty input or corrupt credential record
    /// * `AuthError::NotFound` - No account for the email
    /// * `AuthError::WrongPassword` - Password mismatch
    /// * `AuthError::ProfileMissing` - Account without a user record
    pub async fn sign_in(&self, request: SignInRequest) -> AuthResult<UserProfile> {
        let email = request.email.trim();
        if email.is_empty() || request.password.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        let account: AccountRecord = match self.store.read(&paths::account(email)).await? {
            Some(value) => serde_json::from_value(value).map_err(|_| AuthError::InvalidCredential)?,
            None => return Err(AuthError::NotFound),
        };
        self.verify_password(&request.password, &account.password_hash)?;

        let profile = self
            .get_profile(&account.uid)
            .await?
            .ok_or(AuthError::ProfileMissing)?;
        log::info!("Signed in {}", profile.uid);
        Ok(profile)
    }

    /// End the session held in `session`
    pub fn sign_out(&self, session: &mut SessionState) {
        if let Some(profile) = session.profile() {
            log::info!("Signed out {}", profile.uid);
        }
        session.clear();
    }

    /// Current profile, `None` if no user record exists
    pub async fn get_profile(&self, uid: &str) -> AuthResult<Option<UserProfile>> {
        Ok(self
            .store
            .read(&paths::user(uid))
            .await?
            .and_then(|value| UserProfile::from_value(uid, value)))
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredential)?;

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed)
            .map_err(|_| AuthError::WrongPassword)
    }
}

impl<S: Store + 'static> AuthManager<S> {
    /// Subscribe to changes of `users/{uid}`
    ///
    /// Must be called within a Tokio runtime.
    pub fn watch_profile(&self, uid: &str) -> ProfileSubscription {
        ProfileSubscription::spawn(Arc::clone(&self.store), uid.to_string(), self.poll_interval)
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> AuthResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AuthError::Store(StoreError::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager() -> AuthManager<MemoryStore> {
        AuthManager::new(Arc::new(MemoryStore::new()), "test_pepper".to_string())
    }

    fn signup(email: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            password: "hunter22".to_string(),
            name: Some("Asha".to_string()),
            mobile: None,
        }
    }

    #[tokio::test]
    async fn test_sign_up_creates_empty_wallet() {
        let auth = manager();
        let profile = auth.sign_up(signup("asha@example.com")).await.unwrap();
        assert_eq!(profile.wallet, Money::ZERO);
        assert_eq!(profile.points, 0);
        assert_eq!(profile.name.as_deref(), Some("Asha"));

        let stored = auth.get_profile(&profile.uid).await.unwrap().unwrap();
        assert_eq!(stored, profile);
    }

    #[tokio::test]
    async fn test_fractional_wallet_still_signs_in() {
        let auth = manager();
        let created = auth.sign_up(signup("asha@example.com")).await.unwrap();
        let path = paths::user(&created.uid);
        let mut record = auth.store.read(&path).await.unwrap().unwrap();
        record["wallet"] = serde_json::json!(149.5);
        auth.store.write(&path, record).await.unwrap();

        let profile = auth.get_profile(&created.uid).await.unwrap().unwrap();
        assert_eq!(profile.wallet, Money::new(1495, 1));

        let signed_in = auth
            .sign_in(SignInRequest {
                email: "asha@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(signed_in.wallet, Money::new(1495, 1));
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let auth = manager();
        let mut req = signup("not-an-email");
        assert!(matches!(auth.sign_up(req.clone()).await, Err(AuthError::InvalidEmail(_))));

        req.email = "ok@example.com".to_string();
        req.password = "123".to_string();
        assert!(matches!(auth.sign_up(req).await, Err(AuthError::WeakPassword(_))));
    }

    #[tokio::test]
    async fn test_hash_never_stores_plaintext() {
        let auth = manager();
        let hash = auth.hash_password("hunter22").unwrap();
        assert!(!hash.contains("hunter22"));
        assert!(auth.verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            auth.verify_password("hunter23", &hash),
            Err(AuthError::WrongPassword)
        ));
        assert!(matches!(
            auth.verify_password("hunter22", "garbage"),
            Err(AuthError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn test_pepper_is_part_of_hash() {
        let auth = manager();
        let other = AuthManager::new(Arc::new(MemoryStore::new()), "other_pepper".to_string());
        let hash = auth.hash_password("hunter22").unwrap();
        assert!(other.verify_password("hunter22", &hash).is_err());
    }
}
