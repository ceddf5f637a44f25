//! Registration engine: duplicate check, wallet debit, registration write
//! and player-count increment against a shared [`Store`].

use super::{
    config::{ConsistencyMode, EngineConfig},
    errors::{RegistrationError, RegistrationResult},
    models::{Registration, RegistrationForm, TournamentStats},
};
use crate::catalogue::{Catalogue, Tournament, TournamentId};
use crate::store::{Store, StoreError, UpdateError, paths};
use crate::wallet::{Money, money};
use chrono::Utc;
use futures_util::future::join_all;
use serde_json::Value;
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

/// Registration engine
pub struct RegistrationEngine<S> {
    store: Arc<S>,
    catalogue: Arc<Catalogue>,
    config: EngineConfig,
}

impl<S> Clone for RegistrationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalogue: Arc::clone(&self.catalogue),
            config: self.config.clone(),
        }
    }
}

impl<S: Store> RegistrationEngine<S> {
    /// Create a new registration engine
    ///
    /// # Arguments
    ///
    /// * `store` - Shared backing store
    /// * `catalogue` - Tournaments that can be registered for
    /// * `config` - Consistency settings
    pub fn new(store: Arc<S>, catalogue: Arc<Catalogue>, config: EngineConfig) -> Self {
        Self {
            store,
            catalogue,
            config,
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a user for a tournament, paying the entry fee from the wallet
    ///
    /// # Arguments
    ///
    /// * `uid` - Account id of the registering user
    /// * `tournament_id` - Catalogue id of the tournament
    /// * `form` - In-game uid, contact email and payment reference
    ///
    /// # Returns
    ///
    /// * `RegistrationResult<Registration>` - The persisted registration
    ///
    /// # Errors
    ///
    /// * `RegistrationError::Validation` - Bad input, nothing was read or written
    /// * `RegistrationError::AlreadyRegistered` - A registration already exists
    /// * `RegistrationError::InsufficientBalance` - Wallet below the entry fee, nothing written
    /// * `RegistrationError::UserNotFound` - No user record
    /// * `RegistrationError::StoreUnavailable` - Any step failed remotely
    pub async fn register(
        &self,
        uid: &str,
        tournament_id: TournamentId,
        form: RegistrationForm,
    ) -> RegistrationResult<Registration> {
        let tournament = self.validate(uid, tournament_id, &form)?.clone();
        let path = paths::registration(tournament_id, uid);

        if self.store.read(&path).await?.is_some() {
            return Err(RegistrationError::AlreadyRegistered(tournament_id));
        }

        let balance = self.debit(uid, tournament.fee()).await?;
        log::debug!(
            "Debited {} from {} for tournament {}, balance now {}",
            tournament.entry_fee,
            uid,
            tournament_id,
            balance
        );

        let registration = Registration::pending(uid, &tournament, form, now_millis());
        match self.config.consistency {
            ConsistencyMode::Relaxed => self.finish_relaxed(&path, &tournament, registration).await,
            ConsistencyMode::Strict => self.finish_strict(&path, &tournament, registration).await,
        }
    }

    /// Ids of every tournament the user holds a registration for
    ///
    /// Store failures are logged and reported as no registrations.
    pub async fn list_registrations(&self, uid: &str) -> BTreeSet<TournamentId> {
        let root = match self.store.read(paths::REGISTRATIONS_ROOT).await {
            Ok(Some(Value::Object(root))) => root,
            Ok(_) => return BTreeSet::new(),
            Err(e) => {
                log::warn!("Failed to load registrations for {}: {}", uid, e);
                return BTreeSet::new();
            }
        };

        root.iter()
            .filter(|(_, registrants)| registrants.get(uid).is_some())
            .filter_map(|(id, _)| id.parse().ok())
            .collect()
    }

    /// Current player count of a tournament, 0 when absent or unreadable
    pub async fn get_player_count(&self, tournament_id: TournamentId) -> u64 {
        match self.store.read(&paths::tournament_stats(tournament_id)).await {
            Ok(Some(stats)) => stats
                .get("playerCount")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                log::warn!(
                    "Failed to load player count for tournament {}: {}",
                    tournament_id,
                    e
                );
                0
            }
        }
    }

    /// Player counts for several tournaments, fetched concurrently
    pub async fn player_counts(&self, ids: &[TournamentId]) -> HashMap<TournamentId, u64> {
        let counts = join_all(ids.iter().map(|&id| async move {
            (id, self.get_player_count(id).await)
        }))
        .await;
        counts.into_iter().collect()
    }

    /// Fetch a single registration record
    pub async fn get_registration(
        &self,
        tournament_id: TournamentId,
        uid: &str,
    ) -> RegistrationResult<Option<Registration>> {
        match self.store.read(&paths::registration(tournament_id, uid)).await? {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(StoreError::from)?,
            )),
            None => Ok(None),
        }
    }

    fn validate(
        &self,
        uid: &str,
        tournament_id: TournamentId,
        form: &RegistrationForm,
    ) -> RegistrationResult<&Tournament> {
        if uid.trim().is_empty() || uid.contains('/') {
            return Err(RegistrationError::Validation("Invalid user id".to_string()));
        }
        form.validate().map_err(RegistrationError::Validation)?;

        let tournament = self.catalogue.get(tournament_id).ok_or_else(|| {
            RegistrationError::Validation(format!("Unknown tournament {tournament_id}"))
        })?;
        if tournament.entry_fee < 0 {
            return Err(RegistrationError::Validation(
                "Entry fee must not be negative".to_string(),
            ));
        }
        Ok(tournament)
    }

    /// Conditionally take `amount` out of the wallet; returns the new balance
    async fn debit(&self, uid: &str, amount: Money) -> RegistrationResult<Money> {
        let committed = self
            .store
            .transactional_update(&paths::user(uid), |current| {
                let Some(Value::Object(record)) = current else {
                    return Err(RegistrationError::UserNotFound(uid.to_string()));
                };
                let available = wallet_of(current);
                if available < amount {
                    return Err(RegistrationError::InsufficientBalance {
                        available,
                        required: amount,
                    });
                }
                let mut next = record.clone();
                next.insert("wallet".to_string(), money::to_json(available - amount));
                Ok(Value::Object(next))
            })
            .await
            .map_err(flatten)?;

        Ok(wallet_of(Some(&committed)))
    }

    /// Give `amount` back after a registration could not be written
    async fn refund(&self, uid: &str, amount: Money, tournament_id: TournamentId) {
        let result = self
            .store
            .transactional_update(&paths::user(uid), |current| {
                let Some(Value::Object(record)) = current else {
                    return Err(RegistrationError::UserNotFound(uid.to_string()));
                };
                let mut next = record.clone();
                next.insert("wallet".to_string(), money::to_json(wallet_of(current) + amount));
                Ok(Value::Object(next))
            })
            .await;

        match result {
            Ok(_) => log::info!(
                "Refunded {} to {} after failed registration for tournament {}",
                amount,
                uid,
                tournament_id
            ),
            Err(e) => log::error!(
                "Orphaned debit: refund of {} to {} for tournament {} failed: {}",
                amount,
                uid,
                tournament_id,
                flatten(e)
            ),
        }
    }

    async fn finish_relaxed(
        &self,
        path: &str,
        tournament: &Tournament,
        registration: Registration,
    ) -> RegistrationResult<Registration> {
        let value = serde_json::to_value(&registration).map_err(StoreError::from)?;
        if let Err(e) = self.store.write(path, value).await {
            log::error!(
                "Orphaned debit: {} paid {} but registration for tournament {} was not written: {}",
                registration.uid,
                tournament.entry_fee,
                tournament.id,
                e
            );
            return Err(e.into());
        }

        let stats_path = paths::tournament_stats(tournament.id);
        let increment = async {
            let current: TournamentStats = match self.store.read(&stats_path).await? {
                Some(value) => serde_json::from_value(value).unwrap_or_default(),
                None => TournamentStats::default(),
            };
            let next = serde_json::to_value(current.incremented(now_millis()))?;
            self.store.write(&stats_path, next).await?;
            Ok::<_, StoreError>(())
        };
        if let Err(e) = increment.await {
            log::error!(
                "Player count for tournament {} not incremented after registering {}: {}",
                tournament.id,
                registration.uid,
                e
            );
            return Err(e.into());
        }

        Ok(registration)
    }

    async fn finish_strict(
        &self,
        path: &str,
        tournament: &Tournament,
        registration: Registration,
    ) -> RegistrationResult<Registration> {
        let value = serde_json::to_value(&registration).map_err(StoreError::from)?;
        match self.store.insert_if_absent(path, value).await {
            Ok(true) => {}
            Ok(false) => {
                self.refund(&registration.uid, tournament.fee(), tournament.id)
                    .await;
                return Err(RegistrationError::AlreadyRegistered(tournament.id));
            }
            Err(e) => {
                self.refund(&registration.uid, tournament.fee(), tournament.id)
                    .await;
                return Err(e.into());
            }
        }

        let increment = self
            .store
            .transactional_update(&paths::tournament_stats(tournament.id), |current| {
                let stats: TournamentStats = current
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                serde_json::to_value(stats.incremented(now_millis()))
            })
            .await;
        if let Err(e) = increment {
            log::warn!(
                "Player count for tournament {} not incremented: {}",
                tournament.id,
                e
            );
        }

        Ok(registration)
    }
}

fn flatten(err: UpdateError<RegistrationError>) -> RegistrationError {
    match err {
        UpdateError::Aborted(e) => e,
        UpdateError::Store(e) => RegistrationError::StoreUnavailable(e),
    }
}

/// Exact wallet balance of a user record; absent or unreadable counts as zero
fn wallet_of(record: Option<&Value>) -> Money {
    record
        .and_then(|r| r.get("wallet"))
        .and_then(money::from_json)
        .unwrap_or_default()
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    async fn engine_with_wallet(wallet: i64, config: EngineConfig) -> RegistrationEngine<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .write(
                "users/u1",
                json!({"email": "u1@example.com", "wallet": wallet, "points": 0,
                       "createdAt": "2024-03-01T00:00:00Z"}),
            )
            .await
            .unwrap();
        RegistrationEngine::new(store, Arc::new(Catalogue::builtin()), config)
    }

    fn form() -> RegistrationForm {
        RegistrationForm::new("5123", "u1@example.com", "UTR1")
    }

    #[test]
    fn test_wallet_of() {
        assert_eq!(wallet_of(Some(&json!({"wallet": 40}))), Money::from(40));
        assert_eq!(wallet_of(Some(&json!({"wallet": 40.0}))), Money::from(40));
        assert_eq!(wallet_of(Some(&json!({"wallet": 40.75}))), Money::new(4075, 2));
        assert_eq!(wallet_of(Some(&json!({}))), Money::ZERO);
        assert_eq!(wallet_of(None), Money::ZERO);
    }

    #[tokio::test]
    async fn test_fractional_wallet_debits_exact_fee() {
        for config in [EngineConfig::relaxed(), EngineConfig::strict()] {
            let engine = engine_with_wallet(0, config).await;
            engine
                .store
                .write(
                    "users/u1",
                    json!({"email": "u1@example.com", "wallet": 149.5, "points": 0,
                           "createdAt": "2024-03-01T00:00:00Z"}),
                )
                .await
                .unwrap();

            let registration = engine.register("u1", 2, form()).await.unwrap();
            assert_eq!(registration.entry_fee, 50);

            let user = engine.store.read("users/u1").await.unwrap().unwrap();
            assert_eq!(user["wallet"], json!(99.5));
        }
    }

    #[tokio::test]
    async fn test_fractional_shortfall_is_insufficient() {
        let engine = engine_with_wallet(0, EngineConfig::default()).await;
        engine
            .store
            .write(
                "users/u1",
                json!({"email": "u1@example.com", "wallet": 49.99, "createdAt": "2024-03-01T00:00:00Z"}),
            )
            .await
            .unwrap();

        let err = engine.register("u1", 2, form()).await.unwrap_err();
        match err {
            RegistrationError::InsufficientBalance { available, required } => {
                assert_eq!(available, Money::new(4999, 2));
                assert_eq!(required, Money::from(50));
            }
            other => panic!("unexpected error: {other}"),
        }
        let user = engine.store.read("users/u1").await.unwrap().unwrap();
        assert_eq!(user["wallet"], json!(49.99));
    }

    #[tokio::test]
    async fn test_unknown_tournament_is_validation_error() {
        let engine = engine_with_wallet(100, EngineConfig::default()).await;
        let err = engine.register("u1", 99, form()).await.unwrap_err();
        assert!(matches!(err, RegistrationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_slash_in_uid_rejected() {
        let engine = engine_with_wallet(100, EngineConfig::default()).await;
        let err = engine.register("u1/x", 1, form()).await.unwrap_err();
        assert!(matches!(err, RegistrationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_user_record() {
        let engine = engine_with_wallet(100, EngineConfig::default()).await;
        let err = engine.register("ghost", 1, form()).await.unwrap_err();
        assert!(matches!(err, RegistrationError::UserNotFound(ref uid) if uid == "ghost"));
        assert_eq!(engine.get_player_count(1).await, 0);
    }

    #[tokio::test]
    async fn test_register_both_modes_debit_once() {
        for config in [EngineConfig::relaxed(), EngineConfig::strict()] {
            let engine = engine_with_wallet(150, config).await;
            engine.register("u1", 2, form()).await.unwrap();

            let user = engine.store.read("users/u1").await.unwrap().unwrap();
            assert_eq!(user["wallet"], 100);
            assert_eq!(user["email"], "u1@example.com");
            assert_eq!(engine.get_player_count(2).await, 1);
        }
    }

    #[tokio::test]
    async fn test_get_registration_roundtrip() {
        let engine = engine_with_wallet(100, EngineConfig::default()).await;
        let created = engine.register("u1", 1, form()).await.unwrap();
        let fetched = engine.get_registration(1, "u1").await.unwrap();
        assert_eq!(fetched, Some(created));
        assert_eq!(engine.get_registration(2, "u1").await.unwrap(), None);
    }
}
