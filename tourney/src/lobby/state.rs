//! Lobby view state and the actions the front end triggers.

use super::session::SessionState;
use crate::auth::{AuthManager, AuthResult, SignInRequest, SignUpRequest, UserProfile};
use crate::catalogue::{Catalogue, Tournament, TournamentId};
use crate::registration::{Registration, RegistrationEngine, RegistrationForm};
use crate::store::Store;
use std::collections::{BTreeSet, HashMap};

/// Which dialog is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    None,
    Auth,
    Wallet,
    Registration(TournamentId),
}

/// Outcome of submitting the registration form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Registered(Registration),
    /// Not signed in; the auth dialog was opened
    NeedsAuth,
    /// Balance too low; the wallet dialog was opened
    NeedsTopUp,
    /// Failed; the message is on the error banner
    Failed(String),
}

/// One catalogue entry as displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentCard<'a> {
    pub tournament: &'a Tournament,
    pub player_count: u64,
    pub is_registered: bool,
}

/// Headless lobby: catalogue, current user and transient dialog state.
///
/// Holds derived view state only; everything durable goes through the
/// registration engine or the identity provider.
pub struct Lobby<S> {
    engine: RegistrationEngine<S>,
    auth: AuthManager<S>,
    session: SessionState,
    registered: BTreeSet<TournamentId>,
    player_counts: HashMap<TournamentId, u64>,
    modal: Modal,
    selected: Option<TournamentId>,
    error: Option<String>,
}

impl<S: Store> Lobby<S> {
    pub fn new(engine: RegistrationEngine<S>, auth: AuthManager<S>, session: SessionState) -> Self {
        Self {
            engine,
            auth,
            session,
            registered: BTreeSet::new(),
            player_counts: HashMap::new(),
            modal: Modal::None,
            selected: None,
            error: None,
        }
    }

    pub fn engine(&self) -> &RegistrationEngine<S> {
        &self.engine
    }

    pub fn auth(&self) -> &AuthManager<S> {
        &self.auth
    }

    pub fn catalogue(&self) -> &Catalogue {
        self.engine.catalogue()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.session.profile()
    }

    pub fn modal(&self) -> Modal {
        self.modal
    }

    pub fn selected(&self) -> Option<&Tournament> {
        self.selected.and_then(|id| self.catalogue().get(id))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn registered(&self) -> &BTreeSet<TournamentId> {
        &self.registered
    }

    pub fn player_count(&self, id: TournamentId) -> u64 {
        self.player_counts.get(&id).copied().unwrap_or(0)
    }

    /// Catalogue entries with their live counts and registration flags
    pub fn cards(&self) -> Vec<TournamentCard<'_>> {
        self.catalogue()
            .iter()
            .map(|tournament| TournamentCard {
                tournament,
                player_count: self.player_count(tournament.id),
                is_registered: self.registered.contains(&tournament.id),
            })
            .collect()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn open_wallet(&mut self) {
        self.modal = Modal::Wallet;
    }

    /// Close whatever dialog is open; closing the registration dialog also
    /// drops the selection
    pub fn close_modal(&mut self) {
        if matches!(self.modal, Modal::Registration(_)) {
            self.selected = None;
        }
        self.modal = Modal::None;
    }

    pub async fn sign_up(&mut self, request: SignUpRequest) -> AuthResult<()> {
        let profile = self.auth.sign_up(request).await?;
        self.enter_session(profile).await;
        Ok(())
    }

    pub async fn sign_in(&mut self, request: SignInRequest) -> AuthResult<()> {
        let profile = self.auth.sign_in(request).await?;
        self.enter_session(profile).await;
        Ok(())
    }

    pub fn sign_out(&mut self) {
        self.auth.sign_out(&mut self.session);
        self.registered.clear();
        self.selected = None;
        self.modal = Modal::None;
    }

    /// Take a live profile update for the signed-in user
    pub fn apply_profile(&mut self, profile: UserProfile) {
        if self.session.uid() == Some(profile.uid.as_str()) {
            self.session.set_profile(profile);
        }
    }

    /// "Join" on a tournament card
    pub fn join(&mut self, id: TournamentId) {
        if !self.session.is_signed_in() {
            self.modal = Modal::Auth;
            return;
        }
        if self.catalogue().get(id).is_none() {
            self.error = Some(format!("Unknown tournament {id}"));
            return;
        }
        self.selected = Some(id);
        self.modal = Modal::Registration(id);
    }

    /// Submit the registration form for the selected tournament
    pub async fn submit_registration(&mut self, form: RegistrationForm) -> JoinOutcome {
        let Some(profile) = self.session.profile().cloned() else {
            self.modal = Modal::Auth;
            return JoinOutcome::NeedsAuth;
        };
        let Some(tournament) = self.selected().cloned() else {
            let message = "No tournament selected".to_string();
            self.error = Some(message.clone());
            return JoinOutcome::Failed(message);
        };

        if !tournament.affordable_with(profile.wallet) {
            self.modal = Modal::Wallet;
            return JoinOutcome::NeedsTopUp;
        }

        match self.engine.register(&profile.uid, tournament.id, form).await {
            Ok(registration) => {
                self.refresh_registrations().await;
                self.refresh_player_counts().await;
                self.modal = Modal::None;
                self.selected = None;
                self.error = None;
                JoinOutcome::Registered(registration)
            }
            Err(e) => {
                log::warn!(
                    "Registration of {} for tournament {} failed: {}",
                    profile.uid,
                    tournament.id,
                    e
                );
                self.error = Some(e.client_message());
                if e.requires_top_up() {
                    self.modal = Modal::Wallet;
                    JoinOutcome::NeedsTopUp
                } else {
                    JoinOutcome::Failed(e.client_message())
                }
            }
        }
    }

    pub async fn refresh_registrations(&mut self) {
        match self.session.uid() {
            Some(uid) => self.registered = self.engine.list_registrations(uid).await,
            None => self.registered.clear(),
        }
    }

    pub async fn refresh_player_counts(&mut self) {
        let ids = self.catalogue().ids();
        self.player_counts = self.engine.player_counts(&ids).await;
    }

    /// Fold in a snapshot from a background refresher.
    ///
    /// Counts only grow, so a per-tournament maximum keeps a fresher local
    /// count from being replaced by an older snapshot.
    pub fn merge_player_counts(&mut self, counts: HashMap<TournamentId, u64>) {
        for (id, count) in counts {
            let known = self.player_counts.entry(id).or_insert(0);
            *known = (*known).max(count);
        }
    }

    async fn enter_session(&mut self, profile: UserProfile) {
        self.session.set_profile(profile);
        if self.modal == Modal::Auth {
            self.modal = Modal::None;
        }
        self.refresh_registrations().await;
    }
}
