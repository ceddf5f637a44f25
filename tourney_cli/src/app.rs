//! Executes parsed commands against the lobby and renders replies.

use crate::commands::{HELP, LobbyCommand};
use std::fmt::Write;
use tourney::{
    JoinOutcome, Lobby, Modal, PlayerCountRefresher, ProfileSubscription, RegistrationForm,
    SignInRequest, SignUpRequest, Store, TopUpRequest, UpiConfig, UserProfile,
};

/// Reply to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub quit: bool,
}

impl Reply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

/// Terminal lobby: the headless [`Lobby`] plus the live profile
/// subscription and the player-count refresher
pub struct App<S> {
    lobby: Lobby<S>,
    upi: UpiConfig,
    subscription: Option<ProfileSubscription>,
    refresher: Option<PlayerCountRefresher>,
}

impl<S: Store + 'static> App<S> {
    pub fn new(lobby: Lobby<S>, upi: UpiConfig) -> Self {
        let mut app = Self {
            lobby,
            upi,
            subscription: None,
            refresher: None,
        };
        app.sync_subscription();
        app
    }

    /// Keep player counts fresh in the background
    pub fn with_refresher(mut self, refresher: PlayerCountRefresher) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn lobby(&self) -> &Lobby<S> {
        &self.lobby
    }

    /// Wait for the next live profile change; pending while signed out
    pub async fn next_profile(&mut self) -> UserProfile {
        loop {
            match self.subscription.as_mut() {
                Some(subscription) => match subscription.next().await {
                    Some(profile) => return profile,
                    None => self.subscription = None,
                },
                None => std::future::pending::<()>().await,
            }
        }
    }

    pub fn apply_profile(&mut self, profile: UserProfile) {
        log::debug!("Live profile update for {}", profile.uid);
        self.lobby.apply_profile(profile);
    }

    /// Stop background work
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        if let Some(refresher) = self.refresher.take() {
            refresher.stop();
        }
    }

    pub async fn execute(&mut self, command: LobbyCommand) -> Reply {
        let reply = match command {
            LobbyCommand::List => Reply::say(self.list().await),
            LobbyCommand::SignUp {
                email,
                password,
                name,
                mobile,
            } => {
                let request = SignUpRequest {
                    email,
                    password,
                    name: Some(name),
                    mobile,
                };
                match self.lobby.sign_up(request).await {
                    Ok(()) => Reply::say(self.welcome("Account created")),
                    Err(e) => Reply::say(e.client_message()),
                }
            }
            LobbyCommand::SignIn { email, password } => {
                match self.lobby.sign_in(SignInRequest { email, password }).await {
                    Ok(()) => Reply::say(self.welcome("Signed in")),
                    Err(e) => Reply::say(e.client_message()),
                }
            }
            LobbyCommand::SignOut => {
                if self.lobby.session().is_signed_in() {
                    self.lobby.sign_out();
                    Reply::say("Signed out")
                } else {
                    Reply::say("Not signed in")
                }
            }
            LobbyCommand::Profile => Reply::say(match self.lobby.profile() {
                Some(p) => format!(
                    "{} <{}>\nWallet: {}\nPoints: {}",
                    p.display_name(),
                    p.email,
                    p.wallet,
                    p.points
                ),
                None => "Not signed in".to_string(),
            }),
            LobbyCommand::Join(id) => Reply::say(self.join(id)),
            LobbyCommand::Register {
                game_uid,
                email,
                utr,
            } => {
                let form = RegistrationForm::new(game_uid, email, utr);
                Reply::say(self.register(form).await)
            }
            LobbyCommand::Registrations => {
                self.lobby.refresh_registrations().await;
                Reply::say(self.registrations())
            }
            LobbyCommand::Wallet => Reply::say(match self.lobby.profile() {
                Some(p) => format!("Wallet balance: {}", p.wallet),
                None => "Not signed in".to_string(),
            }),
            LobbyCommand::TopUp(amount) => Reply::say(self.top_up(&amount)),
            LobbyCommand::Help => Reply::say(HELP.trim_end()),
            LobbyCommand::Quit => Reply {
                text: "Bye".to_string(),
                quit: true,
            },
        };
        self.sync_subscription();
        reply
    }

    /// Follow whoever is signed in now
    fn sync_subscription(&mut self) {
        let wanted = self.lobby.session().uid().map(str::to_string);
        let current = self.subscription.as_ref().map(|s| s.uid().to_string());
        if wanted == current {
            return;
        }
        if let Some(old) = self.subscription.take() {
            old.cancel();
        }
        self.subscription = wanted.map(|uid| self.lobby.auth().watch_profile(&uid));
    }

    fn welcome(&self, prefix: &str) -> String {
        match self.lobby.profile() {
            Some(p) => format!("{prefix}. Welcome, {}!", p.display_name()),
            None => prefix.to_string(),
        }
    }

    async fn list(&mut self) -> String {
        match &self.refresher {
            Some(refresher) => {
                let counts = refresher.snapshot().await;
                self.lobby.merge_player_counts(counts);
            }
            None => self.lobby.refresh_player_counts().await,
        }

        let mut out = String::new();
        for card in self.lobby.cards() {
            let t = card.tournament;
            let _ = writeln!(
                out,
                "#{:<3} {:<10} {:<10} {} {}  fee {:>5}  prize {:>7}  players {}/{}{}",
                t.id,
                t.game,
                t.map,
                t.date,
                t.time.format("%H:%M"),
                t.entry_fee,
                t.prize,
                card.player_count,
                t.players,
                if card.is_registered { "  [registered]" } else { "" }
            );
        }
        if out.is_empty() {
            out.push_str("No tournaments");
        }
        out.trim_end().to_string()
    }

    fn join(&mut self, id: tourney::TournamentId) -> String {
        self.lobby.dismiss_error();
        self.lobby.join(id);
        match self.lobby.modal() {
            Modal::Auth => "Sign in or sign up first".to_string(),
            Modal::Registration(_) => match self.lobby.selected() {
                Some(t) => format!(
                    "Registering for {} on {} at {}. Entry fee: {}\n\
                     Enter: register GAME_UID EMAIL UTR",
                    t.game,
                    t.date,
                    t.time.format("%H:%M"),
                    t.entry_fee
                ),
                None => "No tournament selected".to_string(),
            },
            _ => self
                .lobby
                .error()
                .unwrap_or("Could not open the registration form")
                .to_string(),
        }
    }

    async fn register(&mut self, form: RegistrationForm) -> String {
        match self.lobby.submit_registration(form).await {
            JoinOutcome::Registered(registration) => format!(
                "Registered for {} (status: {}). Entry fee {} deducted.",
                registration.game_name, registration.status, registration.entry_fee
            ),
            JoinOutcome::NeedsAuth => "Sign in or sign up first".to_string(),
            JoinOutcome::NeedsTopUp => {
                "Insufficient wallet balance. Use 'topup AMOUNT' to add funds.".to_string()
            }
            JoinOutcome::Failed(message) => message,
        }
    }

    fn registrations(&self) -> String {
        if !self.lobby.session().is_signed_in() {
            return "Not signed in".to_string();
        }
        let names: Vec<String> = self
            .lobby
            .registered()
            .iter()
            .map(|id| match self.lobby.catalogue().get(*id) {
                Some(t) => format!("#{} {}", t.id, t.game),
                None => format!("#{id}"),
            })
            .collect();
        if names.is_empty() {
            "No registrations yet".to_string()
        } else {
            names.join("\n")
        }
    }

    fn top_up(&mut self, amount: &str) -> String {
        let Some(uid) = self.lobby.session().uid().map(str::to_string) else {
            return "Sign in or sign up first".to_string();
        };
        match TopUpRequest::parse(amount) {
            Ok(request) => {
                self.lobby.close_modal();
                format!(
                    "Pay {:.2} {} to {} ({}) using any UPI app:\n{}\n\
                     Your wallet is credited once the payment is verified.",
                    request.amount().round_dp(2),
                    self.upi.currency,
                    self.upi.payee_vpa,
                    self.upi.payee_name,
                    request.upi_uri(&self.upi, &format!("Wallet top-up {uid}"))
                )
            }
            Err(e) => e.to_string(),
        }
    }
}
