//! Registration data models.

use crate::auth::UserId;
use crate::catalogue::{Tournament, TournamentId};
use serde::{Deserialize, Serialize};

/// Review status of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Pending => write!(f, "pending"),
            RegistrationStatus::Approved => write!(f, "approved"),
            RegistrationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Fields the player fills in to join a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    /// In-game player id
    pub game_uid: String,
    pub email: String,
    /// Payment transaction reference
    pub utr: String,
}

impl RegistrationForm {
    pub fn new(
        game_uid: impl Into<String>,
        email: impl Into<String>,
        utr: impl Into<String>,
    ) -> Self {
        Self {
            game_uid: game_uid.into(),
            email: email.into(),
            utr: utr.into(),
        }
    }

    /// Check that every field is filled and the email looks like one
    pub fn validate(&self) -> Result<(), String> {
        if self.game_uid.trim().is_empty()
            || self.email.trim().is_empty()
            || self.utr.trim().is_empty()
        {
            return Err("All fields are required".to_string());
        }
        if !self.email.contains('@') {
            return Err("Please enter a valid email address".to_string());
        }
        Ok(())
    }
}

/// Registration record at `registrations/{tournamentId}/{uid}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Account that registered
    pub uid: UserId,
    /// In-game player id from the form
    pub game_uid: String,
    pub email: String,
    pub utr: String,
    pub tournament_id: TournamentId,
    pub game_name: String,
    /// Server time in milliseconds since the epoch
    pub timestamp: i64,
    pub status: RegistrationStatus,
    /// Fee charged at registration time
    pub entry_fee: i64,
}

impl Registration {
    /// A fresh pending registration
    pub fn pending(uid: &str, tournament: &Tournament, form: RegistrationForm, timestamp: i64) -> Self {
        Self {
            uid: uid.to_string(),
            game_uid: form.game_uid.trim().to_string(),
            email: form.email.trim().to_string(),
            utr: form.utr.trim().to_string(),
            tournament_id: tournament.id,
            game_name: tournament.game.clone(),
            timestamp,
            status: RegistrationStatus::Pending,
            entry_fee: tournament.entry_fee,
        }
    }
}

/// Per-tournament aggregate at `tournamentStats/{tournamentId}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentStats {
    #[serde(default)]
    pub player_count: u64,
    #[serde(default)]
    pub last_updated: i64,
}

impl TournamentStats {
    /// Stats after one more registration
    pub fn incremented(self, now: i64) -> Self {
        Self {
            player_count: self.player_count + 1,
            last_updated: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Catalogue;

    #[test]
    fn test_form_requires_all_fields() {
        let form = RegistrationForm::new("  ", "a@b.c", "utr1");
        assert_eq!(form.validate().unwrap_err(), "All fields are required");
        let form = RegistrationForm::new("p1", "a@b.c", "");
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_form_requires_at_sign() {
        let form = RegistrationForm::new("p1", "not-an-email", "utr1");
        assert_eq!(form.validate().unwrap_err(), "Please enter a valid email address");
        assert!(RegistrationForm::new("p1", "a@b.c", "utr1").validate().is_ok());
    }

    #[test]
    fn test_registration_record_shape() {
        let catalogue = Catalogue::builtin();
        let tournament = catalogue.get(1).unwrap();
        let reg = Registration::pending(
            "uid-1",
            tournament,
            RegistrationForm::new(" 5123 ", "a@b.c", "UTR9"),
            1_700_000_000_000,
        );
        let value = serde_json::to_value(&reg).unwrap();
        assert_eq!(value["uid"], "uid-1");
        assert_eq!(value["gameUid"], "5123");
        assert_eq!(value["tournamentId"], 1);
        assert_eq!(value["gameName"], "BGMI");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["entryFee"], 100);
        assert_eq!(value["timestamp"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_stats_decoding_tolerates_missing_fields() {
        let stats: TournamentStats = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(stats, TournamentStats::default());
        let stats = stats.incremented(5);
        assert_eq!(stats.player_count, 1);
        assert_eq!(stats.last_updated, 5);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(RegistrationStatus::Rejected.to_string(), "rejected");
        let s: RegistrationStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(s, RegistrationStatus::Approved);
    }
}
