//! Hierarchical keys used by the engine and the identity provider.

use crate::catalogue::TournamentId;
use sha2::{Digest, Sha256};

/// Root of all registration records.
pub const REGISTRATIONS_ROOT: &str = "registrations";

/// `users/{uid}`
pub fn user(uid: &str) -> String {
    format!("users/{uid}")
}

/// `registrations/{tournamentId}/{uid}`
pub fn registration(tournament_id: TournamentId, uid: &str) -> String {
    format!("{REGISTRATIONS_ROOT}/{tournament_id}/{uid}")
}

/// `tournamentStats/{tournamentId}`
pub fn tournament_stats(tournament_id: TournamentId) -> String {
    format!("tournamentStats/{tournament_id}")
}

/// `accounts/{emailKey}`
///
/// E-mail addresses contain characters that are not valid inside a path
/// segment, so the key is the hex SHA-256 of the lower-cased address.
pub fn account(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("accounts/{}", hex::encode(digest))
}

/// Split a path into its segments, rejecting empty segments.
pub fn segments(path: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        None
    } else {
        Some(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_paths() {
        assert_eq!(user("abc"), "users/abc");
        assert_eq!(registration(7, "abc"), "registrations/7/abc");
        assert_eq!(tournament_stats(7), "tournamentStats/7");
    }

    #[test]
    fn test_account_key_is_case_insensitive() {
        assert_eq!(account("Player@Example.com"), account("player@example.com "));
        assert_ne!(account("a@example.com"), account("b@example.com"));
        assert!(segments(&account("a@example.com")).is_some());
    }

    #[test]
    fn test_segments_rejects_empty() {
        assert_eq!(segments("a/b"), Some(vec!["a", "b"]));
        assert_eq!(segments("a//b"), None);
        assert_eq!(segments(""), None);
        assert_eq!(segments("/a"), None);
    }
}
