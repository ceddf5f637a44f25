//! Registration error types.

use crate::auth::UserId;
use crate::catalogue::TournamentId;
use crate::store::StoreError;
use crate::wallet::Money;
use thiserror::Error;

/// Registration errors
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Bad input, rejected before any store access
    #[error("Validation error: {0}")]
    Validation(String),

    /// A registration already exists for this (tournament, user) pair
    #[error("Already registered for tournament {0}")]
    AlreadyRegistered(TournamentId),

    /// Wallet does not cover the entry fee
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Money, required: Money },

    /// No user record at `users/{uid}`
    #[error("User data not found for {0}")]
    UserNotFound(UserId),

    /// Transport or backend failure from any step
    #[error("Registration store failure: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl RegistrationError {
    /// Get a client-safe error message
    ///
    /// Store failures are reduced to a generic retry hint and user ids are
    /// not echoed back.
    pub fn client_message(&self) -> String {
        match self {
            RegistrationError::Validation(msg) => msg.clone(),
            RegistrationError::AlreadyRegistered(_) => {
                "You are already registered for this tournament".to_string()
            }
            RegistrationError::InsufficientBalance { .. } => {
                "Insufficient wallet balance".to_string()
            }
            RegistrationError::UserNotFound(_) => "User data not found".to_string(),
            RegistrationError::StoreUnavailable(_) => {
                "Failed to register for tournament, please try again".to_string()
            }
        }
    }

    /// Whether the caller should be sent to the wallet top-up flow
    pub fn requires_top_up(&self) -> bool {
        matches!(self, RegistrationError::InsufficientBalance { .. })
    }
}

/// Result type for registration operations
pub type RegistrationResult<T> = Result<T, RegistrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_store_details() {
        let err = RegistrationError::StoreUnavailable(StoreError::Unavailable(
            "connection reset by 10.0.0.4".to_string(),
        ));
        assert!(!err.client_message().contains("10.0.0.4"));
        assert!(err.to_string().contains("10.0.0.4"));
    }

    #[test]
    fn test_client_message_hides_uid() {
        let err = RegistrationError::UserNotFound("secret-uid".to_string());
        assert_eq!(err.client_message(), "User data not found");
    }

    #[test]
    fn test_requires_top_up_only_for_balance() {
        let insufficient = RegistrationError::InsufficientBalance {
            available: Money::from(50),
            required: Money::from(100),
        };
        assert!(insufficient.requires_top_up());
        assert_eq!(insufficient.client_message(), "Insufficient wallet balance");
        assert!(!RegistrationError::AlreadyRegistered(1).requires_top_up());
        assert!(!RegistrationError::Validation("x".to_string()).requires_top_up());
    }
}
