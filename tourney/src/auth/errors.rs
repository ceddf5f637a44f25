//! Authentication error types.

use crate::store::StoreError;
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An account already exists for the e-mail address
    #[error("Email already in use")]
    EmailInUse,

    /// No account for the e-mail address
    #[error("Account not found")]
    NotFound,

    /// Password verification failed
    #[error("Wrong password")]
    WrongPassword,

    /// Empty or malformed credentials, or a corrupt credential record
    #[error("Invalid credential")]
    InvalidCredential,

    /// Invalid e-mail format
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too weak
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Account exists but `users/{uid}` does not
    #[error("User profile missing")]
    ProfileMissing,
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            AuthError::EmailInUse => "An account with this email already exists".to_string(),
            AuthError::NotFound => "No account found with this email".to_string(),
            AuthError::WrongPassword => "Incorrect password".to_string(),
            AuthError::InvalidCredential => "Invalid email or password".to_string(),
            AuthError::InvalidEmail(_) => "Please enter a valid email address".to_string(),
            AuthError::WeakPassword(reason) => reason.clone(),
            AuthError::ProfileMissing => "User data not found".to_string(),
            AuthError::Store(_) | AuthError::HashingFailed => {
                "Login failed. Please check your credentials and try again.".to_string()
            }
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages() {
        assert_eq!(
            AuthError::EmailInUse.client_message(),
            "An account with this email already exists"
        );
        assert_eq!(AuthError::WrongPassword.client_message(), "Incorrect password");
        let store = AuthError::Store(StoreError::Unavailable("db down at 10.1.1.1".into()));
        assert!(!store.client_message().contains("10.1.1.1"));
    }
}
