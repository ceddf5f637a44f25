//! Identity and profile data models.

use crate::wallet::{Money, money};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User ID type, issued by the identity provider
pub type UserId = String;

/// Persisted user record at `users/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default, with = "money::json_number")]
    pub wallet: Money,
    #[serde(default)]
    pub points: i64,
    /// ISO-8601 creation timestamp
    pub created_at: String,
}

/// Profile handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub email: String,
    pub name: Option<String>,
    #[serde(with = "money::json_number")]
    pub wallet: Money,
    pub points: i64,
}

impl UserProfile {
    /// Build a profile from a stored user record
    pub fn from_record(uid: &str, record: UserRecord) -> Self {
        Self {
            uid: uid.to_string(),
            email: record.email,
            name: record.name,
            wallet: record.wallet.max(Money::ZERO),
            points: record.points.max(0),
        }
    }

    /// Decode a raw `users/{uid}` value; `None` if it is not a user record
    pub fn from_value(uid: &str, value: Value) -> Option<Self> {
        serde_json::from_value::<UserRecord>(value)
            .ok()
            .map(|record| Self::from_record(uid, record))
    }

    /// Name to show in the header
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Credential record at `accounts/{emailKey}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub uid: UserId,
    pub email: String,
    pub password_hash: String,
}

/// Account creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub mobile: Option<String>,
}

/// Sign-in request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_defaults_missing_balances() {
        let profile = UserProfile::from_value(
            "u1",
            json!({"email": "a@b.c", "createdAt": "2024-03-01T00:00:00Z"}),
        )
        .unwrap();
        assert_eq!(profile.wallet, Money::ZERO);
        assert_eq!(profile.points, 0);
        assert_eq!(profile.display_name(), "a@b.c");
    }

    #[test]
    fn test_from_value_keeps_fractional_wallet() {
        let profile = UserProfile::from_value(
            "u1",
            json!({"email": "a@b.c", "wallet": 149.5, "createdAt": "2024-03-01T00:00:00Z"}),
        )
        .unwrap();
        assert_eq!(profile.wallet, Money::new(1495, 1));

        let negative = UserProfile::from_value(
            "u1",
            json!({"email": "a@b.c", "wallet": -3.25, "createdAt": "2024-03-01T00:00:00Z"}),
        )
        .unwrap();
        assert_eq!(negative.wallet, Money::ZERO);
    }

    #[test]
    fn test_from_value_rejects_garbage() {
        assert!(UserProfile::from_value("u1", json!(42)).is_none());
    }

    #[test]
    fn test_record_shape() {
        let record = UserRecord {
            name: Some("Asha".to_string()),
            email: "asha@example.com".to_string(),
            mobile: Some("9999999999".to_string()),
            wallet: Money::ZERO,
            points: 0,
            created_at: "2024-03-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["createdAt"], "2024-03-01T00:00:00Z");
        assert!(value["wallet"].is_i64());
        assert_eq!(value["wallet"], 0);
        assert_eq!(value["mobile"], "9999999999");
    }
}
