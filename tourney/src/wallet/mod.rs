//! Wallet top-up via a manual UPI payment.
//!
//! Funding is out-of-band: the player pays the configured UPI handle (usually
//! by scanning a QR code of the intent URI built here) and an administrator
//! credits the wallet afterwards. Nothing in this crate credits a wallet.

pub mod money;

pub use money::Money;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters left as-is in intent parameters: the URI unreserved set plus `@`
const UPI_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'@');

/// Top-up errors
#[derive(Debug, Error, PartialEq)]
pub enum TopUpError {
    #[error("Please enter a valid amount")]
    InvalidAmount(String),
}

pub type TopUpResult<T> = Result<T, TopUpError>;

/// Payee details for the UPI intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpiConfig {
    /// Virtual payment address, e.g. `tourney@upi`
    pub payee_vpa: String,
    pub payee_name: String,
    pub currency: String,
}

impl Default for UpiConfig {
    fn default() -> Self {
        Self {
            payee_vpa: "tourney@upi".to_string(),
            payee_name: "Tourney".to_string(),
            currency: "INR".to_string(),
        }
    }
}

/// A validated top-up amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopUpRequest {
    amount: Money,
}

impl TopUpRequest {
    /// Parse a user-entered amount; it must be a positive number
    pub fn parse(input: &str) -> TopUpResult<Self> {
        match money::parse_amount(input) {
            Some(amount) if amount > Money::ZERO => Ok(Self { amount }),
            _ => Err(TopUpError::InvalidAmount(input.to_string())),
        }
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    /// `upi://pay` intent for the QR code
    pub fn upi_uri(&self, config: &UpiConfig, note: &str) -> String {
        format!(
            "upi://pay?pa={}&pn={}&am={:.2}&cu={}&tn={}",
            utf8_percent_encode(&config.payee_vpa, UPI_PARAM),
            utf8_percent_encode(&config.payee_name, UPI_PARAM),
            self.amount.round_dp(2),
            utf8_percent_encode(&config.currency, UPI_PARAM),
            utf8_percent_encode(note, UPI_PARAM)
        )
    }
}
