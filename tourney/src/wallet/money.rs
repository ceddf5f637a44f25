//! Exact wallet amounts.
//!
//! Balances are decimals so a credited `149.5` stays `149.5` through every
//! debit and refund. Stored records keep plain JSON numbers: whole amounts
//! are written as integers and fractional ones as floats.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Number, Value};
use std::str::FromStr;

/// Currency amount
pub type Money = Decimal;

/// Parse a textual amount such as `"149.5"` or `"1e3"`
pub fn parse_amount(text: &str) -> Option<Money> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Read a stored JSON number (or numeric string) exactly
pub fn from_json(value: &Value) -> Option<Money> {
    let amount = match value {
        Value::Number(n) => parse_amount(&n.to_string()),
        Value::String(s) => parse_amount(s),
        _ => None,
    };
    amount.map(|amount| amount.normalize())
}

/// Encode an amount as a JSON number
pub fn to_json(amount: Money) -> Value {
    let amount = amount.normalize();
    if amount.scale() == 0 {
        if let Some(whole) = amount.to_i64() {
            return Value::from(whole);
        }
    }
    match amount.to_f64().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(amount.to_string()),
    }
}

/// `#[serde(with = "...")]` adapter over [`to_json`] and [`from_json`]
pub mod json_number {
    use super::Money;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(amount: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        super::to_json(*amount).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Money::ZERO);
        }
        super::from_json(&value).ok_or_else(|| D::Error::custom(format!("invalid amount: {value}")))
    }
}
