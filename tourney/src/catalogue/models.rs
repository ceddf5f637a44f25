//! Tournament data models.

use crate::wallet::Money;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Tournament ID type
pub type TournamentId = i64;

/// A scheduled tournament, fixed at deployment time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    /// Unique positive identifier
    pub id: TournamentId,
    /// Game title
    pub game: String,
    /// Player capacity
    pub players: u32,
    /// Prize amount
    pub prize: i64,
    /// Entry fee debited from the wallet on registration, in whole units
    pub entry_fee: i64,
    /// Match date
    pub date: NaiveDate,
    /// Match start time
    pub time: NaiveTime,
    /// Map label
    pub map: String,
}

impl Tournament {
    /// Whether a wallet balance covers the entry fee
    pub fn affordable_with(&self, wallet: Money) -> bool {
        wallet >= self.fee()
    }

    /// Entry fee as a wallet amount
    pub fn fee(&self) -> Money {
        Money::from(self.entry_fee)
    }

    /// Free seats given the current player count
    pub fn seats_left(&self, player_count: u64) -> u64 {
        u64::from(self.players).saturating_sub(player_count)
    }
}
