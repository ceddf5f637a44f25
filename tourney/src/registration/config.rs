//! Registration engine configuration.

use std::{fmt, str::FromStr};

/// How the engine guards the multi-step registration sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsistencyMode {
    /// Read-then-write duplicate check, no refund on partial failure,
    /// read-then-write counter. Concurrent duplicates can double-debit and
    /// the counter can undercount.
    Relaxed,
    /// Duplicate guard via insert-if-absent, refund of the debit when the
    /// registration cannot be written, exact counter increments.
    #[default]
    Strict,
}

impl fmt::Display for ConsistencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyMode::Relaxed => write!(f, "relaxed"),
            ConsistencyMode::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for ConsistencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relaxed" => Ok(ConsistencyMode::Relaxed),
            "strict" => Ok(ConsistencyMode::Strict),
            other => Err(format!("unknown consistency mode '{other}'")),
        }
    }
}

/// Registration engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub consistency: ConsistencyMode,
}

impl EngineConfig {
    pub fn relaxed() -> Self {
        Self {
            consistency: ConsistencyMode::Relaxed,
        }
    }

    pub fn strict() -> Self {
        Self {
            consistency: ConsistencyMode::Strict,
        }
    }
}
