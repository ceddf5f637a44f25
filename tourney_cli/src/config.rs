//! Front-end configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::{path::PathBuf, time::Duration};
use tourney::db::parse_env_or;
use tourney::{ConsistencyMode, DatabaseConfig, EngineConfig, UpiConfig};

/// Default location of the saved session
pub const DEFAULT_SESSION_FILE: &str = ".tourney/session.json";

/// Complete configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Password hashing pepper (required)
    pub password_pepper: String,
    /// Registration consistency mode
    pub consistency: ConsistencyMode,
    /// Bound on optimistic retries of a conditional store update
    pub max_update_attempts: u32,
    /// Player count refresh interval
    pub player_count_refresh: Duration,
    /// Profile subscription polling interval
    pub profile_poll: Duration,
    /// Where the session is loaded from and saved to
    pub session_file: PathBuf,
    /// Optional JSON catalogue replacing the built-in one
    pub catalogue_path: Option<PathBuf>,
    /// Payee for wallet top-ups
    pub upi: UpiConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `session_file_override` - Optional session file override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        database_url_override: Option<String>,
        session_file_override: Option<PathBuf>,
    ) -> ConfigResult<Self> {
        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        let password_pepper =
            std::env::var("PASSWORD_PEPPER").map_err(|_| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let consistency = match std::env::var("TOURNEY_CONSISTENCY") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "TOURNEY_CONSISTENCY".to_string(),
                reason: format!("Expected 'strict' or 'relaxed', got '{raw}'"),
            })?,
            Err(_) => ConsistencyMode::default(),
        };

        let upi_defaults = UpiConfig::default();
        let upi = UpiConfig {
            payee_vpa: std::env::var("UPI_PAYEE_VPA").unwrap_or(upi_defaults.payee_vpa),
            payee_name: std::env::var("UPI_PAYEE_NAME").unwrap_or(upi_defaults.payee_name),
            currency: upi_defaults.currency,
        };

        let session_file = session_file_override
            .or_else(|| std::env::var("TOURNEY_SESSION_FILE").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));

        Ok(AppConfig {
            database,
            password_pepper,
            consistency,
            max_update_attempts: parse_env_or(
                "STORE_MAX_UPDATE_ATTEMPTS",
                tourney::store::DEFAULT_MAX_UPDATE_ATTEMPTS,
            ),
            player_count_refresh: Duration::from_secs(parse_env_or(
                "PLAYER_COUNT_REFRESH_SECS",
                30,
            )),
            profile_poll: Duration::from_millis(parse_env_or("PROFILE_POLL_MILLIS", 2_000)),
            session_file,
            catalogue_path: std::env::var("TOURNEY_CATALOGUE").ok().map(PathBuf::from),
            upi,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> ConfigResult<()> {
        if self.password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if self.max_update_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "STORE_MAX_UPDATE_ATTEMPTS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.player_count_refresh.is_zero() {
            return Err(ConfigError::Invalid {
                var: "PLAYER_COUNT_REFRESH_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.profile_poll < Duration::from_millis(100) {
            return Err(ConfigError::Invalid {
                var: "PROFILE_POLL_MILLIS".to_string(),
                reason: "Must be at least 100".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if !self.upi.payee_vpa.contains('@') {
            return Err(ConfigError::Invalid {
                var: "UPI_PAYEE_VPA".to_string(),
                reason: "Must look like name@bank".to_string(),
            });
        }

        Ok(())
    }

    /// Engine settings derived from this configuration
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            consistency: self.consistency,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
